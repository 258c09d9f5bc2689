// ─────────────────────────────────────────────────────────────────────
// PField — Config
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{CM, EV_TO_J, KEV_TO_J, MM};
use crate::error::{PfieldError, PfieldResult};
use crate::geometry::Electrode;
use crate::species::ParticleRecord;
use crate::state::Grid3D;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global simulation parameters.
/// Maps 1:1 to the `config.json` written by the GUI, plus optional solver
/// and tracer settings that fall back to defaults when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub nx: i64,
    pub ny: i64,
    pub nz: i64,
    #[serde(rename = "Lx")]
    pub lx: f64,
    #[serde(rename = "Ly")]
    pub ly: f64,
    #[serde(rename = "Lz")]
    pub lz: f64,
    /// Background magnetic field (T). Missing components are zero.
    #[serde(rename = "Bx", default)]
    pub bx: f64,
    #[serde(rename = "By", default)]
    pub by: f64,
    #[serde(rename = "Bz", default)]
    pub bz: f64,
    #[serde(default)]
    pub method: RelaxationMethod,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Convergence threshold on the max per-sweep change (V).
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Over-relaxation factor, used by `sor` and `red-black`.
    #[serde(default = "default_omega")]
    pub omega: f64,
    /// Tracer time step (s).
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub units: Units,
}

fn default_max_iter() -> usize {
    1000
}
fn default_tolerance() -> f64 {
    1e-4
}
fn default_omega() -> f64 {
    1.8
}
fn default_dt() -> f64 {
    1e-11
}
fn default_max_steps() -> usize {
    10_000
}

/// Relaxation scheme for the Laplace solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelaxationMethod {
    Jacobi,
    #[default]
    GaussSeidel,
    Sor,
    RedBlack,
}

/// Unit conventions of the numbers stored in the JSON files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Units {
    #[serde(default)]
    pub length: LengthUnit,
    #[serde(default)]
    pub energy: EnergyUnit,
}

impl Units {
    /// SI units throughout; what the core works in.
    pub const SI: Units = Units {
        length: LengthUnit::Metre,
        energy: EnergyUnit::Joule,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "m")]
    Metre,
    #[default]
    #[serde(rename = "cm")]
    Centimetre,
    #[serde(rename = "mm")]
    Millimetre,
}

impl LengthUnit {
    pub fn to_metres(self) -> f64 {
        match self {
            LengthUnit::Metre => 1.0,
            LengthUnit::Centimetre => CM,
            LengthUnit::Millimetre => MM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "J")]
    Joule,
    #[serde(rename = "eV")]
    ElectronVolt,
    #[default]
    #[serde(rename = "keV")]
    KiloElectronVolt,
}

impl EnergyUnit {
    pub fn to_joules(self) -> f64 {
        match self {
            EnergyUnit::Joule => 1.0,
            EnergyUnit::ElectronVolt => EV_TO_J,
            EnergyUnit::KiloElectronVolt => KEV_TO_J,
        }
    }
}

/// Contents of one `ElectrodeConfig_<n>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeConfigFile {
    #[serde(default)]
    pub electrodes: Vec<Electrode>,
}

/// Contents of one `ParticleConfig_<n>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfigFile {
    #[serde(rename = "particle", default)]
    pub particles: Vec<ParticleRecord>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> PfieldResult<T> {
    let contents = std::fs::read_to_string(path)?;
    let parsed: T = serde_json::from_str(&contents)?;
    Ok(parsed)
}

impl ElectrodeConfigFile {
    pub fn from_file(path: impl AsRef<Path>) -> PfieldResult<Self> {
        read_json(path.as_ref())
    }
}

impl ParticleConfigFile {
    pub fn from_file(path: impl AsRef<Path>) -> PfieldResult<Self> {
        read_json(path.as_ref())
    }
}

impl SimulationConfig {
    /// Config with the given resolution and SI extents, all optional
    /// fields at their defaults and no magnetic field.
    pub fn new(resolution: [usize; 3], extents_m: [f64; 3]) -> Self {
        SimulationConfig {
            nx: resolution[0] as i64,
            ny: resolution[1] as i64,
            nz: resolution[2] as i64,
            lx: extents_m[0],
            ly: extents_m[1],
            lz: extents_m[2],
            bx: 0.0,
            by: 0.0,
            bz: 0.0,
            method: RelaxationMethod::default(),
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
            omega: default_omega(),
            dt: default_dt(),
            max_steps: default_max_steps(),
            units: Units::SI,
        }
    }

    /// Load from a JSON file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> PfieldResult<Self> {
        let config: Self = read_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no solve can start from.
    pub fn validate(&self) -> PfieldResult<()> {
        for (name, n) in [("nx", self.nx), ("ny", self.ny), ("nz", self.nz)] {
            if n <= 0 {
                return Err(PfieldError::ConfigError(format!(
                    "{name} must be > 0, got {n}"
                )));
            }
        }
        let array_bytes = usize::try_from(self.nx)
            .ok()
            .zip(usize::try_from(self.ny).ok())
            .zip(usize::try_from(self.nz).ok())
            .and_then(|((nx, ny), nz)| nx.checked_mul(ny)?.checked_mul(nz))
            .and_then(|n| n.checked_mul(std::mem::size_of::<f64>()))
            .filter(|&bytes| bytes <= isize::MAX as usize);
        if array_bytes.is_none() {
            return Err(PfieldError::ConfigError(format!(
                "resolution {}x{}x{} overflows the cell count",
                self.nx, self.ny, self.nz
            )));
        }
        for (name, l) in [("Lx", self.lx), ("Ly", self.ly), ("Lz", self.lz)] {
            if !l.is_finite() || l <= 0.0 {
                return Err(PfieldError::ConfigError(format!(
                    "{name} must be finite and > 0, got {l}"
                )));
            }
        }
        for (name, b) in [("Bx", self.bx), ("By", self.by), ("Bz", self.bz)] {
            if !b.is_finite() {
                return Err(PfieldError::ConfigError(format!(
                    "{name} must be finite, got {b}"
                )));
            }
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PfieldError::ConfigError(format!(
                "tolerance must be finite and > 0, got {}",
                self.tolerance
            )));
        }
        if matches!(
            self.method,
            RelaxationMethod::Sor | RelaxationMethod::RedBlack
        ) && !(self.omega.is_finite() && self.omega > 0.0 && self.omega < 2.0)
        {
            return Err(PfieldError::ConfigError(format!(
                "omega must lie in (0, 2), got {}",
                self.omega
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(PfieldError::ConfigError(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        Ok(())
    }

    /// Cell counts as unsigned sizes.
    pub fn resolution(&self) -> PfieldResult<[usize; 3]> {
        self.validate()?;
        Ok([self.nx as usize, self.ny as usize, self.nz as usize])
    }

    /// Domain extents in metres.
    pub fn extents_m(&self) -> [f64; 3] {
        let s = self.units.length.to_metres();
        [self.lx * s, self.ly * s, self.lz * s]
    }

    /// Background magnetic field in tesla.
    pub fn b_field_t(&self) -> [f64; 3] {
        [self.bx, self.by, self.bz]
    }

    /// Create the cell grid for this config's resolution and extents.
    pub fn create_grid(&self) -> PfieldResult<Grid3D> {
        let [nx, ny, nz] = self.resolution()?;
        let [lx, ly, lz] = self.extents_m();
        Ok(Grid3D::new(nx, ny, nz, lx, ly, lz))
    }
}
