// ─────────────────────────────────────────────────────────────────────
// PField — Species
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{CARBON_MASS_MH, M_E, M_H, OXYGEN_MASS_MH, Q_E};
use crate::error::{PfieldError, PfieldResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Particle species with a fixed mass and charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Proton,
    Electron,
    C1,
    C2,
    C3,
    C4,
    C5,
    C6,
    O1,
    O2,
    O3,
    O4,
    O5,
    O6,
    O7,
    O8,
}

impl Species {
    pub const ALL: [Species; 16] = [
        Species::Proton,
        Species::Electron,
        Species::C1,
        Species::C2,
        Species::C3,
        Species::C4,
        Species::C5,
        Species::C6,
        Species::O1,
        Species::O2,
        Species::O3,
        Species::O4,
        Species::O5,
        Species::O6,
        Species::O7,
        Species::O8,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Species::Proton => "Proton",
            Species::Electron => "Electron",
            Species::C1 => "C1",
            Species::C2 => "C2",
            Species::C3 => "C3",
            Species::C4 => "C4",
            Species::C5 => "C5",
            Species::C6 => "C6",
            Species::O1 => "O1",
            Species::O2 => "O2",
            Species::O3 => "O3",
            Species::O4 => "O4",
            Species::O5 => "O5",
            Species::O6 => "O6",
            Species::O7 => "O7",
            Species::O8 => "O8",
        }
    }

    /// (mass in mH, charge in qe).
    pub fn mass_charge(self) -> (f64, f64) {
        match self {
            Species::Proton => (1.0, 1.0),
            Species::Electron => (M_E / M_H, -1.0),
            Species::C1 => (CARBON_MASS_MH, 1.0),
            Species::C2 => (CARBON_MASS_MH, 2.0),
            Species::C3 => (CARBON_MASS_MH, 3.0),
            Species::C4 => (CARBON_MASS_MH, 4.0),
            Species::C5 => (CARBON_MASS_MH, 5.0),
            Species::C6 => (CARBON_MASS_MH, 6.0),
            Species::O1 => (OXYGEN_MASS_MH, 1.0),
            Species::O2 => (OXYGEN_MASS_MH, 2.0),
            Species::O3 => (OXYGEN_MASS_MH, 3.0),
            Species::O4 => (OXYGEN_MASS_MH, 4.0),
            Species::O5 => (OXYGEN_MASS_MH, 5.0),
            Species::O6 => (OXYGEN_MASS_MH, 6.0),
            Species::O7 => (OXYGEN_MASS_MH, 7.0),
            Species::O8 => (OXYGEN_MASS_MH, 8.0),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = PfieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::ALL
            .iter()
            .copied()
            .find(|sp| sp.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PfieldError::ConfigError(format!("unknown particle type '{s}'")))
    }
}

/// Tag used by the GUI for user-defined mass and charge.
pub const CUSTOM_TYPE: &str = "Custom";

/// Resolved particle identity: a table species or an explicit mass/charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleKind {
    Standard(Species),
    Custom { mass_mh: f64, charge_qe: f64 },
}

impl ParticleKind {
    pub fn mass_mh(&self) -> f64 {
        match *self {
            ParticleKind::Standard(sp) => sp.mass_charge().0,
            ParticleKind::Custom { mass_mh, .. } => mass_mh,
        }
    }

    pub fn charge_qe(&self) -> f64 {
        match *self {
            ParticleKind::Standard(sp) => sp.mass_charge().1,
            ParticleKind::Custom { charge_qe, .. } => charge_qe,
        }
    }

    pub fn mass_kg(&self) -> f64 {
        self.mass_mh() * M_H
    }

    pub fn charge_c(&self) -> f64 {
        self.charge_qe() * Q_E
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParticleKind::Standard(sp) => sp.name(),
            ParticleKind::Custom { .. } => CUSTOM_TYPE,
        }
    }
}

/// One entry of a `ParticleConfig_<n>.json` file, in file units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    #[serde(rename = "type")]
    pub type_name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Kinetic energy.
    #[serde(rename = "Energy")]
    pub energy: f64,
    /// Direction cosines of the initial velocity.
    #[serde(rename = "x̂", alias = "ux")]
    pub ux: f64,
    #[serde(rename = "ŷ", alias = "uy")]
    pub uy: f64,
    #[serde(rename = "ẑ", alias = "uz")]
    pub uz: f64,
    #[serde(
        rename = "mass(in mH)",
        alias = "mass",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mass_mh: Option<f64>,
    #[serde(
        rename = "charge (in qe)",
        alias = "charge",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub charge_qe: Option<f64>,
}

impl ParticleRecord {
    /// Record for a table species.
    pub fn standard(species: Species, position: [f64; 3], energy: f64, dir: [f64; 3]) -> Self {
        ParticleRecord {
            type_name: species.name().to_string(),
            x: position[0],
            y: position[1],
            z: position[2],
            energy,
            ux: dir[0],
            uy: dir[1],
            uz: dir[2],
            mass_mh: None,
            charge_qe: None,
        }
    }

    /// Record with explicit mass (mH) and charge (qe).
    pub fn custom(
        mass_mh: f64,
        charge_qe: f64,
        position: [f64; 3],
        energy: f64,
        dir: [f64; 3],
    ) -> Self {
        ParticleRecord {
            type_name: CUSTOM_TYPE.to_string(),
            mass_mh: Some(mass_mh),
            charge_qe: Some(charge_qe),
            ..Self::standard(Species::Proton, position, energy, dir)
        }
    }

    /// Resolve the `type` tag against the species table.
    pub fn kind(&self) -> PfieldResult<ParticleKind> {
        if self.type_name.trim().eq_ignore_ascii_case(CUSTOM_TYPE) {
            let mass_mh = self.mass_mh.ok_or_else(|| {
                PfieldError::ConfigError("Custom particle requires 'mass(in mH)'".to_string())
            })?;
            let charge_qe = self.charge_qe.ok_or_else(|| {
                PfieldError::ConfigError("Custom particle requires 'charge (in qe)'".to_string())
            })?;
            if !mass_mh.is_finite() || mass_mh <= 0.0 {
                return Err(PfieldError::ConfigError(format!(
                    "Custom particle mass must be finite and > 0, got {mass_mh}"
                )));
            }
            if !charge_qe.is_finite() {
                return Err(PfieldError::ConfigError(format!(
                    "Custom particle charge must be finite, got {charge_qe}"
                )));
            }
            return Ok(ParticleKind::Custom { mass_mh, charge_qe });
        }
        Ok(ParticleKind::Standard(self.type_name.parse()?))
    }
}
