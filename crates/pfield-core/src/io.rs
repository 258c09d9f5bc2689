// ─────────────────────────────────────────────────────────────────────
// PField — Case I/O
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Case-directory loading and output writers.
//!
//! A case directory holds `config.json` plus any number of
//! `ElectrodeConfig_<n>.json` and `ParticleConfig_<n>.json` files. Files
//! are read in ascending `<n>`, which fixes the declaration order used
//! for overlapping electrodes.

use crate::boundary::FieldGrid;
use crate::particles::Trajectory;
use ndarray_npy::NpzWriter;
use pfield_types::config::{ElectrodeConfigFile, ParticleConfigFile, SimulationConfig};
use pfield_types::error::{PfieldError, PfieldResult};
use pfield_types::geometry::Electrode;
use pfield_types::species::ParticleRecord;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const ELECTRODE_PREFIX: &str = "ElectrodeConfig_";
pub const PARTICLE_PREFIX: &str = "ParticleConfig_";
pub const GEOMETRY_FILE: &str = "geometry.txt";
pub const FIELD_FILE: &str = "field.npz";

/// Everything a run needs, in file units.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub config: SimulationConfig,
    /// Electrodes in declaration order.
    pub electrodes: Vec<Electrode>,
    pub particles: Vec<ParticleRecord>,
}

/// `<prefix><n>.json` files in `dir`, sorted by `n`. A suffix that is
/// not an integer counts as 0, like the GUI's own index scan.
pub fn indexed_files(dir: &Path, prefix: &str) -> PfieldResult<Vec<(u64, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(suffix) = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };
        files.push((suffix.parse().unwrap_or(0), path));
    }
    files.sort();
    Ok(files)
}

/// Index the GUI would give the next `<prefix><n>.json`: max + 1, or 1.
pub fn next_index(dir: &Path, prefix: &str) -> PfieldResult<u64> {
    let max = indexed_files(dir, prefix)?
        .iter()
        .map(|(n, _)| *n)
        .max()
        .unwrap_or(0);
    Ok(max + 1)
}

pub fn load_case(dir: impl AsRef<Path>) -> PfieldResult<Case> {
    let dir = dir.as_ref();
    let config = SimulationConfig::from_file(dir.join(CONFIG_FILE))?;

    let mut electrodes = Vec::new();
    for (_, path) in indexed_files(dir, ELECTRODE_PREFIX)? {
        let file = ElectrodeConfigFile::from_file(&path).map_err(|e| with_path(&path, e))?;
        electrodes.extend(file.electrodes);
    }

    let mut particles = Vec::new();
    for (_, path) in indexed_files(dir, PARTICLE_PREFIX)? {
        let file = ParticleConfigFile::from_file(&path).map_err(|e| with_path(&path, e))?;
        particles.extend(file.particles);
    }

    Ok(Case {
        config,
        electrodes,
        particles,
    })
}

fn with_path(path: &Path, err: PfieldError) -> PfieldError {
    match err {
        PfieldError::Json(e) => PfieldError::ConfigError(format!("{}: {e}", path.display())),
        other => other,
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> PfieldResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn write_config(dir: impl AsRef<Path>, config: &SimulationConfig) -> PfieldResult<PathBuf> {
    let path = dir.as_ref().join(CONFIG_FILE);
    write_json(&path, config)?;
    Ok(path)
}

/// Write `electrode` as a new `ElectrodeConfig_<next>.json`.
pub fn write_electrode_config(dir: impl AsRef<Path>, electrode: &Electrode) -> PfieldResult<PathBuf> {
    let dir = dir.as_ref();
    let path = dir.join(format!("{ELECTRODE_PREFIX}{}.json", next_index(dir, ELECTRODE_PREFIX)?));
    let file = ElectrodeConfigFile {
        electrodes: vec![electrode.clone()],
    };
    write_json(&path, &file)?;
    Ok(path)
}

/// Write `record` as a new `ParticleConfig_<next>.json`.
pub fn write_particle_config(dir: impl AsRef<Path>, record: &ParticleRecord) -> PfieldResult<PathBuf> {
    let dir = dir.as_ref();
    let path = dir.join(format!("{PARTICLE_PREFIX}{}.json", next_index(dir, PARTICLE_PREFIX)?));
    let file = ParticleConfigFile {
        particles: vec![record.clone()],
    };
    write_json(&path, &file)?;
    Ok(path)
}

/// One value per line in row-major (i, j, k) order: the electrode
/// potential for fixed cells, 0 for free cells.
pub fn write_geometry_txt(path: impl AsRef<Path>, field: &FieldGrid) -> PfieldResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (&v, &fixed) in field.potential.iter().zip(field.fixed.iter()) {
        writeln!(out, "{}", if fixed { v } else { 0.0 })?;
    }
    out.flush()?;
    Ok(())
}

/// Potential, fixed mask and E components as arrays in one `.npz`.
pub fn write_field_npz(path: impl AsRef<Path>, field: &FieldGrid) -> PfieldResult<()> {
    let npy = |e: ndarray_npy::WriteNpzError| PfieldError::Npy(e.to_string());
    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array("potential", &field.potential).map_err(npy)?;
    npz.add_array("fixed", &field.fixed.mapv(u8::from)).map_err(npy)?;
    npz.add_array("ex", &field.ex).map_err(npy)?;
    npz.add_array("ey", &field.ey).map_err(npy)?;
    npz.add_array("ez", &field.ez).map_err(npy)?;
    npz.finish().map_err(npy)?;
    Ok(())
}

pub fn trajectory_file_name(particle_id: usize) -> String {
    format!("particle_track_{particle_id}.txt")
}

/// Write `particle_track_<id>.txt` into `dir`: one sample per line,
/// columns `t x y z vx vy vz` in SI units.
pub fn write_trajectory_txt(dir: impl AsRef<Path>, trajectory: &Trajectory) -> PfieldResult<PathBuf> {
    let path = dir.as_ref().join(trajectory_file_name(trajectory.particle_id));
    let mut out = BufWriter::new(File::create(&path)?);
    for s in &trajectory.samples {
        let [x, y, z] = s.position;
        let [vx, vy, vz] = s.velocity;
        writeln!(out, "{:e} {x:e} {y:e} {z:e} {vx:e} {vy:e} {vz:e}", s.t)?;
    }
    out.flush()?;
    Ok(path)
}
