// ─────────────────────────────────────────────────────────────────────
// PField — Simulation
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! One case from configuration to trajectories.
//!
//! Owns the field grid and the particle list. `run` builds nothing new:
//! the grid is rasterized in the constructor, `solve_field` relaxes it
//! once, and `trace_particles` fans the particles out over Rayon against
//! the now read-only field.

use crate::boundary::{build_grid, FieldGrid};
use crate::cancel::CancelToken;
use crate::ensemble::{status_counts, trace_all, StatusCounts};
use crate::io::{
    load_case, write_field_npz, write_geometry_txt, write_trajectory_txt, Case, FIELD_FILE,
    GEOMETRY_FILE,
};
use crate::particles::{Particle, Trajectory};
use crate::solver::{solve_with, SolveOptions};
use pfield_types::config::SimulationConfig;
use pfield_types::error::{PfieldError, PfieldResult};
use pfield_types::geometry::Electrode;
use pfield_types::species::ParticleRecord;
use pfield_types::state::SolveReport;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub solve: SolveReport,
    pub particles: usize,
    pub counts: StatusCounts,
    /// Boris steps summed over all trajectories.
    pub total_steps: usize,
    pub trace_time_ms: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.solve;
        writeln!(
            f,
            "field: {} after {} iterations (max change {:.3e} V, residual {:.3e}), {} free / {} fixed cells, {:.1} ms",
            if s.converged {
                "converged"
            } else if s.cancelled {
                "cancelled"
            } else {
                "NOT converged"
            },
            s.iterations,
            s.max_change,
            s.residual,
            s.free_cells,
            s.fixed_cells,
            s.solve_time_ms,
        )?;
        write!(
            f,
            "particles: {} traced, {} steps, exited {}, absorbed {}, truncated {}, cancelled {}, {:.1} ms",
            self.particles,
            self.total_steps,
            self.counts.exited,
            self.counts.absorbed,
            self.counts.truncated,
            self.counts.cancelled,
            self.trace_time_ms,
        )
    }
}

pub struct Simulation {
    config: SimulationConfig,
    electrodes: Vec<Electrode>,
    particles: Vec<Particle>,
    field: FieldGrid,
    report: Option<SolveReport>,
    cancel: CancelToken,
}

impl Simulation {
    /// Validate the inputs, rasterize the electrodes and convert the
    /// particle entries to SI. Electrodes and particles are in the
    /// config's units.
    pub fn new(
        config: SimulationConfig,
        electrodes: Vec<Electrode>,
        records: &[ParticleRecord],
    ) -> PfieldResult<Self> {
        let field = build_grid(&config, &electrodes)?;
        let particles = records
            .iter()
            .enumerate()
            .map(|(id, rec)| Particle::from_record(id, rec, config.units))
            .collect::<PfieldResult<Vec<_>>>()?;
        Ok(Simulation {
            config,
            electrodes,
            particles,
            field,
            report: None,
            cancel: CancelToken::new(),
        })
    }

    pub fn from_case(case: Case) -> PfieldResult<Self> {
        Self::new(case.config, case.electrodes, &case.particles)
    }

    /// Load a case directory (`config.json` + numbered electrode and
    /// particle files).
    pub fn from_dir(dir: impl AsRef<Path>) -> PfieldResult<Self> {
        Self::from_case(load_case(dir)?)
    }

    /// Handle that stops the solve and all traces when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Relax the potential with the config's method and limits.
    pub fn solve_field(&mut self) -> PfieldResult<SolveReport> {
        let options = SolveOptions::from_config(&self.config);
        let report = solve_with(&mut self.field, &options, &self.cancel)?;
        self.report = Some(report.clone());
        Ok(report)
    }

    /// Trace every particle through the solved field.
    pub fn trace_particles(&self) -> PfieldResult<Vec<Trajectory>> {
        if self.report.is_none() {
            return Err(PfieldError::ConfigError(
                "field must be solved before tracing particles".to_string(),
            ));
        }
        trace_all(
            &self.particles,
            &self.field,
            self.config.dt,
            self.config.max_steps,
            &self.cancel,
        )
    }

    /// Solve, then trace.
    pub fn run(&mut self) -> PfieldResult<(RunSummary, Vec<Trajectory>)> {
        let solve = self.solve_field()?;
        let start = Instant::now();
        let trajectories = self.trace_particles()?;
        let summary = RunSummary {
            solve,
            particles: trajectories.len(),
            counts: status_counts(&trajectories),
            total_steps: trajectories.iter().map(Trajectory::steps).sum(),
            trace_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        Ok((summary, trajectories))
    }

    /// Write `geometry.txt`, `field.npz` and one track file per
    /// trajectory into `dir`, creating it if needed.
    pub fn write_outputs(
        &self,
        dir: impl AsRef<Path>,
        trajectories: &[Trajectory],
    ) -> PfieldResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let geometry = dir.join(GEOMETRY_FILE);
        write_geometry_txt(&geometry, &self.field)?;
        let field = dir.join(FIELD_FILE);
        write_field_npz(&field, &self.field)?;

        let mut written = vec![geometry, field];
        for t in trajectories {
            written.push(write_trajectory_txt(dir, t)?);
        }
        Ok(written)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn electrodes(&self) -> &[Electrode] {
        &self.electrodes
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn field(&self) -> &FieldGrid {
        &self.field
    }

    /// Report of the last solve, if any.
    pub fn report(&self) -> Option<&SolveReport> {
        self.report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::TraceStatus;
    use pfield_types::config::Units;
    use pfield_types::species::Species;

    fn si_config(n: usize) -> SimulationConfig {
        let mut cfg = SimulationConfig::new([n, n, n], [0.1, 0.1, 0.1]);
        cfg.dt = 1e-9;
        cfg.max_steps = 200;
        cfg
    }

    #[test]
    fn test_trace_requires_solve() {
        let sim = Simulation::new(si_config(6), Vec::new(), &[]).unwrap();
        assert!(sim.report().is_none());
        assert!(matches!(
            sim.trace_particles(),
            Err(PfieldError::ConfigError(_))
        ));
    }

    #[test]
    fn test_bad_particle_fails_construction() {
        let mut rec = ParticleRecord::standard(Species::Proton, [0.05; 3], 1.0, [1.0, 0.0, 0.0]);
        rec.type_name = "Neutron".to_string();
        assert!(Simulation::new(si_config(6), Vec::new(), &[rec]).is_err());
    }

    #[test]
    fn test_run_counts_statuses() {
        let mut cfg = si_config(10);
        cfg.units = Units::SI;
        let electrodes = vec![Electrode::Sphere {
            potential: 0.0,
            cx: 0.08,
            cy: 0.05,
            cz: 0.05,
            radius: 0.015,
        }];
        let at_rest = ParticleRecord::standard(Species::Proton, [0.02, 0.05, 0.05], 0.0, [0.0; 3]);
        let outside = ParticleRecord::standard(Species::Proton, [0.2, 0.05, 0.05], 0.0, [0.0; 3]);
        let inside = ParticleRecord::standard(Species::Proton, [0.08, 0.05, 0.05], 0.0, [0.0; 3]);
        let mut sim = Simulation::new(cfg, electrodes, &[at_rest, outside, inside]).unwrap();

        let (summary, trajectories) = sim.run().unwrap();
        assert!(summary.solve.converged);
        assert_eq!(summary.particles, 3);
        assert_eq!(trajectories[0].status, TraceStatus::Truncated);
        assert_eq!(trajectories[1].status, TraceStatus::Exited);
        assert_eq!(trajectories[2].status, TraceStatus::Absorbed);
        assert_eq!(summary.total_steps, 200);
        assert!(summary.to_string().contains("exited 1"));
    }

    #[test]
    fn test_cancelled_run_reports_cancelled() {
        let rec = ParticleRecord::standard(Species::Proton, [0.05; 3], 0.0, [0.0; 3]);
        let mut sim = Simulation::new(si_config(6), Vec::new(), &[rec]).unwrap();
        sim.cancel_token().cancel();
        let (summary, trajectories) = sim.run().unwrap();
        assert!(summary.solve.cancelled);
        assert_eq!(trajectories[0].status, TraceStatus::Cancelled);
        assert_eq!(trajectories[0].samples.len(), 1);
    }
}
