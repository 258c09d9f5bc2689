// ─────────────────────────────────────────────────────────────────────
// PField — Ensemble Tracing
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Parallel tracing of independent particles through one solved field.

use crate::boundary::FieldGrid;
use crate::cancel::CancelToken;
use crate::particles::{trace_with, Particle, TraceStatus, Trajectory};
use pfield_types::error::PfieldResult;
use rayon::prelude::*;

/// Trace every particle on the Rayon pool. The field is shared read-only;
/// output order matches input order. The first numerical failure aborts
/// the batch.
pub fn trace_all(
    particles: &[Particle],
    field: &FieldGrid,
    dt: f64,
    max_steps: usize,
    cancel: &CancelToken,
) -> PfieldResult<Vec<Trajectory>> {
    particles
        .par_iter()
        .map(|&p| trace_with(p, field, dt, max_steps, cancel.clone()))
        .collect()
}

/// Count of trajectories per termination status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub exited: usize,
    pub absorbed: usize,
    pub truncated: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.exited + self.absorbed + self.truncated + self.cancelled
    }
}

pub fn status_counts(trajectories: &[Trajectory]) -> StatusCounts {
    trajectories
        .iter()
        .fold(StatusCounts::default(), |mut acc, t| {
            match t.status {
                TraceStatus::Exited => acc.exited += 1,
                TraceStatus::Absorbed => acc.absorbed += 1,
                TraceStatus::Truncated => acc.truncated += 1,
                TraceStatus::Cancelled => acc.cancelled += 1,
            }
            acc
        })
}
