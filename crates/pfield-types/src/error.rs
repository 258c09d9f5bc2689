// ─────────────────────────────────────────────────────────────────────
// PField — Error
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PfieldError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Non-finite potential at cell ({i}, {j}, {k}) during iteration {iteration}")]
    NonFiniteCell {
        iteration: usize,
        i: usize,
        j: usize,
        k: usize,
    },

    #[error("Non-finite state for particle {particle} at step {step}")]
    NonFiniteParticle { particle: usize, step: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NPY error: {0}")]
    Npy(String),
}

impl PfieldError {
    /// True for the numerical failures (as opposed to bad input or IO).
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            PfieldError::NonFiniteCell { .. } | PfieldError::NonFiniteParticle { .. }
        )
    }
}

pub type PfieldResult<T> = Result<T, PfieldError>;
