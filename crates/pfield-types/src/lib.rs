// ─────────────────────────────────────────────────────────────────────
// PField — Types
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Shared data model for the pfield workspace.
//!
//! Everything the GUI writes to disk lands here first: the global
//! simulation parameters, the electrode shapes and the particle records.
//! Solvers and tracers in `pfield-core` consume these types read-only.

pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod species;
pub mod state;
