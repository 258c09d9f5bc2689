//! Electrode field solve and charged-particle tracing.
//!
//! Pipeline: case files -> grid builder -> Laplace solve -> Boris tracer.

pub mod boundary;
pub mod cancel;
pub mod ensemble;
pub mod intake;
pub mod io;
pub mod particles;
pub mod simulation;
pub mod solver;
