//! Numerical kernels for PField: Laplace relaxation sweeps and
//! grid interpolation.

pub mod interp;
pub mod relax;
