// ─────────────────────────────────────────────────────────────────────
// PField — Field Solver
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Laplace relaxation driver and E-field evaluation.
//!
//! Free cells are relaxed until the largest per-sweep change drops below
//! the tolerance or the iteration cap is reached. Hitting the cap is not
//! an error: the report carries a `NonConvergence` warning instead.
//! Afterwards E = -∇V is evaluated on the whole grid.

use crate::boundary::FieldGrid;
use crate::cancel::CancelToken;
use pfield_math::interp::gradient_3d;
use pfield_math::relax::{
    find_non_finite, gauss_seidel_sweep, jacobi_sweep, laplace_residual, red_black_sweep,
};
use pfield_types::config::{RelaxationMethod, SimulationConfig};
use pfield_types::error::{PfieldError, PfieldResult};
use pfield_types::state::{SolveReport, SolverWarning};
use std::time::Instant;

/// Relaxation scheme with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SolverMethod {
    Jacobi,
    #[default]
    GaussSeidel,
    Sor { omega: f64 },
    RedBlack { omega: f64 },
}

impl SolverMethod {
    pub fn from_config(config: &SimulationConfig) -> Self {
        match config.method {
            RelaxationMethod::Jacobi => SolverMethod::Jacobi,
            RelaxationMethod::GaussSeidel => SolverMethod::GaussSeidel,
            RelaxationMethod::Sor => SolverMethod::Sor {
                omega: config.omega,
            },
            RelaxationMethod::RedBlack => SolverMethod::RedBlack {
                omega: config.omega,
            },
        }
    }

    fn validate(&self) -> PfieldResult<()> {
        if let SolverMethod::Sor { omega } | SolverMethod::RedBlack { omega } = *self {
            if !omega.is_finite() || omega <= 0.0 || omega >= 2.0 {
                return Err(PfieldError::ConfigError(format!(
                    "omega must lie in (0, 2), got {omega}"
                )));
            }
        }
        Ok(())
    }
}

/// Iteration controls for one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub method: SolverMethod,
    /// Stop once max |ΔV| of a sweep falls below this (V).
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl SolveOptions {
    pub fn from_config(config: &SimulationConfig) -> Self {
        SolveOptions {
            method: SolverMethod::from_config(config),
            tolerance: config.tolerance,
            max_iterations: config.max_iter,
        }
    }
}

/// Gauss-Seidel solve with the given tolerance and iteration cap.
pub fn solve(
    field: &mut FieldGrid,
    tolerance: f64,
    max_iterations: usize,
) -> PfieldResult<SolveReport> {
    let options = SolveOptions {
        method: SolverMethod::GaussSeidel,
        tolerance,
        max_iterations,
    };
    solve_with(field, &options, &CancelToken::new())
}

/// Relax the free-cell potentials in place, then refresh E.
///
/// A cancelled solve stops between sweeps and still evaluates E on the
/// partial potential; the report says `cancelled`.
pub fn solve_with(
    field: &mut FieldGrid,
    options: &SolveOptions,
    cancel: &CancelToken,
) -> PfieldResult<SolveReport> {
    let start = Instant::now();
    options.method.validate()?;
    if !options.tolerance.is_finite() || options.tolerance <= 0.0 {
        return Err(PfieldError::ConfigError(format!(
            "tolerance must be finite and > 0, got {}",
            options.tolerance
        )));
    }

    let FieldGrid {
        grid,
        potential,
        fixed,
        ..
    } = field;

    let mut scratch = match options.method {
        SolverMethod::Jacobi => Some(potential.clone()),
        _ => None,
    };

    let mut iterations = 0;
    let mut max_change = f64::INFINITY;
    let mut converged = false;
    let mut cancelled = false;

    while iterations < options.max_iterations {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        max_change = match (options.method, scratch.as_mut()) {
            (SolverMethod::Jacobi, Some(buf)) => jacobi_sweep(potential, buf, fixed, grid),
            (SolverMethod::Sor { omega }, _) => gauss_seidel_sweep(potential, fixed, grid, omega),
            (SolverMethod::RedBlack { omega }, _) => red_black_sweep(potential, fixed, grid, omega),
            _ => gauss_seidel_sweep(potential, fixed, grid, 1.0),
        };
        iterations += 1;

        if let Some((i, j, k)) = find_non_finite(potential) {
            return Err(PfieldError::NonFiniteCell {
                iteration: iterations,
                i,
                j,
                k,
            });
        }

        if max_change < options.tolerance {
            converged = true;
            break;
        }
    }

    let residual = laplace_residual(potential, fixed, grid);

    let mut warnings = Vec::new();
    if !converged && !cancelled {
        warnings.push(SolverWarning::NonConvergence {
            iterations,
            max_change,
            tolerance: options.tolerance,
        });
    }

    compute_electric_field(field);

    Ok(SolveReport {
        converged,
        cancelled,
        iterations,
        max_change,
        residual,
        free_cells: field.free_cells(),
        fixed_cells: field.fixed_cells(),
        warnings,
        solve_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

/// E = -∇V: centred differences inside, one-sided on the faces.
pub fn compute_electric_field(field: &mut FieldGrid) {
    let (gx, gy, gz) = gradient_3d(&field.potential, &field.grid);
    field.ex = gx.mapv(|v| -v);
    field.ey = gy.mapv(|v| -v);
    field.ez = gz.mapv(|v| -v);
}
