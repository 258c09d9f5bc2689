// ─────────────────────────────────────────────────────────────────────
// PField — Relaxation
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Relaxation sweeps for the 3-D Laplace equation on a masked grid.
//!
//! The 7-point stencil on cell centres is
//!   wx (V[i-1] + V[i+1]) + wy (V[j-1] + V[j+1]) + wz (V[k-1] + V[k+1])
//!     - 2 (wx + wy + wz) V = 0,   w_a = 1 / d_a²
//! which for cubic cells reduces to "V is the mean of its 6 neighbours".
//! Neighbours outside the domain are Dirichlet ghosts held at 0 V.
//! Cells flagged in `fixed` are never written.
//!
//! Every sweep returns the max |ΔV| over the cells it updated.

use ndarray::{Array2, Array3, Axis};
use pfield_types::state::Grid3D;
use rayon::prelude::*;

/// Potential of the ghost layer just outside the domain faces.
pub const GHOST_POTENTIAL: f64 = 0.0;

/// Precomputed stencil weights for one grid.
#[derive(Debug, Clone, Copy)]
pub struct Stencil {
    pub wx: f64,
    pub wy: f64,
    pub wz: f64,
    inv_diag: f64,
}

impl Stencil {
    pub fn new(grid: &Grid3D) -> Self {
        let wx = 1.0 / (grid.dx * grid.dx);
        let wy = 1.0 / (grid.dy * grid.dy);
        let wz = 1.0 / (grid.dz * grid.dz);
        Stencil {
            wx,
            wy,
            wz,
            inv_diag: 1.0 / (2.0 * (wx + wy + wz)),
        }
    }

    /// Weighted neighbour sum Σ w_a (V⁻ + V⁺) with ghost cells outside.
    #[inline(always)]
    fn neighbour_sum(&self, v: &Array3<f64>, i: usize, j: usize, k: usize) -> f64 {
        let (nx, ny, nz) = v.dim();
        let at = |ii: Option<usize>, jj: Option<usize>, kk: Option<usize>| match (ii, jj, kk) {
            (Some(a), Some(b), Some(c)) if a < nx && b < ny && c < nz => v[[a, b, c]],
            _ => GHOST_POTENTIAL,
        };
        let sx = at(i.checked_sub(1), Some(j), Some(k)) + at(Some(i + 1), Some(j), Some(k));
        let sy = at(Some(i), j.checked_sub(1), Some(k)) + at(Some(i), Some(j + 1), Some(k));
        let sz = at(Some(i), Some(j), k.checked_sub(1)) + at(Some(i), Some(j), Some(k + 1));
        self.wx * sx + self.wy * sy + self.wz * sz
    }

    /// Gauss-Seidel target value for cell (i, j, k).
    #[inline(always)]
    pub fn target(&self, v: &Array3<f64>, i: usize, j: usize, k: usize) -> f64 {
        self.neighbour_sum(v, i, j, k) * self.inv_diag
    }

    /// Discrete Laplacian at cell (i, j, k).
    #[inline(always)]
    pub fn laplacian(&self, v: &Array3<f64>, i: usize, j: usize, k: usize) -> f64 {
        self.neighbour_sum(v, i, j, k) - v[[i, j, k]] / self.inv_diag
    }
}

/// One lexicographic Gauss-Seidel / SOR sweep, i outermost and k innermost.
///
/// `omega`: relaxation factor (1.0 = Gauss-Seidel, 1 < ω < 2 = over-relaxation)
pub fn gauss_seidel_sweep(
    potential: &mut Array3<f64>,
    fixed: &Array3<bool>,
    grid: &Grid3D,
    omega: f64,
) -> f64 {
    let stencil = Stencil::new(grid);
    let (nx, ny, nz) = potential.dim();
    let mut max_change: f64 = 0.0;

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                if fixed[[i, j, k]] {
                    continue;
                }
                let old = potential[[i, j, k]];
                let p_star = stencil.target(potential, i, j, k);
                let new = (1.0 - omega) * old + omega * p_star;
                potential[[i, j, k]] = new;
                max_change = max_change.max((new - old).abs());
            }
        }
    }
    max_change
}

/// One Jacobi sweep. Every update reads the previous iterate, so the
/// result is independent of traversal order. `scratch` must match
/// `potential` in shape; it holds the previous iterate on return.
pub fn jacobi_sweep(
    potential: &mut Array3<f64>,
    scratch: &mut Array3<f64>,
    fixed: &Array3<bool>,
    grid: &Grid3D,
) -> f64 {
    let stencil = Stencil::new(grid);
    let (nx, ny, nz) = potential.dim();
    let mut max_change: f64 = 0.0;

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let old = potential[[i, j, k]];
                if fixed[[i, j, k]] {
                    scratch[[i, j, k]] = old;
                    continue;
                }
                let new = stencil.target(potential, i, j, k);
                scratch[[i, j, k]] = new;
                max_change = max_change.max((new - old).abs());
            }
        }
    }
    std::mem::swap(potential, scratch);
    max_change
}

/// One red-black (checkerboard) SOR sweep: all cells with (i+j+k) even,
/// then all odd cells. Cells of one colour only read the other colour, so
/// each half-sweep is evaluated plane-parallel with Rayon and gives the
/// same result as a sequential red-black sweep.
pub fn red_black_sweep(
    potential: &mut Array3<f64>,
    fixed: &Array3<bool>,
    grid: &Grid3D,
    omega: f64,
) -> f64 {
    let stencil = Stencil::new(grid);
    let red = red_black_half(potential, fixed, &stencil, omega, 0);
    let black = red_black_half(potential, fixed, &stencil, omega, 1);
    red.max(black)
}

fn red_black_half(
    potential: &mut Array3<f64>,
    fixed: &Array3<bool>,
    stencil: &Stencil,
    omega: f64,
    colour: usize,
) -> f64 {
    let (nx, ny, nz) = potential.dim();
    let snapshot: &Array3<f64> = potential;

    let planes: Vec<(f64, Array2<f64>)> = (0..nx)
        .into_par_iter()
        .map(|i| {
            let mut plane = snapshot.index_axis(Axis(0), i).to_owned();
            let mut max_change: f64 = 0.0;
            for j in 0..ny {
                for k in 0..nz {
                    if (i + j + k) % 2 != colour || fixed[[i, j, k]] {
                        continue;
                    }
                    let old = plane[[j, k]];
                    let p_star = stencil.target(snapshot, i, j, k);
                    let new = (1.0 - omega) * old + omega * p_star;
                    plane[[j, k]] = new;
                    max_change = max_change.max((new - old).abs());
                }
            }
            (max_change, plane)
        })
        .collect();

    let mut max_change: f64 = 0.0;
    for (i, (change, plane)) in planes.into_iter().enumerate() {
        potential.index_axis_mut(Axis(0), i).assign(&plane);
        max_change = max_change.max(change);
    }
    max_change
}

/// Max |discrete Laplacian| over free cells.
pub fn laplace_residual(potential: &Array3<f64>, fixed: &Array3<bool>, grid: &Grid3D) -> f64 {
    let stencil = Stencil::new(grid);
    let (nx, ny, nz) = potential.dim();
    let mut max_res: f64 = 0.0;

    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                if fixed[[i, j, k]] {
                    continue;
                }
                max_res = max_res.max(stencil.laplacian(potential, i, j, k).abs());
            }
        }
    }
    max_res
}

/// First cell (row-major order) holding NaN or ±∞.
pub fn find_non_finite(field: &Array3<f64>) -> Option<(usize, usize, usize)> {
    field
        .indexed_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(idx, _)| idx)
}
