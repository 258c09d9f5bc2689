// ─────────────────────────────────────────────────────────────────────
// PField — State
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
use ndarray::Array1;

/// 3D cell-centred computational grid with precomputed coordinates.
/// Cell (i, j, k) spans [i dx, (i+1) dx] × … and is sampled at its centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3D {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub x: Array1<f64>, // cell-centre x coordinates [nx]
    pub y: Array1<f64>, // cell-centre y coordinates [ny]
    pub z: Array1<f64>, // cell-centre z coordinates [nz]
}

impl Grid3D {
    pub fn new(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Self {
        let dx = lx / nx.max(1) as f64;
        let dy = ly / ny.max(1) as f64;
        let dz = lz / nz.max(1) as f64;
        let x = Array1::from_shape_fn(nx, |i| (i as f64 + 0.5) * dx);
        let y = Array1::from_shape_fn(ny, |j| (j as f64 + 0.5) * dy);
        let z = Array1::from_shape_fn(nz, |k| (k as f64 + 0.5) * dz);
        Grid3D {
            nx,
            ny,
            nz,
            lx,
            ly,
            lz,
            dx,
            dy,
            dz,
            x,
            y,
            z,
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    pub fn cell_count(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn spacing(&self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }

    pub fn extents(&self) -> [f64; 3] {
        [self.lx, self.ly, self.lz]
    }

    pub fn cell_centre(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        [self.x[i], self.y[j], self.z[k]]
    }

    /// Inside the closed box [0, Lx] × [0, Ly] × [0, Lz].
    pub fn contains_point(&self, p: [f64; 3]) -> bool {
        p.iter()
            .zip(self.extents())
            .all(|(&c, l)| c.is_finite() && (0.0..=l).contains(&c))
    }

    /// Cell holding `p`; points on the far faces belong to the last cell.
    pub fn cell_of(&self, p: [f64; 3]) -> Option<(usize, usize, usize)> {
        if !self.contains_point(p) {
            return None;
        }
        let idx = |c: f64, d: f64, n: usize| ((c / d).floor() as usize).min(n - 1);
        Some((
            idx(p[0], self.dx, self.nx),
            idx(p[1], self.dy, self.ny),
            idx(p[2], self.dz, self.nz),
        ))
    }
}

/// Non-fatal conditions raised by the field solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverWarning {
    /// Iteration cap reached with the last sweep still above tolerance.
    NonConvergence {
        iterations: usize,
        max_change: f64,
        tolerance: f64,
    },
}

/// Field solve result.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub converged: bool,
    pub cancelled: bool,
    pub iterations: usize,
    /// Max |ΔV| over free cells in the last sweep.
    pub max_change: f64,
    /// Max |discrete Laplacian| over free cells after the last sweep.
    pub residual: f64,
    pub free_cells: usize,
    pub fixed_cells: usize,
    pub warnings: Vec<SolverWarning>,
    pub solve_time_ms: f64,
}
