// ─────────────────────────────────────────────────────────────────────
// PField — Boundary Conditions
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Grid builder: rasterizes electrodes onto the cell grid.
//!
//! Every cell centre is tested against every electrode in declaration
//! order. The last electrode containing the centre owns the cell, fixes
//! its potential and removes it from the relaxation.

use ndarray::Array3;
use pfield_math::interp::TrilinearStencil;
use pfield_types::config::SimulationConfig;
use pfield_types::error::{PfieldError, PfieldResult};
use pfield_types::geometry::Electrode;
use pfield_types::state::Grid3D;

/// Solver state: potential, boundary mask and derived E field on a
/// cell-centred grid, plus the uniform background B.
#[derive(Debug, Clone)]
pub struct FieldGrid {
    pub grid: Grid3D,
    /// Potential (V) per cell.
    pub potential: Array3<f64>,
    /// True for cells held at an electrode potential.
    pub fixed: Array3<bool>,
    /// Index of the electrode that fixed each cell.
    pub owner: Array3<Option<usize>>,
    /// E = -∇V (V/m). Zero until the field is solved.
    pub ex: Array3<f64>,
    pub ey: Array3<f64>,
    pub ez: Array3<f64>,
    /// Uniform magnetic field (T).
    pub b_field: [f64; 3],
}

impl FieldGrid {
    pub fn shape(&self) -> (usize, usize, usize) {
        self.grid.shape()
    }

    pub fn fixed_cells(&self) -> usize {
        self.fixed.iter().filter(|&&f| f).count()
    }

    pub fn free_cells(&self) -> usize {
        self.grid.cell_count() - self.fixed_cells()
    }

    /// Inside the closed domain box.
    pub fn contains(&self, p: [f64; 3]) -> bool {
        self.grid.contains_point(p)
    }

    /// True if `p` lies in the domain and in an electrode cell.
    pub fn is_fixed_at(&self, p: [f64; 3]) -> bool {
        self.grid
            .cell_of(p)
            .map(|(i, j, k)| self.fixed[[i, j, k]])
            .unwrap_or(false)
    }

    /// Trilinearly interpolated E at `p`, clamped at the faces.
    pub fn e_field_at(&self, p: [f64; 3]) -> [f64; 3] {
        let st = TrilinearStencil::new(&self.grid, p);
        [st.sample(&self.ex), st.sample(&self.ey), st.sample(&self.ez)]
    }

    /// Interpolated potential at `p`.
    pub fn potential_at(&self, p: [f64; 3]) -> f64 {
        TrilinearStencil::new(&self.grid, p).sample(&self.potential)
    }
}

/// Build the grid from a config and electrodes given in the config's
/// length unit.
///
/// Fails with `ConfigError` on a bad resolution or extent, an invalid
/// electrode, or when the electrodes leave no free cell.
pub fn build_grid(config: &SimulationConfig, electrodes: &[Electrode]) -> PfieldResult<FieldGrid> {
    config.validate()?;
    let grid = config.create_grid()?;
    let scale = config.units.length.to_metres();

    let electrodes_m = electrodes
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            e.validate(&format!("electrode[{idx}] ({})", e.kind_name()))?;
            Ok(e.scaled(scale))
        })
        .collect::<PfieldResult<Vec<_>>>()?;

    build_grid_si(grid, &electrodes_m, config.b_field_t())
}

/// Rasterize electrodes already expressed in metres onto `grid`.
pub fn build_grid_si(
    grid: Grid3D,
    electrodes: &[Electrode],
    b_field: [f64; 3],
) -> PfieldResult<FieldGrid> {
    let shape = grid.shape();

    let owner = Array3::from_shape_fn(shape, |(i, j, k)| {
        let [x, y, z] = grid.cell_centre(i, j, k);
        electrodes.iter().rposition(|e| e.contains(x, y, z))
    });
    let fixed = owner.mapv(|o| o.is_some());
    let potential = owner.mapv(|o| o.map(|idx| electrodes[idx].potential()).unwrap_or(0.0));

    if fixed.iter().all(|&f| f) {
        return Err(PfieldError::ConfigError(format!(
            "electrodes cover all {} cells; no free cells remain",
            grid.cell_count()
        )));
    }

    Ok(FieldGrid {
        grid,
        potential,
        fixed,
        owner,
        ex: Array3::zeros(shape),
        ey: Array3::zeros(shape),
        ez: Array3::zeros(shape),
        b_field,
    })
}
