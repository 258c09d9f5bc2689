// ─────────────────────────────────────────────────────────────────────
// PField — Interpolation
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Trilinear interpolation and finite-difference gradients on Grid3D.
//!
//! Samples live on cell centres, so the interpolation domain is the box
//! spanned by the first and last centres. Points closer to a face than
//! half a cell are clamped onto that box.

use ndarray::{Array3, Axis, Zip};
use pfield_types::state::Grid3D;

/// Lower/upper sample index and fractional offset along one axis.
#[inline]
fn axis_weight(c: f64, d: f64, n: usize) -> (usize, usize, f64) {
    if n < 2 {
        return (0, 0, 0.0);
    }
    let f = c / d - 0.5;
    let i0 = (f.floor() as isize).clamp(0, n as isize - 2) as usize;
    let t = (f - i0 as f64).clamp(0.0, 1.0);
    (i0, i0 + 1, t)
}

/// Corner indices and weights for one query point, reusable across
/// several fields sampled at the same position.
#[derive(Debug, Clone, Copy)]
pub struct TrilinearStencil {
    lo: [usize; 3],
    hi: [usize; 3],
    t: [f64; 3],
}

impl TrilinearStencil {
    pub fn new(grid: &Grid3D, p: [f64; 3]) -> Self {
        let (i0, i1, tx) = axis_weight(p[0], grid.dx, grid.nx);
        let (j0, j1, ty) = axis_weight(p[1], grid.dy, grid.ny);
        let (k0, k1, tz) = axis_weight(p[2], grid.dz, grid.nz);
        TrilinearStencil {
            lo: [i0, j0, k0],
            hi: [i1, j1, k1],
            t: [tx, ty, tz],
        }
    }

    #[inline]
    pub fn sample(&self, field: &Array3<f64>) -> f64 {
        let [i0, j0, k0] = self.lo;
        let [i1, j1, k1] = self.hi;
        let [tx, ty, tz] = self.t;

        let c00 = (1.0 - tz) * field[[i0, j0, k0]] + tz * field[[i0, j0, k1]];
        let c01 = (1.0 - tz) * field[[i0, j1, k0]] + tz * field[[i0, j1, k1]];
        let c10 = (1.0 - tz) * field[[i1, j0, k0]] + tz * field[[i1, j0, k1]];
        let c11 = (1.0 - tz) * field[[i1, j1, k0]] + tz * field[[i1, j1, k1]];

        let c0 = (1.0 - ty) * c00 + ty * c01;
        let c1 = (1.0 - ty) * c10 + ty * c11;

        (1.0 - tx) * c0 + tx * c1
    }
}

/// Trilinear interpolation of `field` at `p` (metres), clamped to the grid.
pub fn trilinear(field: &Array3<f64>, grid: &Grid3D, p: [f64; 3]) -> f64 {
    TrilinearStencil::new(grid, p).sample(field)
}

/// Interpolate three component fields at the same point.
pub fn trilinear_vec3(
    fx: &Array3<f64>,
    fy: &Array3<f64>,
    fz: &Array3<f64>,
    grid: &Grid3D,
    p: [f64; 3],
) -> [f64; 3] {
    let st = TrilinearStencil::new(grid, p);
    [st.sample(fx), st.sample(fy), st.sample(fz)]
}

/// d(field)/d(axis) with central differences in the interior and
/// one-sided differences on the first and last planes. An axis with a
/// single cell has zero derivative.
pub fn derivative_along(field: &Array3<f64>, axis: usize, d: f64) -> Array3<f64> {
    let mut out = Array3::zeros(field.dim());
    let n = field.len_of(Axis(axis));
    if n < 2 {
        return out;
    }

    Zip::from(field.lanes(Axis(axis)))
        .and(out.lanes_mut(Axis(axis)))
        .for_each(|src, mut dst| {
            dst[0] = (src[1] - src[0]) / d;
            dst[n - 1] = (src[n - 1] - src[n - 2]) / d;
            for m in 1..n - 1 {
                dst[m] = (src[m + 1] - src[m - 1]) / (2.0 * d);
            }
        });
    out
}

/// Gradient of a cell-centred field: (∂f/∂x, ∂f/∂y, ∂f/∂z).
pub fn gradient_3d(field: &Array3<f64>, grid: &Grid3D) -> (Array3<f64>, Array3<f64>, Array3<f64>) {
    (
        derivative_along(field, 0, grid.dx),
        derivative_along(field, 1, grid.dy),
        derivative_along(field, 2, grid.dz),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_field(grid: &Grid3D, a: f64, b: f64, c: f64) -> Array3<f64> {
        Array3::from_shape_fn(grid.shape(), |(i, j, k)| {
            a * grid.x[i] + b * grid.y[j] + c * grid.z[k]
        })
    }

    #[test]
    fn test_trilinear_exact_on_centres() {
        let grid = Grid3D::new(5, 4, 3, 1.0, 1.0, 1.0);
        let f = Array3::from_shape_fn(grid.shape(), |(i, j, k)| (i * 100 + j * 10 + k) as f64);
        for i in 0..5 {
            for j in 0..4 {
                for k in 0..3 {
                    let v = trilinear(&f, &grid, grid.cell_centre(i, j, k));
                    assert!((v - f[[i, j, k]]).abs() < 1e-9, "({i},{j},{k}): {v}");
                }
            }
        }
    }

    #[test]
    fn test_trilinear_reproduces_linear_field() {
        let grid = Grid3D::new(8, 8, 8, 2.0, 1.0, 0.5);
        let f = linear_field(&grid, 3.0, -2.0, 5.0);
        let p = [0.77, 0.41, 0.23];
        let expected = 3.0 * p[0] - 2.0 * p[1] + 5.0 * p[2];
        assert!((trilinear(&f, &grid, p) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_trilinear_clamps_outside() {
        let grid = Grid3D::new(4, 4, 4, 1.0, 1.0, 1.0);
        let f = linear_field(&grid, 1.0, 0.0, 0.0);
        // Below the first centre and far outside: clamped to the edge samples.
        assert!((trilinear(&f, &grid, [0.0, 0.5, 0.5]) - grid.x[0]).abs() < 1e-12);
        assert!((trilinear(&f, &grid, [50.0, 0.5, 0.5]) - grid.x[3]).abs() < 1e-12);
    }

    #[test]
    fn test_trilinear_single_cell_axis() {
        let grid = Grid3D::new(4, 1, 4, 1.0, 1.0, 1.0);
        let f = Array3::from_elem(grid.shape(), 2.5);
        assert_eq!(trilinear(&f, &grid, [0.3, 0.9, 0.3]), 2.5);
    }

    #[test]
    fn test_vec3_matches_scalar_calls() {
        let grid = Grid3D::new(6, 6, 6, 1.0, 1.0, 1.0);
        let fx = linear_field(&grid, 1.0, 2.0, 3.0);
        let fy = linear_field(&grid, -1.0, 0.5, 0.0);
        let fz = linear_field(&grid, 0.0, 0.0, 7.0);
        let p = [0.31, 0.62, 0.18];
        let v = trilinear_vec3(&fx, &fy, &fz, &grid, p);
        assert_eq!(v[0], trilinear(&fx, &grid, p));
        assert_eq!(v[1], trilinear(&fy, &grid, p));
        assert_eq!(v[2], trilinear(&fz, &grid, p));
    }

    #[test]
    fn test_gradient_of_linear_field() {
        let grid = Grid3D::new(6, 5, 4, 1.0, 2.0, 3.0);
        let f = linear_field(&grid, 2.0, -3.0, 0.5);
        let (gx, gy, gz) = gradient_3d(&f, &grid);
        // Exact everywhere, boundaries included.
        for v in gx.iter() {
            assert!((v - 2.0).abs() < 1e-9);
        }
        for v in gy.iter() {
            assert!((v + 3.0).abs() < 1e-9);
        }
        for v in gz.iter() {
            assert!((v - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_gradient_of_quadratic_interior() {
        let grid = Grid3D::new(20, 3, 3, 1.0, 1.0, 1.0);
        let f = Array3::from_shape_fn(grid.shape(), |(i, _, _)| grid.x[i] * grid.x[i]);
        let (gx, _, _) = gradient_3d(&f, &grid);
        for i in 1..19 {
            let expected = 2.0 * grid.x[i];
            assert!(
                (gx[[i, 1, 1]] - expected).abs() < 1e-10,
                "i={i}: {} vs {expected}",
                gx[[i, 1, 1]]
            );
        }
    }

    #[test]
    fn test_gradient_single_cell_axis_is_zero() {
        let grid = Grid3D::new(1, 4, 4, 1.0, 1.0, 1.0);
        let f = linear_field(&grid, 10.0, 1.0, 1.0);
        let (gx, gy, _) = gradient_3d(&f, &grid);
        assert!(gx.iter().all(|&v| v == 0.0));
        assert!((gy[[0, 2, 2]] - 1.0).abs() < 1e-9);
    }
}
