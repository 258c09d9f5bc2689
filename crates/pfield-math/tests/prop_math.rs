// ─────────────────────────────────────────────────────────────────────
// PField — Property-Based Tests (proptest) for pfield-math
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for pfield-math using proptest.
//!
//! Covers: relaxation sweeps (fixed-cell invariance, maximum principle,
//! red-black vs sequential agreement), trilinear interpolation bounds,
//! gradient of linear fields.

use ndarray::Array3;
use pfield_math::interp::{gradient_3d, trilinear};
use pfield_math::relax::{gauss_seidel_sweep, laplace_residual, red_black_sweep};
use pfield_types::state::Grid3D;
use proptest::prelude::*;

fn seeded_mask(n: usize, seed: u64) -> (Array3<f64>, Array3<bool>) {
    let mut potential = Array3::zeros((n, n, n));
    let mut fixed = Array3::from_elem((n, n, n), false);
    let mut state = seed | 1;
    for (f, v) in fixed.iter_mut().zip(potential.iter_mut()) {
        // xorshift: deterministic sprinkle of electrode cells
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        if state % 7 == 0 {
            *f = true;
            *v = ((state >> 8) % 201) as f64 - 100.0;
        }
    }
    (potential, fixed)
}

// ── Relaxation Properties ────────────────────────────────────────────

proptest! {
    /// Fixed cells keep their value through any number of sweeps.
    #[test]
    fn fixed_cells_invariant(n in 3usize..10, seed in any::<u64>(), omega in 0.5f64..1.95) {
        let grid = Grid3D::new(n, n, n, 1.0, 1.0, 1.0);
        let (mut v, fixed) = seeded_mask(n, seed);
        let before = v.clone();
        for _ in 0..10 {
            gauss_seidel_sweep(&mut v, &fixed, &grid, omega);
            red_black_sweep(&mut v, &fixed, &grid, omega);
        }
        for ((a, b), &f) in v.iter().zip(before.iter()).zip(fixed.iter()) {
            if f {
                prop_assert_eq!(a, b);
            }
        }
    }

    /// Gauss-Seidel (ω = 1) never leaves the range spanned by the fixed
    /// values and the 0 V ghost layer.
    #[test]
    fn gauss_seidel_maximum_principle(n in 3usize..10, seed in any::<u64>()) {
        let grid = Grid3D::new(n, n, n, 1.0, 1.0, 1.0);
        let (mut v, fixed) = seeded_mask(n, seed);
        let hi = v.iter().cloned().fold(0.0f64, f64::max);
        let lo = v.iter().cloned().fold(0.0f64, f64::min);
        for _ in 0..30 {
            gauss_seidel_sweep(&mut v, &fixed, &grid, 1.0);
        }
        for &x in v.iter() {
            prop_assert!(x <= hi + 1e-9 && x >= lo - 1e-9, "{} outside [{}, {}]", x, lo, hi);
        }
    }

    /// Red-black and lexicographic Gauss-Seidel converge to the same field.
    #[test]
    fn red_black_agrees_with_sequential(n in 3usize..8, seed in any::<u64>()) {
        let grid = Grid3D::new(n, n, n, 1.0, 1.0, 1.0);
        let (init, fixed) = seeded_mask(n, seed);
        let mut a = init.clone();
        let mut b = init;
        for _ in 0..400 {
            gauss_seidel_sweep(&mut a, &fixed, &grid, 1.0);
            red_black_sweep(&mut b, &fixed, &grid, 1.0);
        }
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!((x - y).abs() < 1e-6, "{} vs {}", x, y);
        }
        prop_assert!(laplace_residual(&a, &fixed, &grid) < 1e-5);
    }
}

// ── Interpolation Properties ─────────────────────────────────────────

proptest! {
    /// Interpolated values stay within the min/max of the sampled field.
    #[test]
    fn trilinear_bounded_by_samples(
        n in 2usize..8,
        px in -0.5f64..1.5,
        py in -0.5f64..1.5,
        pz in -0.5f64..1.5,
        seed in any::<u64>(),
    ) {
        let grid = Grid3D::new(n, n, n, 1.0, 1.0, 1.0);
        let (field, _) = seeded_mask(n, seed);
        let lo = field.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = field.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let v = trilinear(&field, &grid, [px, py, pz]);
        prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
    }

    /// The gradient of a linear field is its coefficient vector everywhere.
    #[test]
    fn gradient_of_linear_field_is_constant(
        a in -10.0f64..10.0,
        b in -10.0f64..10.0,
        c in -10.0f64..10.0,
        n in 2usize..8,
    ) {
        let grid = Grid3D::new(n, n + 1, n + 2, 0.3, 0.5, 0.7);
        let f = Array3::from_shape_fn(grid.shape(), |(i, j, k)| {
            a * grid.x[i] + b * grid.y[j] + c * grid.z[k]
        });
        let (gx, gy, gz) = gradient_3d(&f, &grid);
        for ((x, y), z) in gx.iter().zip(gy.iter()).zip(gz.iter()) {
            prop_assert!((x - a).abs() < 1e-8);
            prop_assert!((y - b).abs() < 1e-8);
            prop_assert!((z - c).abs() < 1e-8);
        }
    }
}
