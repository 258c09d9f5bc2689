use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::Array3;
use pfield_math::interp::gradient_3d;
use pfield_math::relax::{gauss_seidel_sweep, jacobi_sweep, red_black_sweep};
use pfield_types::state::Grid3D;
use std::hint::black_box;

fn plate_pair(n: usize) -> (Array3<f64>, Array3<bool>) {
    let mut potential = Array3::zeros((n, n, n));
    let mut fixed = Array3::from_elem((n, n, n), false);
    for j in 0..n {
        for k in 0..n {
            fixed[[1, j, k]] = true;
            fixed[[n - 2, j, k]] = true;
            potential[[1, j, k]] = 100.0;
            potential[[n - 2, j, k]] = -100.0;
        }
    }
    (potential, fixed)
}

fn bench_sweeps_48(c: &mut Criterion) {
    let n = 48;
    let grid = Grid3D::new(n, n, n, 0.1, 0.1, 0.1);
    let (init, fixed) = plate_pair(n);

    let mut group = c.benchmark_group("sweep_48x48x48");

    let mut v = init.clone();
    let mut scratch = init.clone();
    group.bench_function("jacobi", |b| {
        b.iter(|| jacobi_sweep(&mut v, &mut scratch, &fixed, &grid))
    });

    let mut v = init.clone();
    group.bench_function("gauss_seidel", |b| {
        b.iter(|| gauss_seidel_sweep(&mut v, &fixed, &grid, 1.0))
    });

    let mut v = init.clone();
    group.bench_function("red_black_omega_1.8", |b| {
        b.iter(|| red_black_sweep(&mut v, &fixed, &grid, 1.8))
    });

    group.finish();
}

fn bench_sor_vs_red_black_convergence(c: &mut Criterion) {
    let n = 32;
    let grid = Grid3D::new(n, n, n, 0.1, 0.1, 0.1);
    let (init, fixed) = plate_pair(n);

    let mut group = c.benchmark_group("sor_vs_red_black_32_100iters");
    group.sample_size(10);

    group.bench_function("sor_sequential", |b| {
        b.iter(|| {
            let mut v = init.clone();
            for _ in 0..100 {
                gauss_seidel_sweep(&mut v, &fixed, &grid, 1.8);
            }
            black_box(v[[n / 2, n / 2, n / 2]]);
        })
    });

    group.bench_function("red_black_parallel", |b| {
        b.iter(|| {
            let mut v = init.clone();
            for _ in 0..100 {
                red_black_sweep(&mut v, &fixed, &grid, 1.8);
            }
            black_box(v[[n / 2, n / 2, n / 2]]);
        })
    });

    group.finish();
}

fn bench_gradient_64(c: &mut Criterion) {
    let n = 64;
    let grid = Grid3D::new(n, n, n, 1.0, 1.0, 1.0);
    let field = Array3::from_shape_fn((n, n, n), |(i, j, k)| (i * j + k) as f64);

    c.bench_function("gradient_3d_64", |b| {
        b.iter(|| black_box(gradient_3d(&field, &grid)))
    });
}

criterion_group!(
    benches,
    bench_sweeps_48,
    bench_sor_vs_red_black_convergence,
    bench_gradient_64
);
criterion_main!(benches);
