//! Benchmarks for slope limiters.
//!
//! Run with: `cargo bench --bench limiter_bench`
//!
//! Benchmarks Superbee, WENO and vertex-based limiting of a smeared
//! two-material interface, plus the trace cleanup pass.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use multimat_dg::{
    clean_trace, Discretization, DiscretizationConfig, Extrapolation, Fields, LimiterKind,
    MaterialConfig, Scheme, SidesetBoundaries, StiffenedGas, TetMesh,
};

/// Setup a test problem with an oscillatory interface (needs limiting).
fn setup_problem<'m>(
    mesh: &'m TetMesh,
    scheme: Scheme,
    limiter: LimiterKind,
) -> (Discretization<'m>, Fields, Fields) {
    let config = DiscretizationConfig::new(
        scheme,
        vec![
            MaterialConfig::new("air", StiffenedGas::air()),
            MaterialConfig::new("water", StiffenedGas::water()),
        ],
    )
    .with_limiter(limiter);
    let bcs = SidesetBoundaries::new().with_default(Extrapolation);
    let d = Discretization::with_boundaries(mesh, config, bcs).unwrap();
    let l = d.layout();
    let (mut u, mut p) = d.allocate();
    let rho = [1.2, 1000.0];
    let vel = [5.0, 0.0, 0.0];

    for e in 0..u.nelem() {
        let x = mesh.centroid[e][0];
        let a0 = 0.5 + 0.49 * ((x - 0.5) / 0.05).tanh();
        let alpha = [a0, 1.0 - a0];
        let rhob: f64 = alpha.iter().zip(&rho).map(|(a, r)| a * r).sum();
        for k in 0..2 {
            let rho_e = d.materials().total_energy(k, rho[k], &vel, 1.0e5, None).unwrap();
            u.set(e, l.volfrac(k), 0, alpha[k]);
            u.set(e, l.density(k), 0, alpha[k] * rho[k]);
            u.set(e, l.energy(k), 0, alpha[k] * rho_e);
        }
        for (dir, v) in vel.iter().enumerate() {
            u.set(e, l.momentum(dir), 0, rhob * v);
        }
        // overshooting slopes in every high-order mode
        for i in 1..u.ndof() {
            let s = if (e + i) % 2 == 0 { 0.3 } else { -0.3 };
            u.set(e, l.volfrac(0), i, s);
            u.set(e, l.volfrac(1), i, -s);
            for k in 0..2 {
                u.set(e, l.density(k), i, 0.02 * s * alpha[k] * rho[k]);
            }
        }
    }
    d.update_primitives(&u, &mut p).unwrap();
    (d, u, p)
}

/// Benchmark the limiters on linear DG data.
fn bench_p1_limiters(c: &mut Criterion) {
    let mut group = c.benchmark_group("p1_limiters");

    for n in [4, 8] {
        let mesh = TetMesh::unit_box([n, n, n]).unwrap();
        let n_elements = mesh.n_elements();

        for limiter in [
            LimiterKind::SuperbeeP1,
            LimiterKind::WenoP1,
            LimiterKind::VertexBased,
        ] {
            let (d, u, p) = setup_problem(&mesh, Scheme::DgP1, limiter);

            group.bench_with_input(
                BenchmarkId::new(format!("{limiter:?}"), format!("{n_elements}_elements")),
                &n_elements,
                |b, _| {
                    let (mut u_work, mut p_work) = (u.clone(), p.clone());
                    b.iter(|| {
                        u_work.copy_modes_from(&u).unwrap();
                        p_work.copy_modes_from(&p).unwrap();
                        d.limit(black_box(&mut u_work), black_box(&mut p_work))
                            .unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark the quadratic vertex-based limiter.
fn bench_p2_vertex_based(c: &mut Criterion) {
    let mut group = c.benchmark_group("p2_vertex_based");

    for n in [4, 8] {
        let mesh = TetMesh::unit_box([n, n, n]).unwrap();
        let n_elements = mesh.n_elements();
        let (d, u, p) = setup_problem(&mesh, Scheme::DgP2, LimiterKind::VertexBased);

        group.bench_with_input(
            BenchmarkId::new("apply", format!("{n_elements}_elements")),
            &n_elements,
            |b, _| {
                let (mut u_work, mut p_work) = (u.clone(), p.clone());
                b.iter(|| {
                    u_work.copy_modes_from(&u).unwrap();
                    p_work.copy_modes_from(&p).unwrap();
                    d.limit(black_box(&mut u_work), black_box(&mut p_work))
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the trace-material cleanup.
fn bench_clean_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_trace");

    for n in [4, 8] {
        let mesh = TetMesh::unit_box([n, n, n]).unwrap();
        let n_elements = mesh.n_elements();
        let (d, u, p) = setup_problem(&mesh, Scheme::P0, LimiterKind::NoLimiter);

        group.bench_with_input(
            BenchmarkId::new("apply", format!("{n_elements}_elements")),
            &n_elements,
            |b, _| {
                let (mut u_work, mut p_work) = (u.clone(), p.clone());
                b.iter(|| {
                    u_work.copy_modes_from(&u).unwrap();
                    p_work.copy_modes_from(&p).unwrap();
                    clean_trace(
                        black_box(&mesh),
                        black_box(d.materials()),
                        black_box(&d.config().cleanup_thresholds),
                        &mut u_work,
                        &mut p_work,
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_p1_limiters,
    bench_p2_vertex_based,
    bench_clean_trace
);
criterion_main!(benches);
