//! Limiters on adversarial high-order data across a material interface.
//!
//! Cell averages describe a smeared air-water interface; every high-order dof
//! is perturbed with pseudo-random values large enough to overshoot. After
//! limiting, volume fractions and partial densities must stay physical at
//! every check point and no cell average may move.

use multimat_dg::limiter::ReferencePoints;
use multimat_dg::{
    Discretization, DiscretizationConfig, Extrapolation, Fields, LimiterKind, MaterialConfig,
    Scheme, SidesetBoundaries, StiffenedGas, TetMesh, VariableLayout,
};

const PRESSURE: f64 = 1.0e5;

/// Deterministic linear congruential sequence in `[-1, 1)`.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}

fn setup(mesh: &TetMesh, limiter: LimiterKind) -> Discretization<'_> {
    let config = DiscretizationConfig::new(
        Scheme::DgP1,
        vec![
            MaterialConfig::new("air", StiffenedGas::air()),
            MaterialConfig::new("water", StiffenedGas::water()),
        ],
    )
    .with_limiter(limiter);
    let bcs = SidesetBoundaries::new().with_default(Extrapolation);
    Discretization::with_boundaries(mesh, config, bcs).unwrap()
}

fn adversarial(d: &Discretization, seed: u64) -> Fields {
    let l = d.layout();
    let rho = [1.2, 1000.0];
    let vel = [20.0, 0.0, 0.0];
    let (mut u, _) = d.allocate();
    let mut rng = Lcg(seed);
    for e in 0..u.nelem() {
        let x = d.mesh().centroid[e][0];
        let a0 = 0.5 + 0.49 * ((x - 0.5) / 0.1).tanh();
        let alpha = [a0, 1.0 - a0];
        let rhob: f64 = alpha.iter().zip(&rho).map(|(a, r)| a * r).sum();
        for k in 0..2 {
            let rho_e = d.materials().total_energy(k, rho[k], &vel, PRESSURE, None).unwrap();
            u.set(e, l.volfrac(k), 0, alpha[k]);
            u.set(e, l.density(k), 0, alpha[k] * rho[k]);
            u.set(e, l.energy(k), 0, alpha[k] * rho_e);
        }
        for (dir, v) in vel.iter().enumerate() {
            u.set(e, l.momentum(dir), 0, rhob * v);
        }
        for i in 1..4 {
            let da = 0.5 * rng.next();
            u.set(e, l.volfrac(0), i, da);
            u.set(e, l.volfrac(1), i, -da);
            for var in (0..2).flat_map(|k| [l.density(k), l.energy(k)]) {
                let avg = u.get(e, var, 0);
                u.set(e, var, i, 0.05 * avg * rng.next());
            }
            let avg = u.get(e, l.momentum(0), 0);
            u.set(e, l.momentum(0), i, 0.05 * avg * rng.next());
        }
    }
    u
}

fn check_points(l: &VariableLayout, u: &Fields, bound: f64) {
    let points = ReferencePoints::new(u.ndof()).unwrap();
    for e in 0..u.nelem() {
        for b in points.check_points() {
            let value = |var: usize| -> f64 {
                u.modes(e, var).iter().zip(b.iter()).map(|(m, bi)| m * bi).sum()
            };
            for k in 0..l.nmat() {
                let alpha = value(l.volfrac(k));
                assert!(
                    alpha >= bound - 1e-12 && alpha <= 1.0 - bound + 1e-12,
                    "element {e}: alpha[{k}] = {alpha}"
                );
                assert!(value(l.density(k)) > 0.0, "element {e}: density[{k}]");
            }
        }
    }
}

fn limit_and_check(limiter: LimiterKind, seed: u64) {
    let mesh = TetMesh::unit_box([4, 2, 2]).unwrap();
    let d = setup(&mesh, limiter);
    let l = d.layout();
    let mut u = adversarial(&d, seed);
    let (_, mut p) = d.allocate();
    d.update_primitives(&u, &mut p).unwrap();
    let (u0, p0) = (u.clone(), p.clone());

    let report = d.limit(&mut u, &mut p).unwrap();
    assert!(report.limited > 0, "{limiter:?}: nothing was limited");

    for e in 0..u.nelem() {
        for var in 0..l.ncomp() {
            assert_eq!(u.get(e, var, 0), u0.get(e, var, 0), "{limiter:?}: average moved");
        }
        for var in 0..l.nprim() {
            assert_eq!(p.get(e, var, 0), p0.get(e, var, 0), "{limiter:?}: average moved");
        }
    }
    let bound = d.config().limiter_thresholds.volfrac_bound;
    check_points(&l, &u, bound);
}

#[test]
fn test_vertex_based_bounds() {
    for seed in [1, 7, 42] {
        limit_and_check(LimiterKind::VertexBased, seed);
    }
}

#[test]
fn test_superbee_bounds() {
    for seed in [3, 11] {
        limit_and_check(LimiterKind::SuperbeeP1, seed);
    }
}

#[test]
fn test_weno_bounds() {
    for seed in [5, 13] {
        limit_and_check(LimiterKind::WenoP1, seed);
    }
}

#[test]
fn test_no_limiter_leaves_data_alone() {
    let mesh = TetMesh::unit_box([2, 2, 2]).unwrap();
    let d = setup(&mesh, LimiterKind::NoLimiter);
    let mut u = adversarial(&d, 9);
    let (_, mut p) = d.allocate();
    d.update_primitives(&u, &mut p).unwrap();
    let (u0, p0) = (u.clone(), p.clone());
    let report = d.limit(&mut u, &mut p).unwrap();
    assert_eq!(report.limited, 0);
    assert_eq!(u, u0);
    assert_eq!(p, p0);
}

#[test]
fn test_isolated_element_keeps_its_slope() {
    let mesh = TetMesh::new(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        vec![[0, 1, 2, 3]],
        &[],
    )
    .unwrap();
    for limiter in [
        LimiterKind::SuperbeeP1,
        LimiterKind::WenoP1,
        LimiterKind::VertexBased,
    ] {
        let d = setup(&mesh, limiter);
        let l = d.layout();
        let mut u = adversarial(&d, 1);
        u.truncate_element(0, 1);
        u.set(0, l.momentum(0), 1, 0.1);
        let (_, mut p) = d.allocate();
        d.update_primitives(&u, &mut p).unwrap();

        d.limit(&mut u, &mut p).unwrap();
        let slope = u.get(0, l.momentum(0), 1);
        assert!((slope - 0.1).abs() < 1e-10, "{limiter:?}: momentum slope {slope}");
    }
}
