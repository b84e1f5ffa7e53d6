//! Free-stream preservation: a uniform state must give a zero residual for
//! every scheme, limiter and material mix, and must survive a full stage
//! preparation untouched.

use multimat_dg::types::IDENTITY;
use multimat_dg::{
    BoundaryKind, BoxSide, Discretization, DiscretizationConfig, Extrapolation, Fields, Jwl,
    LimiterKind, MaterialConfig, Scheme, SidesetBoundaries, SmallShearSolid, StiffenedGas,
    TetMesh,
};

const VELOCITY: [f64; 3] = [12.0, -3.0, 5.0];
const PRESSURE: f64 = 1.0e5;
const TOL: f64 = 1e-10;

fn fill(d: &Discretization, u: &mut Fields, alpha: &[f64], rho: &[f64]) {
    let l = d.layout();
    let rhob: f64 = alpha.iter().zip(rho).map(|(a, r)| a * r).sum();
    for e in 0..u.nelem() {
        for k in 0..l.nmat() {
            let solid = d.materials().solid_slot(k);
            let g = solid.map(|_| IDENTITY);
            let rho_e = d
                .materials()
                .total_energy(k, rho[k], &VELOCITY, PRESSURE, g.as_ref())
                .unwrap();
            u.set(e, l.volfrac(k), 0, alpha[k]);
            u.set(e, l.density(k), 0, alpha[k] * rho[k]);
            u.set(e, l.energy(k), 0, alpha[k] * rho_e);
            if let Some(s) = solid {
                for (i, row) in IDENTITY.iter().enumerate() {
                    for (j, gij) in row.iter().enumerate() {
                        u.set(e, l.deform(s, i, j), 0, *gij);
                    }
                }
            }
        }
        for (dir, v) in VELOCITY.iter().enumerate() {
            u.set(e, l.momentum(dir), 0, rhob * v);
        }
    }
}

/// Prepare a stage and return the residual relative to the state scale.
fn relative_residual(d: &Discretization, alpha: &[f64], rho: &[f64]) -> f64 {
    let (mut u, mut p) = d.allocate();
    fill(d, &mut u, alpha, rho);
    let before = u.clone();
    let report = d.prepare_stage(0.0, &mut u, &mut p).unwrap();
    assert_eq!(report.cleanup.cleaned, 0);
    assert_eq!(report.singular_stencils, 0);
    for e in 0..u.nelem() {
        for var in 0..u.nvar() {
            let (a, b) = (u.get(e, var, 0), before.get(e, var, 0));
            assert!((a - b).abs() <= 1e-12 * b.abs().max(1.0), "average changed");
        }
    }

    let mut r = d.allocate_residual();
    d.residual(0.0, &u, &p, &mut r).unwrap();
    r.max_abs() / u.max_abs()
}

fn two_fluids() -> Vec<MaterialConfig> {
    vec![
        MaterialConfig::new("air", StiffenedGas::air()),
        MaterialConfig::new("water", StiffenedGas::water()),
    ]
}

fn open(mesh: &TetMesh, config: DiscretizationConfig) -> Discretization<'_> {
    let bcs = SidesetBoundaries::new().with_default(Extrapolation);
    Discretization::with_boundaries(mesh, config, bcs).unwrap()
}

#[test]
fn test_fluids_every_scheme_and_limiter() {
    let mesh = TetMesh::unit_box([2, 2, 2]).unwrap();
    let cases = [
        (Scheme::P0, LimiterKind::NoLimiter),
        (Scheme::P0P1, LimiterKind::NoLimiter),
        (Scheme::P0P1, LimiterKind::SuperbeeP1),
        (Scheme::P0P1, LimiterKind::VertexBased),
        (Scheme::DgP1, LimiterKind::SuperbeeP1),
        (Scheme::DgP1, LimiterKind::WenoP1),
        (Scheme::DgP1, LimiterKind::VertexBased),
        (Scheme::DgP2, LimiterKind::NoLimiter),
        (Scheme::DgP2, LimiterKind::VertexBased),
    ];
    for (scheme, limiter) in cases {
        let d = open(&mesh, DiscretizationConfig::new(scheme, two_fluids()).with_limiter(limiter));
        let res = relative_residual(&d, &[0.4, 0.6], &[1.2, 1000.0]);
        assert!(res < TOL, "{scheme:?} {limiter:?}: {res}");
    }
}

#[test]
fn test_single_material() {
    let mesh = TetMesh::unit_box([2, 2, 2]).unwrap();
    let config = DiscretizationConfig::new(
        Scheme::DgP1,
        vec![MaterialConfig::new("air", StiffenedGas::air())],
    );
    let d = open(&mesh, config);
    let res = relative_residual(&d, &[1.0], &[1.2]);
    assert!(res < TOL, "{res}");
}

#[test]
fn test_three_materials_with_jwl() {
    let mesh = TetMesh::unit_box([2, 2, 2]).unwrap();
    let config = DiscretizationConfig::new(
        Scheme::DgP1,
        vec![
            MaterialConfig::new("air", StiffenedGas::air()),
            MaterialConfig::new("water", StiffenedGas::water()),
            MaterialConfig::new("tnt", Jwl::tnt()),
        ],
    );
    let d = open(&mesh, config);
    let res = relative_residual(&d, &[0.2, 0.5, 0.3], &[1.2, 1000.0, 100.0]);
    assert!(res < TOL, "{res}");
}

#[test]
fn test_fluid_and_solid() {
    let mesh = TetMesh::unit_box([2, 2, 2]).unwrap();
    let config = DiscretizationConfig::new(
        Scheme::DgP1,
        vec![
            MaterialConfig::new("air", StiffenedGas::air()),
            MaterialConfig::new("copper", SmallShearSolid::copper()),
        ],
    );
    let d = open(&mesh, config);
    let res = relative_residual(&d, &[0.5, 0.5], &[1.2, 8900.0]);
    assert!(res < TOL, "{res}");
}

#[test]
fn test_walls_at_rest() {
    // a fluid at rest against slip walls stays at rest
    let mesh = TetMesh::unit_box([2, 2, 2]).unwrap();
    let config = BoxSide::ALL.iter().fold(
        DiscretizationConfig::new(Scheme::DgP1, two_fluids()),
        |c, side| c.with_boundary(side.id(), BoundaryKind::Symmetry),
    );
    let d = Discretization::new(&mesh, config, None).unwrap();
    let l = d.layout();
    let (mut u, mut p) = d.allocate();
    fill(&d, &mut u, &[0.4, 0.6], &[1.2, 1000.0]);
    for e in 0..u.nelem() {
        for dir in 0..3 {
            u.set(e, l.momentum(dir), 0, 0.0);
        }
        for k in 0..2 {
            let rho = [1.2, 1000.0][k];
            let alpha = [0.4, 0.6][k];
            let rho_e = d.materials().total_energy(k, rho, &[0.0; 3], PRESSURE, None).unwrap();
            u.set(e, l.energy(k), 0, alpha * rho_e);
        }
    }
    d.prepare_stage(0.0, &mut u, &mut p).unwrap();
    let mut r = d.allocate_residual();
    d.residual(0.0, &u, &p, &mut r).unwrap();
    assert!(r.max_abs() < TOL * u.max_abs(), "{}", r.max_abs());
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_serial() {
    let mesh = TetMesh::unit_box([3, 3, 3]).unwrap();
    let d = open(
        &mesh,
        DiscretizationConfig::new(Scheme::DgP1, two_fluids())
            .with_limiter(LimiterKind::VertexBased),
    );
    let l = d.layout();
    let (mut u, mut p) = d.allocate();
    fill(&d, &mut u, &[0.4, 0.6], &[1.2, 1000.0]);
    for e in 0..u.nelem() {
        let x = mesh.centroid[e][0];
        u.set(e, l.volfrac(0), 1, 0.05 * x);
        u.set(e, l.volfrac(1), 1, -0.05 * x);
        u.set(e, l.momentum(0), 1, 10.0 * x);
    }
    let (mut us, mut ps) = (u.clone(), p.clone());
    d.prepare_stage(0.0, &mut us, &mut ps).unwrap();
    d.prepare_stage_parallel(0.0, &mut u, &mut p).unwrap();
    assert_eq!(u, us);
    assert_eq!(p, ps);

    let mut rs = d.allocate_residual();
    let mut rp = d.allocate_residual();
    d.residual(0.0, &us, &ps, &mut rs).unwrap();
    d.residual_parallel(0.0, &u, &p, &mut rp).unwrap();
    assert_eq!(rs, rp);
    assert_eq!(d.time_step(&us, &ps).unwrap(), d.time_step_parallel(&u, &p).unwrap());
}
