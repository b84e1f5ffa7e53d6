//! Shock sensors gating full limiting.
//!
//! Elements not marked as shocked only get their volume fractions limited,
//! plus the density, energy and pressure of minor materials.

use tracing::debug;

use crate::basis::eval_basis_at;
use crate::config::{LimiterThresholds, Scheme, ShockDetector};
use crate::error::Result;
use crate::mesh::TetMesh;
use crate::quadrature::{face_point, face_point_to_reference, face_rule, volume_rule};
use crate::state::{Fields, VariableLayout, bulk_density, eval_state};

/// Mark shocked elements.
///
/// Finite-volume schemes and [`ShockDetector::Always`] mark every element.
pub fn mark_shocked(
    detector: ShockDetector,
    scheme: Scheme,
    thresholds: &LimiterThresholds,
    mesh: &TetMesh,
    layout: &VariableLayout,
    u: &Fields,
    p: &Fields,
) -> Result<Vec<bool>> {
    let n = mesh.n_elements();
    let ndof = scheme.ndof();
    if ndof == 1 {
        return Ok(vec![true; n]);
    }
    let shocked = match detector {
        ShockDetector::Always => vec![true; n],
        ShockDetector::SpectralDecay => {
            let ind = spectral_decay(layout, ndof, u)?;
            ind.iter().map(|&i| i > thresholds.spectral_decay).collect()
        }
        ShockDetector::FluxJump => {
            let ind = flux_jump(mesh, layout, ndof, u, p)?;
            ind.iter().map(|&i| i > thresholds.flux_jump).collect()
        }
    };
    debug!(
        detector = ?detector,
        shocked = shocked.iter().filter(|&&s| s).count(),
        elements = n,
        "marked shocked elements"
    );
    Ok(shocked)
}

/// Spectral-decay indicator `∫(ρ - ρ_low)² / ∫ρ²` of the bulk density,
/// where `ρ_low` drops the highest polynomial order.
pub fn spectral_decay(layout: &VariableLayout, ndof: usize, u: &Fields) -> Result<Vec<f64>> {
    let rule = volume_rule(ndof)?;
    let nlow = if ndof > 4 { 4 } else { 1 };
    let mut full = vec![0.0; layout.ncomp()];
    let mut low = vec![0.0; layout.ncomp()];
    let mut out = Vec::with_capacity(u.nelem());
    for e in 0..u.nelem() {
        let mut num = 0.0;
        let mut den = 0.0;
        for (xi, w) in rule.iter() {
            let b = eval_basis_at(ndof, xi);
            eval_state(u, e, ndof, &b, &mut full);
            eval_state(u, e, nlow, &b, &mut low);
            let rho = bulk_density(layout, &full);
            let rho_low = bulk_density(layout, &low);
            num += w * (rho - rho_low).powi(2);
            den += w * rho * rho;
        }
        out.push(if den > 0.0 { num / den } else { 0.0 });
    }
    Ok(out)
}

/// Flux-jump indicator: the face integral of the jump of the bulk mass flux
/// `ρ (u · n)`, accumulated on both sides of every interior face.
pub fn flux_jump(
    mesh: &TetMesh,
    layout: &VariableLayout,
    ndof: usize,
    u: &Fields,
    p: &Fields,
) -> Result<Vec<f64>> {
    let rule = face_rule(ndof)?;
    let mut ind = vec![0.0; mesh.n_elements()];
    let mut ul = vec![0.0; layout.ncomp()];
    let mut ur = vec![0.0; layout.ncomp()];
    let mut pl = vec![0.0; layout.nprim()];
    let mut pr = vec![0.0; layout.nprim()];
    let mass_flux = |uu: &[f64], pp: &[f64], n: &[f64; 3]| {
        let vn: f64 = (0..3).map(|d| pp[layout.velocity(d)] * n[d]).sum();
        bulk_density(layout, uu) * vn
    };
    for face in mesh.interior_faces() {
        let Some(r) = face.right else { continue };
        let l = face.left;
        let verts = [
            mesh.coords[face.vertices[0]],
            mesh.coords[face.vertices[1]],
            mesh.coords[face.vertices[2]],
        ];
        let tet_l = mesh.element_vertices(l);
        let tet_r = mesh.element_vertices(r);
        let mut jump = 0.0;
        for (xi, w) in rule.iter() {
            let x = face_point(&verts, xi);
            let bl = eval_basis_at(ndof, &face_point_to_reference(&tet_l, &x));
            let br = eval_basis_at(ndof, &face_point_to_reference(&tet_r, &x));
            eval_state(u, l, ndof, &bl, &mut ul);
            eval_state(p, l, ndof, &bl, &mut pl);
            eval_state(u, r, ndof, &br, &mut ur);
            eval_state(p, r, ndof, &br, &mut pr);
            let fl = mass_flux(&ul, &pl, &face.normal);
            let fr = mass_flux(&ur, &pr, &face.normal);
            jump += w * (fl - fr).abs();
        }
        ind[l] += face.area * jump;
        ind[r] += face.area * jump;
    }
    Ok(ind)
}

/// Variables a raw limiter touches in one element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LimitedVariables {
    /// Conserved variable indices.
    pub cons: Vec<usize>,
    /// Primitive variable indices.
    pub prim: Vec<usize>,
}

impl LimitedVariables {
    /// All conserved and all primitive variables.
    pub fn all(layout: &VariableLayout) -> Self {
        Self {
            cons: (0..layout.ncomp()).collect(),
            prim: (0..layout.nprim()).collect(),
        }
    }

    /// Variables of element `e`: all of them when shocked, otherwise the
    /// volume fractions plus the density, energy and pressure of materials
    /// whose average volume fraction is below `minor`.
    pub fn select(
        layout: &VariableLayout,
        u: &Fields,
        e: usize,
        shocked: bool,
        minor: f64,
    ) -> Self {
        if shocked {
            return Self::all(layout);
        }
        let nmat = layout.nmat();
        let mut cons: Vec<usize> = (0..nmat).map(|k| layout.volfrac(k)).collect();
        let mut prim = Vec::new();
        for k in 0..nmat {
            if u.get(e, layout.volfrac(k), 0) < minor {
                cons.push(layout.density(k));
                cons.push(layout.energy(k));
                prim.push(layout.pressure(k));
            }
        }
        Self { cons, prim }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::{Materials, StiffenedGas};

    const TOL: f64 = 1e-14;

    fn setup(ndof: usize) -> (TetMesh, VariableLayout, Fields, Fields) {
        let mesh = TetMesh::unit_box([2, 1, 1]).unwrap();
        let materials =
            Materials::new(vec![StiffenedGas::air().into(), StiffenedGas::water().into()])
                .unwrap();
        let layout = VariableLayout::of(&materials);
        let n = mesh.n_elements();
        let mut u = Fields::new(n, layout.ncomp(), ndof);
        let mut p = Fields::new(n, layout.nprim(), ndof);
        for e in 0..n {
            u.set(e, layout.volfrac(0), 0, 1.0 - 1e-6);
            u.set(e, layout.volfrac(1), 0, 1e-6);
            u.set(e, layout.density(0), 0, 1.2);
            u.set(e, layout.density(1), 0, 1e-3);
            p.set(e, layout.velocity(0), 0, 1.0);
            p.set(e, layout.velocity(1), 0, 0.37);
            p.set(e, layout.velocity(2), 0, 0.21);
        }
        (mesh, layout, u, p)
    }

    #[test]
    fn test_smooth_state_is_not_shocked() {
        let (mesh, layout, u, p) = setup(4);
        let t = LimiterThresholds::default();
        for det in [ShockDetector::SpectralDecay, ShockDetector::FluxJump] {
            let s = mark_shocked(det, Scheme::DgP1, &t, &mesh, &layout, &u, &p).unwrap();
            assert!(s.iter().all(|&s| !s));
        }
        let s = mark_shocked(ShockDetector::FluxJump, Scheme::P0P1, &t, &mesh, &layout, &u, &p)
            .unwrap();
        assert!(s.iter().all(|&s| s));
    }

    #[test]
    fn test_spectral_decay_detects_steep_mode() {
        let (_, layout, mut u, _) = setup(10);
        u.set(0, layout.density(0), 5, 0.5);
        let ind = spectral_decay(&layout, 10, &u).unwrap();
        assert!(ind[0] > 1e-3);
        assert!(ind[1].abs() < TOL);
    }

    #[test]
    fn test_flux_jump_marks_both_sides() {
        let (mesh, layout, mut u, p) = setup(4);
        u.set(0, layout.density(0), 0, 5.0);
        let ind = flux_jump(&mesh, &layout, 4, &u, &p).unwrap();
        assert!(ind[0] > 1e-3);
        let neighbors: Vec<usize> = mesh.esuel[0].iter().flatten().copied().collect();
        assert!(neighbors.iter().any(|&n| ind[n] > 1e-3));
        for e in 1..mesh.n_elements() {
            if !neighbors.contains(&e) {
                assert!(ind[e].abs() < TOL);
            }
        }
    }

    #[test]
    fn test_select_minor_materials() {
        let (_, layout, u, _) = setup(4);
        let v = LimitedVariables::select(&layout, &u, 0, false, 1e-4);
        assert_eq!(
            v.cons,
            vec![layout.volfrac(0), layout.volfrac(1), layout.density(1), layout.energy(1)]
        );
        assert_eq!(v.prim, vec![layout.pressure(1)]);
        assert_eq!(
            LimitedVariables::select(&layout, &u, 0, true, 1e-4),
            LimitedVariables::all(&layout)
        );
    }
}
