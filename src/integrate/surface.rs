//! Face flux integrals.
//!
//! Every face is integrated into face-owned increments (residual of each
//! adjacent element followed by its Riemann derivatives), which are merged
//! into the element arrays in face order. The serial and parallel variants
//! share the per-face kernel and the merge order.

use super::{ResidualContext, RiemannDerivatives};
use crate::basis::{BasisValues, eval_basis_at};
use crate::boundary::BCContext;
use crate::error::{MultiMatError, Result};
use crate::flux::FluxContext;
use crate::mesh::Face;
use crate::quadrature::{TriRule, face_point, face_point_to_reference, face_rule};
use crate::state::{Fields, eval_state};
use crate::types::{ElementIndex, Vec3};

/// Pointwise states and flux of one quadrature point.
struct FaceScratch {
    left: Vec<f64>,
    right: Vec<f64>,
    flux: Vec<f64>,
}

impl FaceScratch {
    fn new(ctx: &ResidualContext) -> Self {
        let l = &ctx.layout;
        let n = l.ncomp() + l.nprim();
        Self {
            left: vec![0.0; n],
            right: vec![0.0; n],
            flux: vec![0.0; l.ncomp() + l.nmat() + 1],
        }
    }
}

/// Conserved followed by primitive state of element `e` at basis values `b`.
#[inline]
fn eval_point(u: &Fields, p: &Fields, e: usize, b: &BasisValues, out: &mut [f64]) {
    let (uo, po) = out.split_at_mut(u.nvar());
    eval_state(u, e, u.ndof(), b, uo);
    eval_state(p, e, p.ndof(), b, po);
}

/// Add `sign * wt * flux` tested against `b` into one side's increments.
///
/// The left element loses the outgoing flux (`sign = 1`); the right element
/// gains it (`sign = -1`), with the derivatives seeing the reversed normal.
#[allow(clippy::too_many_arguments)]
fn accumulate(
    ctx: &ResidualContext,
    ndof: usize,
    flux: &[f64],
    b: &BasisValues,
    normal: &Vec3,
    wt: f64,
    sign: f64,
    out: &mut [f64],
) {
    let l = &ctx.layout;
    let ncomp = l.ncomp();
    let nmat = l.nmat();
    let (res, der) = out.split_at_mut(ncomp * ndof);
    for (c, modes) in res.chunks_exact_mut(ndof).enumerate() {
        let f = sign * wt * flux[c];
        for (m, bi) in modes.iter_mut().zip(b) {
            *m -= f * bi;
        }
    }
    for k in 0..nmat {
        let apr = sign * wt * flux[ncomp + k];
        for dir in 0..3 {
            der[3 * k + dir] += apr * normal[dir];
        }
    }
    let vriem = sign * wt * flux[ncomp + nmat];
    for (d, bi) in der[3 * nmat..].iter_mut().zip(b) {
        *d += vriem * bi;
    }
}

/// Integrate one face into `out_l` (and `out_r` for interior faces).
#[allow(clippy::too_many_arguments)]
fn integrate_face(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    face: &Face,
    rule: &TriRule,
    ndof: usize,
    sc: &mut FaceScratch,
    out_l: &mut [f64],
    mut out_r: Option<&mut [f64]>,
) -> Result<()> {
    let mesh = ctx.mesh;
    let rdof = u.ndof();
    let verts = [
        mesh.coords[face.vertices[0]],
        mesh.coords[face.vertices[1]],
        mesh.coords[face.vertices[2]],
    ];
    let tet_l = mesh.element_vertices(face.left);
    let tet_r = face.right.map(|r| (r, mesh.element_vertices(r)));
    let fctx = FluxContext::new(ctx.materials, ctx.layout, face.normal);
    let FaceScratch { left, right, flux } = sc;

    for (xi, w) in rule.iter() {
        let x = face_point(&verts, xi);
        let wt = w * face.area;

        let bl = eval_basis_at(rdof, &face_point_to_reference(&tet_l, &x));
        eval_point(u, p, face.left, &bl, left);

        let br = match &tet_r {
            Some((r, tet)) => {
                let b = eval_basis_at(rdof, &face_point_to_reference(tet, &x));
                eval_point(u, p, *r, &b, right);
                Some(b)
            }
            None => {
                let bc = BCContext {
                    time: ctx.time,
                    position: x,
                    normal: face.normal,
                    interior: &left[..],
                    materials: ctx.materials,
                    layout: ctx.layout,
                };
                ctx.boundaries.ghost_state(face.sideset, &bc, right)?;
                None
            }
        };

        ctx.flux
            .compute(&fctx, left, right, flux)
            .map_err(|err| locate(ctx, face.left, err))?;

        accumulate(ctx, ndof, flux, &bl, &face.normal, wt, 1.0, out_l);
        if let (Some(out), Some(b)) = (out_r.as_deref_mut(), br.as_ref()) {
            accumulate(ctx, ndof, flux, b, &face.normal, wt, -1.0, out);
        }
    }
    Ok(())
}

fn locate(ctx: &ResidualContext, e: usize, err: MultiMatError) -> MultiMatError {
    err.at_element(ElementIndex::new(e), ctx.mesh.centroid[e])
}

/// Add face-owned increments of element `e`.
fn merge(r: &mut Fields, derivs: &mut RiemannDerivatives, e: usize, buf: &[f64]) {
    let (res, der) = buf.split_at(r.element_len());
    for (a, b) in r.element_mut(e).iter_mut().zip(res) {
        *a += b;
    }
    for (a, b) in derivs.element_mut(e).iter_mut().zip(der) {
        *a += b;
    }
}

fn side_len(r: &Fields, derivs: &RiemannDerivatives) -> usize {
    r.element_len() + derivs.element_len()
}

/// Flux integrals over interior faces.
pub fn interior_surface_integral(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
    derivs: &mut RiemannDerivatives,
) -> Result<()> {
    let ndof = r.ndof();
    let rule = face_rule(ndof)?;
    let side = side_len(r, derivs);
    let mut sc = FaceScratch::new(ctx);
    let mut buf_l = vec![0.0; side];
    let mut buf_r = vec![0.0; side];

    for face in ctx.mesh.interior_faces() {
        let Some(er) = face.right else { continue };
        buf_l.fill(0.0);
        buf_r.fill(0.0);
        integrate_face(ctx, u, p, face, &rule, ndof, &mut sc, &mut buf_l, Some(&mut buf_r))?;
        merge(r, derivs, face.left, &buf_l);
        merge(r, derivs, er, &buf_r);
    }
    Ok(())
}

/// Flux integrals over boundary faces with the ghost state of their side set.
pub fn boundary_surface_integral(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
    derivs: &mut RiemannDerivatives,
) -> Result<()> {
    let ndof = r.ndof();
    let rule = face_rule(ndof)?;
    let mut sc = FaceScratch::new(ctx);
    let mut buf = vec![0.0; side_len(r, derivs)];

    for face in ctx.mesh.boundary_faces() {
        buf.fill(0.0);
        integrate_face(ctx, u, p, face, &rule, ndof, &mut sc, &mut buf, None)?;
        merge(r, derivs, face.left, &buf);
    }
    Ok(())
}

/// Face-parallel [`interior_surface_integral`].
#[cfg(feature = "parallel")]
pub fn interior_surface_integral_parallel(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
    derivs: &mut RiemannDerivatives,
) -> Result<()> {
    use rayon::prelude::*;

    let ndof = r.ndof();
    let rule = face_rule(ndof)?;
    let side = side_len(r, derivs);
    let faces = ctx.mesh.interior_faces();
    let mut bufs = vec![0.0; faces.len() * 2 * side];

    bufs.par_chunks_exact_mut(2 * side)
        .zip(faces.par_iter())
        .try_for_each_init(
            || FaceScratch::new(ctx),
            |sc, (buf, face)| {
                let (bl, br) = buf.split_at_mut(side);
                integrate_face(ctx, u, p, face, &rule, ndof, sc, bl, Some(br))
            },
        )?;

    for (buf, face) in bufs.chunks_exact(2 * side).zip(faces) {
        let Some(er) = face.right else { continue };
        let (bl, br) = buf.split_at(side);
        merge(r, derivs, face.left, bl);
        merge(r, derivs, er, br);
    }
    Ok(())
}

/// Face-parallel [`boundary_surface_integral`].
#[cfg(feature = "parallel")]
pub fn boundary_surface_integral_parallel(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
    derivs: &mut RiemannDerivatives,
) -> Result<()> {
    use rayon::prelude::*;

    let ndof = r.ndof();
    let rule = face_rule(ndof)?;
    let side = side_len(r, derivs);
    let faces = ctx.mesh.boundary_faces();
    let mut bufs = vec![0.0; faces.len() * side];

    bufs.par_chunks_exact_mut(side)
        .zip(faces.par_iter())
        .try_for_each_init(
            || FaceScratch::new(ctx),
            |sc, (buf, face)| integrate_face(ctx, u, p, face, &rule, ndof, sc, buf, None),
        )?;

    for (buf, face) in bufs.chunks_exact(side).zip(faces) {
        merge(r, derivs, face.left, buf);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{two_fluids, uniform};
    use super::*;
    use crate::boundary::{Extrapolation, SidesetBoundaries};
    use crate::config::RelaxationConfig;
    use crate::flux::LaxFriedrichs;
    use crate::mesh::TetMesh;
    use crate::state::VariableLayout;

    const TOL: f64 = 1e-9;

    fn context<'a>(
        mesh: &'a TetMesh,
        materials: &'a crate::eos::Materials,
        bcs: &'a SidesetBoundaries,
    ) -> ResidualContext<'a> {
        ResidualContext {
            mesh,
            materials,
            layout: VariableLayout::of(materials),
            flux: &LaxFriedrichs,
            boundaries: bcs,
            relaxation: RelaxationConfig::default(),
            time: 0.0,
        }
    }

    #[test]
    fn test_interior_faces_conserve() {
        // every interior face adds and removes the same amount from the
        // cell averages, so the P0 residual sums to zero
        let mesh = TetMesh::unit_box([2, 1, 1]).unwrap();
        let materials = two_fluids();
        let bcs = SidesetBoundaries::new().with_default(Extrapolation);
        let ctx = context(&mesh, &materials, &bcs);
        let l = ctx.layout;
        let (mut u, p) = uniform(
            &mesh,
            &materials,
            4,
            &[0.5, 0.5],
            &[1.2, 1000.0],
            1.0e5,
            [1.0, 0.0, 0.0],
        );
        for e in 0..mesh.n_elements() {
            u.set(e, l.density(0), 0, 0.6 + 0.1 * e as f64);
            u.set(e, l.density(0), 1, 0.01);
        }
        let mut r = Fields::new(mesh.n_elements(), l.ncomp(), 4);
        let mut d = RiemannDerivatives::new(mesh.n_elements(), 2, 4);
        interior_surface_integral(&ctx, &u, &p, &mut r, &mut d).unwrap();
        for c in 0..l.ncomp() {
            let total: f64 = (0..mesh.n_elements()).map(|e| r.get(e, c, 0)).sum();
            assert!(total.abs() < TOL, "component {c}: {total}");
        }
        assert!(r.get(0, l.density(0), 0).abs() > 0.0);
    }

    #[test]
    fn test_closed_surface_pressure_derivative_vanishes() {
        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        let materials = two_fluids();
        let bcs = SidesetBoundaries::new().with_default(Extrapolation);
        let ctx = context(&mesh, &materials, &bcs);
        let (u, p) = uniform(
            &mesh,
            &materials,
            4,
            &[0.4, 0.6],
            &[1.2, 1000.0],
            2.0e5,
            [0.0, 0.0, 0.0],
        );
        let n = mesh.n_elements();
        let mut r = Fields::new(n, ctx.layout.ncomp(), 4);
        let mut d = RiemannDerivatives::new(n, 2, 4);
        interior_surface_integral(&ctx, &u, &p, &mut r, &mut d).unwrap();
        boundary_surface_integral(&ctx, &u, &p, &mut r, &mut d).unwrap();
        for e in 0..n {
            for k in 0..2 {
                for g in d.pressure_gradient(e, k) {
                    assert!(g.abs() < TOL * 2.0e5);
                }
            }
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_faces_match_serial() {
        let mesh = TetMesh::unit_box([2, 2, 1]).unwrap();
        let materials = two_fluids();
        let bcs = SidesetBoundaries::new().with_default(Extrapolation);
        let ctx = context(&mesh, &materials, &bcs);
        let l = ctx.layout;
        let (mut u, p) = uniform(
            &mesh,
            &materials,
            4,
            &[0.5, 0.5],
            &[1.2, 1000.0],
            1.0e5,
            [3.0, 1.0, 0.0],
        );
        for e in 0..mesh.n_elements() {
            u.set(e, l.volfrac(0), 2, 0.01 * e as f64);
        }
        let n = mesh.n_elements();
        let mut r1 = Fields::new(n, l.ncomp(), 4);
        let mut d1 = RiemannDerivatives::new(n, 2, 4);
        interior_surface_integral(&ctx, &u, &p, &mut r1, &mut d1).unwrap();
        boundary_surface_integral(&ctx, &u, &p, &mut r1, &mut d1).unwrap();
        let mut r2 = Fields::new(n, l.ncomp(), 4);
        let mut d2 = RiemannDerivatives::new(n, 2, 4);
        interior_surface_integral_parallel(&ctx, &u, &p, &mut r2, &mut d2).unwrap();
        boundary_surface_integral_parallel(&ctx, &u, &p, &mut r2, &mut d2).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(d1, d2);
    }
}
