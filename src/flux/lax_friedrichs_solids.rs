//! Lax-Friedrichs flux for mixtures of fluids and elastic solids.
//!
//! Momentum and energy fluxes use the Cauchy traction `α_k σ_k n` instead of
//! the isotropic pressure, every solid transports its inverse deformation
//! gradient with flux `(u · g_i) n_j`, and the material sound speed is
//! evaluated in the face-normal direction from the inverse deformation
//! gradient rotated into the face frame `(n, t1, t2)`.
//!
//! For pure fluids with primitives consistent with the conserved state this
//! reduces to [`super::LaxFriedrichs`].

use faer::Mat;

use super::{FluxContext, RiemannFlux};
use crate::error::Result;
use crate::state::inverse_deformation;
use crate::types::{IDENTITY, Tensor3, Vec3, dot, matvec};

/// Lax-Friedrichs flux with elastic tractions.
#[derive(Clone, Copy, Debug, Default)]
pub struct LaxFriedrichsSolids;

/// Orthonormal face frame with the normal as first row.
fn face_frame(n: &Vec3) -> Mat<f64> {
    let seed: Vec3 = if n[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    let an = dot(&seed, n);
    let mut t1 = [seed[0] - an * n[0], seed[1] - an * n[1], seed[2] - an * n[2]];
    let norm = dot(&t1, &t1).sqrt();
    for c in &mut t1 {
        *c /= norm;
    }
    let t2 = [
        n[1] * t1[2] - n[2] * t1[1],
        n[2] * t1[0] - n[0] * t1[2],
        n[0] * t1[1] - n[1] * t1[0],
    ];
    let rows = [*n, t1, t2];
    Mat::from_fn(3, 3, |i, j| rows[i][j])
}

/// `R g Rᵀ`: the tensor expressed in the face frame.
fn rotate(rot: &Mat<f64>, g: &Tensor3) -> Tensor3 {
    let gm = Mat::from_fn(3, 3, |i, j| g[i][j]);
    let rg = rot * &gm;
    let gn = &rg * rot.transpose();
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = gn[(i, j)];
        }
    }
    out
}

struct Side {
    vn: f64,
    ac: f64,
}

fn side_flux(ctx: &FluxContext, rot: &Mat<f64>, u: &[f64], out: &mut [f64]) -> Result<Side> {
    let l = ctx.layout;
    let n = &ctx.normal;
    let ncomp = l.ncomp();
    let nmat = l.nmat();

    let vel: Vec3 = [
        u[ncomp + l.velocity(0)],
        u[ncomp + l.velocity(1)],
        u[ncomp + l.velocity(2)],
    ];
    let vn = dot(&vel, n);

    let mut rho = 0.0;
    let mut ac2 = 0.0;
    let mut traction = [0.0; 3];
    for k in 0..nmat {
        let alpha = u[l.volfrac(k)];
        let arho = u[l.density(k)];
        let arho_e = u[l.energy(k)];
        let apr = u[ncomp + l.pressure(k)];
        let g = inverse_deformation(&l, ctx.materials, u, k);

        let sigma = ctx
            .materials
            .cauchy_stress(k, arho, &vel, arho_e, alpha, g.as_ref())?;
        let asign = matvec(&sigma, n);
        for (t, s) in traction.iter_mut().zip(asign.iter()) {
            *t += s;
        }

        let gn = rotate(rot, g.as_ref().unwrap_or(&IDENTITY));
        let a = ctx
            .materials
            .directional_sound_speed(k, arho, apr, alpha, &gn)?;
        rho += arho;
        ac2 += arho * a * a;

        out[l.volfrac(k)] = vn * alpha;
        out[l.density(k)] = vn * arho;
        out[l.energy(k)] = vn * arho_e - dot(&vel, &asign);

        if let (Some(s), Some(g)) = (ctx.materials.solid_slot(k), g.as_ref()) {
            for i in 0..3 {
                let ug = dot(&vel, &g[i]);
                for j in 0..3 {
                    out[l.deform(s, i, j)] = ug * n[j];
                }
            }
        }
    }
    for dir in 0..3 {
        out[l.momentum(dir)] = vn * u[l.momentum(dir)] - traction[dir];
    }
    Ok(Side {
        vn,
        ac: (ac2 / rho).sqrt(),
    })
}

impl RiemannFlux for LaxFriedrichsSolids {
    fn compute(
        &self,
        ctx: &FluxContext,
        left: &[f64],
        right: &[f64],
        out: &mut [f64],
    ) -> Result<()> {
        let l = ctx.layout;
        let ncomp = l.ncomp();
        let nmat = l.nmat();
        let rot = face_frame(&ctx.normal);

        let mut fl = vec![0.0; ncomp];
        let mut fr = vec![0.0; ncomp];
        let sl = side_flux(ctx, &rot, left, &mut fl)?;
        let sr = side_flux(ctx, &rot, right, &mut fr)?;

        let lambda = sl.vn.abs().max(sr.vn.abs()) + sl.ac.max(sr.ac);
        for c in 0..ncomp {
            out[c] = 0.5 * (fl[c] + fr[c] - lambda * (right[c] - left[c]));
        }
        for k in 0..nmat {
            let p = l.pressure(k);
            out[ncomp + k] = 0.5 * (left[ncomp + p] + right[ncomp + p]);
        }
        out[ncomp + nmat] = 0.5 * (sl.vn + sr.vn);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "lax_friedrichs_solids"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_face_frame_is_orthonormal() {
        for n in [[1.0, 0.0, 0.0], [0.0, 0.6, 0.8], [0.577, 0.577, 0.5781]] {
            let norm = dot(&n, &n).sqrt();
            let n = [n[0] / norm, n[1] / norm, n[2] / norm];
            let r = face_frame(&n);
            let rrt = &r * r.transpose();
            for i in 0..3 {
                for j in 0..3 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!((rrt[(i, j)] - expected).abs() < TOL);
                }
                assert!((r[(0, i)] - n[i]).abs() < TOL);
            }
        }
    }

    #[test]
    fn test_rotated_normal_component() {
        let n = [0.0, 0.6, 0.8];
        let g = [[1.0, 0.1, 0.0], [0.0, 1.2, 0.3], [0.2, 0.0, 0.9]];
        let gn = rotate(&face_frame(&n), &g);
        let expected = dot(&n, &matvec(&g, &n));
        assert!((gn[0][0] - expected).abs() < TOL);
    }
}
