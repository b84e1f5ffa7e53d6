//! Non-conservative terms of the volume-fraction and energy equations.
//!
//! ```text
//! R(α_k, i)   += ∫ α_k (Σ_f ∫ v* B_i dA / V) dV
//! R(αρE_k, i) -= ∫ u · (Y_k ∇p* - ∇(α p)*_k) B_i dV
//! ```
//!
//! with `Y_k = α_k ρ_k / ρ`, `∇(α p)*_k` the face-accumulated Riemann
//! partial-pressure gradient and `∇p*` its sum over materials.

use super::{ResidualContext, RiemannDerivatives};
use crate::basis::eval_basis_at;
use crate::error::Result;
use crate::quadrature::{TetRule, volume_rule};
use crate::state::{Fields, bulk_density, eval_state};
use crate::types::Vec3;

/// Non-conservative terms of element `e`, added to its residual slice `re`.
#[allow(clippy::too_many_arguments)]
fn element_terms(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    derivs: &RiemannDerivatives,
    e: usize,
    rule: &TetRule,
    ndof: usize,
    ugp: &mut [f64],
    pgp: &mut [f64],
    re: &mut [f64],
) {
    let l = &ctx.layout;
    let nmat = l.nmat();
    let rdof = u.ndof();
    let vol = ctx.mesh.volume[e];

    let mut dap: Vec3 = [0.0; 3];
    for k in 0..nmat {
        let g = derivs.pressure_gradient(e, k);
        for d in 0..3 {
            dap[d] += g[d];
        }
    }

    for (xi, w) in rule.iter() {
        let b = eval_basis_at(rdof, xi);
        eval_state(u, e, rdof, &b, ugp);
        eval_state(p, e, rdof, &b, pgp);
        let wt = w * vol;
        let rhob = bulk_density(l, ugp);
        let vel = [pgp[l.velocity(0)], pgp[l.velocity(1)], pgp[l.velocity(2)]];

        for k in 0..nmat {
            let alpha = ugp[l.volfrac(k)];
            let vf = l.volfrac(k) * ndof;
            for (i, m) in re[vf..vf + ndof].iter_mut().enumerate() {
                *m += wt * alpha * derivs.velocity_moment(e, i);
            }

            let y = ugp[l.density(k)] / rhob;
            let dpk = derivs.pressure_gradient(e, k);
            let ncf: f64 = -(0..3).map(|d| vel[d] * (y * dap[d] - dpk[d])).sum::<f64>();
            let en = l.energy(k) * ndof;
            for (m, bi) in re[en..en + ndof].iter_mut().zip(&b) {
                *m += wt * ncf * bi;
            }
        }
    }
}

/// Add the non-conservative terms. `derivs` must already be divided by the
/// element volumes.
pub fn non_conservative_integral(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    derivs: &RiemannDerivatives,
    r: &mut Fields,
) -> Result<()> {
    let ndof = r.ndof();
    let rule = volume_rule(ndof)?;
    let mut ugp = vec![0.0; ctx.layout.ncomp()];
    let mut pgp = vec![0.0; ctx.layout.nprim()];
    for (e, re) in r.elements_mut().enumerate() {
        element_terms(ctx, u, p, derivs, e, &rule, ndof, &mut ugp, &mut pgp, re);
    }
    Ok(())
}

/// Element-parallel [`non_conservative_integral`].
#[cfg(feature = "parallel")]
pub fn non_conservative_integral_parallel(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    derivs: &RiemannDerivatives,
    r: &mut Fields,
) -> Result<()> {
    use rayon::prelude::*;

    let ndof = r.ndof();
    let rule = volume_rule(ndof)?;
    let (ncomp, nprim) = (ctx.layout.ncomp(), ctx.layout.nprim());
    let len = r.element_len();
    r.as_mut_slice()
        .par_chunks_exact_mut(len)
        .enumerate()
        .for_each_init(
            || (vec![0.0; ncomp], vec![0.0; nprim]),
            |(ugp, pgp), (e, re)| {
                element_terms(ctx, u, p, derivs, e, &rule, ndof, ugp, pgp, re);
            },
        );
    Ok(())
}
