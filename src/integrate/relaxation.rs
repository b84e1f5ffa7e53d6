//! Finite-rate pressure relaxation.
//!
//! Every material relaxes toward the equilibrium pressure
//!
//! ```text
//! p* = Σ (α_k (α p)_k / K_k) / Σ (α_k² / K_k),    K_k = α_k ρ_k a_k²
//! ```
//!
//! on the time scale `τ = max_k(ct Δx / a_k)` with `Δx` half the inscribed
//! diameter. The volume-fraction source is
//! `S_k = ((α p)_k - p* α_k) α_k / (K_k τ)` and the energy source `-p S_k`.

use super::ResidualContext;
use crate::basis::eval_basis_at;
use crate::error::Result;
use crate::quadrature::{TetRule, volume_rule};
use crate::state::{Fields, eval_state, inverse_deformation};
use crate::types::ElementIndex;

struct RelaxationScratch {
    ugp: Vec<f64>,
    pgp: Vec<f64>,
    bulk_modulus: Vec<f64>,
}

impl RelaxationScratch {
    fn new(ctx: &ResidualContext) -> Self {
        let l = &ctx.layout;
        Self {
            ugp: vec![0.0; l.ncomp()],
            pgp: vec![0.0; l.nprim()],
            bulk_modulus: vec![0.0; l.nmat()],
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn element_relaxation(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    e: usize,
    rule: &TetRule,
    ndof: usize,
    sc: &mut RelaxationScratch,
    re: &mut [f64],
) -> Result<()> {
    let l = &ctx.layout;
    let mesh = ctx.mesh;
    let rdof = u.ndof();
    let ct = ctx.relaxation.time_scale_factor;
    let dx = mesh.length[e] / 2.0;
    let vol = mesh.volume[e];

    for (xi, w) in rule.iter() {
        let b = eval_basis_at(rdof, xi);
        eval_state(u, e, rdof, &b, &mut sc.ugp);
        eval_state(p, e, rdof, &b, &mut sc.pgp);
        let wt = w * vol;

        let mut pb = 0.0;
        let mut nume = 0.0;
        let mut deno = 0.0;
        let mut trelax: f64 = 0.0;
        for k in 0..l.nmat() {
            let arho = sc.ugp[l.density(k)];
            let alpha = sc.ugp[l.volfrac(k)];
            let apr = sc.pgp[l.pressure(k)];
            let g = inverse_deformation(l, ctx.materials, &sc.ugp, k);
            let a = ctx
                .materials
                .sound_speed(k, arho, apr, alpha, g.as_ref())
                .map_err(|err| err.at_element(ElementIndex::new(e), mesh.centroid[e]))?;
            let kmat = arho * a * a;
            sc.bulk_modulus[k] = kmat;
            pb += apr;
            trelax = trelax.max(ct * dx / a);
            nume += alpha * apr / kmat;
            deno += alpha * alpha / kmat;
        }
        let p_relax = nume / deno;

        for k in 0..l.nmat() {
            let alpha = sc.ugp[l.volfrac(k)];
            let apr = sc.pgp[l.pressure(k)];
            let s_alpha = (apr - p_relax * alpha) * (alpha / sc.bulk_modulus[k]) / trelax;
            let vf = l.volfrac(k) * ndof;
            let en = l.energy(k) * ndof;
            for (i, bi) in b.iter().enumerate().take(ndof) {
                re[vf + i] += wt * s_alpha * bi;
                re[en + i] -= wt * pb * s_alpha * bi;
            }
        }
    }
    Ok(())
}

/// Add the pressure-relaxation sources.
pub fn pressure_relaxation_integral(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
) -> Result<()> {
    let ndof = r.ndof();
    let rule = volume_rule(ndof)?;
    let mut sc = RelaxationScratch::new(ctx);
    for (e, re) in r.elements_mut().enumerate() {
        element_relaxation(ctx, u, p, e, &rule, ndof, &mut sc, re)?;
    }
    Ok(())
}

/// Element-parallel [`pressure_relaxation_integral`].
#[cfg(feature = "parallel")]
pub fn pressure_relaxation_integral_parallel(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
) -> Result<()> {
    use rayon::prelude::*;

    let ndof = r.ndof();
    let rule = volume_rule(ndof)?;
    let len = r.element_len();
    r.as_mut_slice()
        .par_chunks_exact_mut(len)
        .enumerate()
        .try_for_each_init(
            || RelaxationScratch::new(ctx),
            |sc, (e, re)| element_relaxation(ctx, u, p, e, &rule, ndof, sc, re),
        )
}
