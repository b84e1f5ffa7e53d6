//! Volume integral of the physical flux against the basis gradients.

use super::ResidualContext;
use crate::basis::{eval_basis_at, eval_dbdx, inverse_jacobian};
use crate::error::{MultiMatError, Result};
use crate::flux::physical_flux;
use crate::quadrature::{TetRule, volume_rule};
use crate::state::{Fields, eval_state};
use crate::types::ElementIndex;

struct VolumeScratch {
    ugp: Vec<f64>,
    pgp: Vec<f64>,
    flux: Vec<[f64; 3]>,
}

impl VolumeScratch {
    fn new(ctx: &ResidualContext) -> Self {
        let l = &ctx.layout;
        Self {
            ugp: vec![0.0; l.ncomp()],
            pgp: vec![0.0; l.nprim()],
            flux: vec![[0.0; 3]; l.ncomp()],
        }
    }
}

/// `∫ F · ∇B_i dV` of element `e`, added to its residual slice `re`.
#[allow(clippy::too_many_arguments)]
fn element_volume(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    e: usize,
    rule: &TetRule,
    ndof: usize,
    sc: &mut VolumeScratch,
    re: &mut [f64],
) -> Result<()> {
    let mesh = ctx.mesh;
    let rdof = u.ndof();
    let jac_inv = inverse_jacobian(&mesh.element_vertices(e))
        .ok_or_else(|| MultiMatError::invalid_config(format!("degenerate element {e}")))?;
    let vol = mesh.volume[e];

    for (xi, w) in rule.iter() {
        let b = eval_basis_at(rdof, xi);
        let dbdx = eval_dbdx(ndof, xi, &jac_inv);
        eval_state(u, e, rdof, &b, &mut sc.ugp);
        eval_state(p, e, rdof, &b, &mut sc.pgp);
        physical_flux(&ctx.layout, ctx.materials, &sc.ugp, &sc.pgp, &mut sc.flux)
            .map_err(|err| err.at_element(ElementIndex::new(e), mesh.centroid[e]))?;

        let wt = w * vol;
        for (modes, f) in re.chunks_exact_mut(ndof).zip(&sc.flux) {
            for (i, m) in modes.iter_mut().enumerate().skip(1) {
                *m += wt * (f[0] * dbdx[0][i] + f[1] * dbdx[1][i] + f[2] * dbdx[2][i]);
            }
        }
    }
    Ok(())
}

/// Volume flux integrals. A no-op for finite-volume schemes.
pub fn volume_integral(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
) -> Result<()> {
    let ndof = r.ndof();
    if ndof == 1 {
        return Ok(());
    }
    let rule = volume_rule(ndof)?;
    let mut sc = VolumeScratch::new(ctx);
    for (e, re) in r.elements_mut().enumerate() {
        element_volume(ctx, u, p, e, &rule, ndof, &mut sc, re)?;
    }
    Ok(())
}

/// Element-parallel [`volume_integral`].
#[cfg(feature = "parallel")]
pub fn volume_integral_parallel(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
) -> Result<()> {
    use rayon::prelude::*;

    let ndof = r.ndof();
    if ndof == 1 {
        return Ok(());
    }
    let rule = volume_rule(ndof)?;
    let len = r.element_len();
    r.as_mut_slice()
        .par_chunks_exact_mut(len)
        .enumerate()
        .try_for_each_init(
            || VolumeScratch::new(ctx),
            |sc, (e, re)| element_volume(ctx, u, p, e, &rule, ndof, sc, re),
        )
}
