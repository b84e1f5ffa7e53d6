//! Staged limiting pipeline shared by every strategy.
//!
//! 1. Shock sensor marks elements for full limiting.
//! 2. The raw strategy limits a copy of each element, reading neighbor data
//!    from the unlimited arrays.
//! 3. The multi-material pass bounds, positivity-limits and makes
//!    consistent the raw-limited element.
//! 4. The limited copies replace the high-order dofs.
//!
//! Every element only writes its own slice, so steps 2 and 3 run
//! element-parallel with the `parallel` feature.

use tracing::debug;

use super::factors::ElementFactors;
use super::multimat::MultiMatPass;
use super::points::ReferencePoints;
use super::shock::{LimitedVariables, mark_shocked};
use super::superbee::superbee_factors;
use super::traits::{LimiterContext, LimiterReport};
use super::vertex_based::{vertex_p1_factors, vertex_p2_factors};
use super::weno::weno_linear_dofs;
use crate::basis::{BasisGradients, REF_CENTROID, TaylorFrame, eval_dbdxi};
use crate::error::{MultiMatError, Result};
use crate::state::Fields;

/// Raw limiting strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RawStrategy {
    Superbee { beta: f64 },
    Weno { central_weight: f64 },
    VertexBased,
}

/// Read-only data of one limiting pass.
struct Stage<'a> {
    ctx: &'a LimiterContext<'a>,
    strategy: RawStrategy,
    u: &'a Fields,
    p: &'a Fields,
    shocked: &'a [bool],
    points: &'a ReferencePoints,
    frame: Option<&'a TaylorFrame>,
    dbdxi: &'a BasisGradients,
    multimat: MultiMatPass<'a>,
}

impl Stage<'_> {
    /// Limit one element; `ue`/`pe` start as copies of its unlimited dofs.
    fn limit_element(
        &self,
        e: usize,
        ue: &mut [f64],
        pe: &mut [f64],
        f: &mut ElementFactors,
    ) -> bool {
        let ctx = self.ctx;
        let l = &ctx.layout;
        let rdof = self.points.rdof();
        let vars = LimitedVariables::select(
            l,
            self.u,
            e,
            self.shocked[e],
            ctx.config.limiter_thresholds.minor_material,
        );

        f.reset();
        let mut raw_limited = false;
        match self.strategy {
            RawStrategy::Superbee { beta } => {
                let (mesh, pts) = (ctx.mesh, self.points);
                superbee_factors(mesh, self.u, e, &vars.cons, pts, beta, &mut f.cons_p1);
                superbee_factors(mesh, self.p, e, &vars.prim, pts, beta, &mut f.prim_p1);
                f.unify_volume_fractions(l);
                raw_limited = !f.is_unlimited();
                f.apply_dubiner(ue, pe, rdof);
            }
            RawStrategy::Weno { central_weight } => {
                let sides = [(self.u, &mut *ue, &vars.cons), (self.p, &mut *pe, &vars.prim)];
                for (src, data, list) in sides {
                    for &var in list {
                        let g = weno_linear_dofs(ctx.mesh, src, e, var, central_weight);
                        let modes = &mut data[var * rdof + 1..var * rdof + 4];
                        raw_limited |= modes.iter().zip(&g).any(|(a, b)| a != b);
                        modes.copy_from_slice(&g);
                    }
                }
            }
            RawStrategy::VertexBased => match self.frame {
                Some(frame) => {
                    vertex_p2_factors(
                        ctx.mesh,
                        self.u,
                        e,
                        &vars.cons,
                        frame,
                        self.dbdxi,
                        ctx.u_halo,
                        &mut f.cons_p1,
                        &mut f.cons_p2,
                    );
                    vertex_p2_factors(
                        ctx.mesh,
                        self.p,
                        e,
                        &vars.prim,
                        frame,
                        self.dbdxi,
                        ctx.p_halo,
                        &mut f.prim_p1,
                        &mut f.prim_p2,
                    );
                    // curvature is limited at least as hard as the slope
                    for (p1, p2) in f
                        .cons_p1
                        .iter_mut()
                        .zip(f.cons_p2.iter_mut())
                        .chain(f.prim_p1.iter_mut().zip(f.prim_p2.iter_mut()))
                    {
                        let m = p1.min(*p2);
                        *p1 = m;
                        *p2 = m;
                    }
                    f.unify_volume_fractions(l);
                    raw_limited = !f.is_unlimited();
                    f.apply_taylor(frame, ue, pe, rdof);
                }
                None => {
                    let (mesh, pts) = (ctx.mesh, self.points);
                    vertex_p1_factors(mesh, self.u, e, &vars.cons, pts, &mut f.cons_p1);
                    vertex_p1_factors(mesh, self.p, e, &vars.prim, pts, &mut f.prim_p1);
                    f.unify_volume_fractions(l);
                    raw_limited = !f.is_unlimited();
                    f.apply_dubiner(ue, pe, rdof);
                }
            },
        }

        let mm_limited = self.multimat.run(ue, pe, f);
        raw_limited || mm_limited
    }
}

fn check_arrays(ctx: &LimiterContext, u: &Fields, p: &Fields) -> Result<()> {
    let l = &ctx.layout;
    let n = ctx.mesh.n_elements();
    let checks = [
        ("limiter conserved variables", l.ncomp(), u.nvar()),
        ("limiter primitive variables", l.nprim(), p.nvar()),
        ("limiter conserved elements", n, u.nelem()),
        ("limiter primitive elements", n, p.nelem()),
        ("limiter primitive dofs", u.ndof(), p.ndof()),
    ];
    for (context, expected, actual) in checks {
        if expected != actual {
            return Err(MultiMatError::dimension_mismatch(context, expected, actual));
        }
    }
    Ok(())
}

/// Tables shared by the serial and parallel passes.
struct Tables {
    shocked: Vec<bool>,
    points: ReferencePoints,
    frame: Option<TaylorFrame>,
    dbdxi: BasisGradients,
}

fn prepare(ctx: &LimiterContext, u: &Fields, p: &Fields) -> Result<Option<Tables>> {
    check_arrays(ctx, u, p)?;
    let rdof = u.ndof();
    if rdof == 1 {
        return Ok(None);
    }
    let cfg = ctx.config;
    let shocked = mark_shocked(
        cfg.shock_detector,
        cfg.scheme,
        &cfg.limiter_thresholds,
        ctx.mesh,
        &ctx.layout,
        u,
        p,
    )?;
    let frame = if rdof > 4 {
        Some(TaylorFrame::reference(rdof)?)
    } else {
        None
    };
    Ok(Some(Tables {
        shocked,
        points: ReferencePoints::new(rdof)?,
        frame,
        dbdxi: eval_dbdxi(rdof, &REF_CENTROID),
    }))
}

fn stage<'a>(
    ctx: &'a LimiterContext<'a>,
    strategy: RawStrategy,
    u: &'a Fields,
    p: &'a Fields,
    t: &'a Tables,
) -> Stage<'a> {
    Stage {
        ctx,
        strategy,
        u,
        p,
        shocked: &t.shocked,
        points: &t.points,
        frame: t.frame.as_ref(),
        dbdxi: &t.dbdxi,
        multimat: MultiMatPass {
            layout: ctx.layout,
            materials: ctx.materials,
            points: &t.points,
            thresholds: ctx.config.limiter_thresholds,
            intsharp: ctx.config.intsharp,
            accuracy_test: ctx.config.accuracy_test,
        },
    }
}

/// Run the staged pipeline with `strategy`.
pub(crate) fn limit(
    ctx: &LimiterContext,
    strategy: RawStrategy,
    u: &mut Fields,
    p: &mut Fields,
) -> Result<LimiterReport> {
    let Some(tables) = prepare(ctx, u, p)? else {
        return Ok(LimiterReport {
            shocked: vec![false; u.nelem()],
            limited: 0,
        });
    };
    let mut u_lim = u.clone();
    let mut p_lim = p.clone();
    let limited = {
        let st = stage(ctx, strategy, u, p, &tables);
        let mut f = ElementFactors::ones(ctx.layout.ncomp(), ctx.layout.nprim());
        let mut limited = 0;
        for (e, (ue, pe)) in u_lim.elements_mut().zip(p_lim.elements_mut()).enumerate() {
            if st.limit_element(e, ue, pe, &mut f) {
                limited += 1;
            }
        }
        limited
    };
    *u = u_lim;
    *p = p_lim;
    let report = LimiterReport {
        shocked: tables.shocked,
        limited,
    };
    debug!(
        strategy = ?strategy,
        limited = report.limited,
        shocked = report.n_shocked(),
        "limited solution"
    );
    Ok(report)
}

/// Element-parallel [`limit`].
#[cfg(feature = "parallel")]
pub(crate) fn limit_parallel(
    ctx: &LimiterContext,
    strategy: RawStrategy,
    u: &mut Fields,
    p: &mut Fields,
) -> Result<LimiterReport> {
    use rayon::prelude::*;

    let Some(tables) = prepare(ctx, u, p)? else {
        return Ok(LimiterReport {
            shocked: vec![false; u.nelem()],
            limited: 0,
        });
    };
    let (ncomp, nprim) = (ctx.layout.ncomp(), ctx.layout.nprim());
    let mut u_lim = u.clone();
    let mut p_lim = p.clone();
    let ulen = u_lim.element_len();
    let plen = p_lim.element_len();
    let limited = {
        let st = stage(ctx, strategy, u, p, &tables);
        u_lim
            .as_mut_slice()
            .par_chunks_exact_mut(ulen)
            .zip(p_lim.as_mut_slice().par_chunks_exact_mut(plen))
            .enumerate()
            .map_init(
                || ElementFactors::ones(ncomp, nprim),
                |f, (e, (ue, pe))| usize::from(st.limit_element(e, ue, pe, f)),
            )
            .sum::<usize>()
    };
    *u = u_lim;
    *p = p_lim;
    let report = LimiterReport {
        shocked: tables.shocked,
        limited,
    };
    debug!(
        strategy = ?strategy,
        limited = report.limited,
        shocked = report.n_shocked(),
        "limited solution (parallel)"
    );
    Ok(report)
}
