//! Lax-Friedrichs flux for the multi-material fluid system.
//!
//! ```text
//! F* = ½ (F(u_l)·n + F(u_r)·n - λ (u_r - u_l)),   λ = max|v_n| + max a_mix
//! ```
//!
//! with the mixture sound speed `a_mix² = Σ α_k ρ_k a_k² / ρ`. The flux is
//! followed by the Riemann-averaged partial pressures and the Riemann
//! velocity `½ (v_n,l + v_n,r)` for the non-conservative terms.

use super::{FluxContext, RiemannFlux};
use crate::error::Result;
use crate::types::{Vec3, dot};

/// Lax-Friedrichs flux (fluids only).
#[derive(Clone, Copy, Debug, Default)]
pub struct LaxFriedrichs;

/// Physical normal flux of one side plus its wave-speed bound.
fn side_flux(ctx: &FluxContext, u: &[f64], out: &mut [f64]) -> Result<(f64, f64)> {
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
    let mut pb = 0.0;
    for k in 0..nmat {
        let arho = u[l.density(k)];
        let apr = u[ncomp + l.pressure(k)];
        let a = ctx
            .materials
            .sound_speed(k, arho, apr, u[l.volfrac(k)], None)?;
        rho += arho;
        ac2 += arho * a * a;
        pb += apr;

        out[l.volfrac(k)] = vn * u[l.volfrac(k)];
        out[l.density(k)] = vn * arho;
        out[l.energy(k)] = vn * (u[l.energy(k)] + apr);
    }
    for dir in 0..3 {
        out[l.momentum(dir)] = vn * u[l.momentum(dir)] + pb * n[dir];
    }
    Ok((vn, (ac2 / rho).sqrt()))
}

impl RiemannFlux for LaxFriedrichs {
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

        let mut fl = vec![0.0; ncomp];
        let mut fr = vec![0.0; ncomp];
        let (vnl, acl) = side_flux(ctx, left, &mut fl)?;
        let (vnr, acr) = side_flux(ctx, right, &mut fr)?;

        let lambda = vnl.abs().max(vnr.abs()) + acl.max(acr);
        for c in 0..ncomp {
            out[c] = 0.5 * (fl[c] + fr[c] - lambda * (right[c] - left[c]));
        }
        for k in 0..nmat {
            let p = l.pressure(k);
            out[ncomp + k] = 0.5 * (left[ncomp + p] + right[ncomp + p]);
        }
        out[ncomp + nmat] = 0.5 * (vnl + vnr);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "lax_friedrichs"
    }
}
