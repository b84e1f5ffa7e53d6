//! Trait-based Riemann flux abstraction.
//!
//! # Example
//! ```
//! use multimat_dg::eos::{Materials, StiffenedGas};
//! use multimat_dg::flux::{FluxContext, LaxFriedrichs, RiemannFlux};
//! use multimat_dg::state::VariableLayout;
//!
//! let materials = Materials::new(vec![StiffenedGas::air().into()]).unwrap();
//! let layout = VariableLayout::of(&materials);
//! let ctx = FluxContext::new(&materials, layout, [1.0, 0.0, 0.0]);
//!
//! // [α, αρ, ρu, ρv, ρw, αρE | p, u, v, w]
//! let left = [1.0, 1.0, 0.0, 0.0, 0.0, 2.5e5, 1.0e5, 0.0, 0.0, 0.0];
//! let right = [1.0, 0.125, 0.0, 0.0, 0.0, 2.5e4, 1.0e4, 0.0, 0.0, 0.0];
//! let flux = LaxFriedrichs.flux(&ctx, &left, &right).unwrap();
//! assert_eq!(flux.len(), layout.ncomp() + layout.nmat() + 1);
//! ```

use crate::config::FluxKind;
use crate::eos::Materials;
use crate::error::{MultiMatError, Result};
use crate::state::VariableLayout;
use crate::types::Vec3;

use super::{LaxFriedrichs, LaxFriedrichsSolids};

// =============================================================================
// Flux Context
// =============================================================================

/// Context provided to Riemann flux computations.
#[derive(Clone, Copy, Debug)]
pub struct FluxContext<'a> {
    /// Material closures.
    pub materials: &'a Materials,
    /// Variable layout of the conserved and primitive arrays.
    pub layout: VariableLayout,
    /// Unit normal pointing from the left to the right state.
    pub normal: Vec3,
    /// Prescribed face velocity of a moving mesh. Accepted for a common
    /// flux signature; the fixed-mesh fluxes ignore it.
    pub mesh_velocity: Vec3,
}

impl<'a> FluxContext<'a> {
    /// Create a new flux context.
    #[inline]
    pub fn new(materials: &'a Materials, layout: VariableLayout, normal: Vec3) -> Self {
        Self {
            materials,
            layout,
            normal,
            mesh_velocity: [0.0; 3],
        }
    }

    /// Set the prescribed face velocity.
    #[inline]
    pub fn with_mesh_velocity(mut self, velocity: Vec3) -> Self {
        self.mesh_velocity = velocity;
        self
    }

    /// Length of a flux vector: conserved fluxes, one Riemann pressure per
    /// material and the Riemann velocity.
    #[inline]
    pub fn flux_len(&self) -> usize {
        self.layout.ncomp() + self.layout.nmat() + 1
    }

    /// Length of a face state: conserved followed by primitive variables.
    #[inline]
    pub fn state_len(&self) -> usize {
        self.layout.ncomp() + self.layout.nprim()
    }
}

// =============================================================================
// Riemann Flux Trait
// =============================================================================

/// Approximate Riemann solver for the multi-material system.
///
/// Left and right states are pointwise `[conserved..., primitive...]`
/// vectors. The output holds the normal flux of every conserved variable,
/// then the Riemann-averaged partial pressures, then the Riemann velocity.
///
/// - Fluxes are consistent: `F*(u, u) = F(u)·n`
/// - Fluxes are conservative: `F*(u_l, u_r; n) = -F*(u_r, u_l; -n)`
pub trait RiemannFlux: Send + Sync {
    /// Write the flux into `out` (length [`FluxContext::flux_len`]).
    fn compute(
        &self,
        ctx: &FluxContext,
        left: &[f64],
        right: &[f64],
        out: &mut [f64],
    ) -> Result<()>;

    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Allocate and return the flux vector.
    fn flux(&self, ctx: &FluxContext, left: &[f64], right: &[f64]) -> Result<Vec<f64>> {
        let n = ctx.state_len();
        for (side, len) in [("left", left.len()), ("right", right.len())] {
            if len != n {
                return Err(MultiMatError::dimension_mismatch(
                    format!("{} {side} state", self.name()),
                    n,
                    len,
                ));
            }
        }
        let mut out = vec![0.0; ctx.flux_len()];
        self.compute(ctx, left, right, &mut out)?;
        Ok(out)
    }
}

// =============================================================================
// Static Dispatch Enum
// =============================================================================

/// Enum over the built-in fluxes for dispatch without boxing.
#[derive(Clone, Copy, Debug)]
pub enum StandardFlux {
    /// Fluid Lax-Friedrichs.
    LaxFriedrichs(LaxFriedrichs),
    /// Lax-Friedrichs with elastic tractions.
    LaxFriedrichsSolids(LaxFriedrichsSolids),
}

impl RiemannFlux for StandardFlux {
    #[inline]
    fn compute(
        &self,
        ctx: &FluxContext,
        left: &[f64],
        right: &[f64],
        out: &mut [f64],
    ) -> Result<()> {
        match self {
            Self::LaxFriedrichs(f) => f.compute(ctx, left, right, out),
            Self::LaxFriedrichsSolids(f) => f.compute(ctx, left, right, out),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::LaxFriedrichs(f) => f.name(),
            Self::LaxFriedrichsSolids(f) => f.name(),
        }
    }
}

impl From<FluxKind> for StandardFlux {
    fn from(kind: FluxKind) -> Self {
        match kind {
            FluxKind::LaxFriedrichs => Self::LaxFriedrichs(LaxFriedrichs),
            FluxKind::LaxFriedrichsSolids => Self::LaxFriedrichsSolids(LaxFriedrichsSolids),
        }
    }
}

/// Type alias for boxed flux trait objects.
pub type BoxedFlux = Box<dyn RiemannFlux>;

/// Create a boxed flux from the configured kind.
pub fn create_flux(kind: FluxKind) -> BoxedFlux {
    match kind {
        FluxKind::LaxFriedrichs => Box::new(LaxFriedrichs),
        FluxKind::LaxFriedrichsSolids => Box::new(LaxFriedrichsSolids),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::{SmallShearSolid, StiffenedGas};
    use crate::types::IDENTITY;

    const TOL: f64 = 1e-9;

    fn two_fluids() -> Materials {
        Materials::new(vec![StiffenedGas::air().into(), StiffenedGas::water().into()]).unwrap()
    }

    /// Consistent pointwise state from volume fractions, densities,
    /// pressures and velocity.
    fn state(materials: &Materials, alpha: &[f64], rho: &[f64], p: &[f64], u: Vec3) -> Vec<f64> {
        let l = VariableLayout::of(materials);
        let mut s = vec![0.0; l.ncomp() + l.nprim()];
        let mut rhob = 0.0;
        for k in 0..l.nmat() {
            let g = materials.solid_slot(k).map(|_| IDENTITY);
            s[l.volfrac(k)] = alpha[k];
            s[l.density(k)] = alpha[k] * rho[k];
            s[l.energy(k)] =
                alpha[k] * materials.total_energy(k, rho[k], &u, p[k], g.as_ref()).unwrap();
            s[l.ncomp() + l.pressure(k)] = alpha[k] * p[k];
            rhob += alpha[k] * rho[k];
            if let Some(slot) = materials.solid_slot(k) {
                for i in 0..3 {
                    s[l.deform(slot, i, i)] = 1.0;
                }
            }
        }
        for d in 0..3 {
            s[l.momentum(d)] = rhob * u[d];
            s[l.ncomp() + l.velocity(d)] = u[d];
        }
        s
    }

    #[test]
    fn test_consistency_gives_physical_flux() {
        let m = two_fluids();
        let l = VariableLayout::of(&m);
        let u = state(&m, &[0.3, 0.7], &[1.2, 1000.0], &[1e5, 1e5], [10.0, 0.0, 0.0]);
        let ctx = FluxContext::new(&m, l, [1.0, 0.0, 0.0]);
        let f = LaxFriedrichs.flux(&ctx, &u, &u).unwrap();

        assert!((f[l.volfrac(0)] - 3.0).abs() < TOL);
        assert!((f[l.density(1)] - 10.0 * 700.0).abs() < TOL);
        let rhob = 0.3 * 1.2 + 0.7 * 1000.0;
        assert!((f[l.momentum(0)] - (rhob * 100.0 + 1e5)).abs() < 1e-6);
        assert!(f[l.momentum(1)].abs() < TOL);
        // Riemann pressures and velocity
        assert!((f[l.ncomp()] - 0.3e5).abs() < TOL);
        assert!((f[l.ncomp() + 1] - 0.7e5).abs() < TOL);
        assert!((f[l.ncomp() + 2] - 10.0).abs() < TOL);
    }

    #[test]
    fn test_mesh_velocity_is_ignored() {
        let m = two_fluids();
        let l = VariableLayout::of(&m);
        let ul = state(&m, &[0.6, 0.4], &[1.2, 1000.0], &[2e5, 2e5], [5.0, 0.0, 1.0]);
        let ur = state(&m, &[0.3, 0.7], &[1.0, 998.0], &[1e5, 1e5], [0.0, 2.0, 0.0]);
        let n = [0.0, 0.6, 0.8];
        for kind in [FluxKind::LaxFriedrichs, FluxKind::LaxFriedrichsSolids] {
            let flux = create_flux(kind);
            let fixed = flux.flux(&FluxContext::new(&m, l, n), &ul, &ur).unwrap();
            let moving = FluxContext::new(&m, l, n).with_mesh_velocity([3.0, -1.0, 0.5]);
            assert_eq!(flux.flux(&moving, &ul, &ur).unwrap(), fixed, "{}", flux.name());
        }
    }

    #[test]
    fn test_conservation_under_normal_reversal() {
        let m = two_fluids();
        let l = VariableLayout::of(&m);
        let ul = state(&m, &[0.9, 0.1], &[1.2, 1000.0], &[2e5, 2e5], [5.0, -1.0, 2.0]);
        let ur = state(&m, &[0.2, 0.8], &[1.0, 998.0], &[1e5, 1e5], [0.0, 3.0, 1.0]);
        let n = [0.48, 0.6, 0.64];
        let nm = [-0.48, -0.6, -0.64];

        let fluxes = [
            create_flux(FluxKind::LaxFriedrichs),
            create_flux(FluxKind::LaxFriedrichsSolids),
        ];
        for flux in fluxes {
            let f = flux.flux(&FluxContext::new(&m, l, n), &ul, &ur).unwrap();
            let g = flux.flux(&FluxContext::new(&m, l, nm), &ur, &ul).unwrap();
            for c in 0..l.ncomp() {
                let scale = 1.0 + f[c].abs();
                assert!((f[c] + g[c]).abs() / scale < TOL, "{}: component {c}", flux.name());
            }
            // averaged pressures are symmetric, the Riemann velocity flips
            for k in 0..l.nmat() {
                assert!((f[l.ncomp() + k] - g[l.ncomp() + k]).abs() < TOL);
            }
            let vr = l.ncomp() + l.nmat();
            assert!((f[vr] + g[vr]).abs() < TOL);
        }
    }

    #[test]
    fn test_solids_flux_matches_fluid_flux_for_fluids() {
        let m = two_fluids();
        let l = VariableLayout::of(&m);
        let ul = state(&m, &[0.5, 0.5], &[1.2, 1000.0], &[1e5, 1e5], [1.0, 0.0, 0.0]);
        let ur = state(&m, &[0.4, 0.6], &[1.1, 1001.0], &[9e4, 9e4], [0.5, 0.2, 0.0]);
        let ctx = FluxContext::new(&m, l, [0.0, 0.0, 1.0]);
        let a = StandardFlux::from(FluxKind::LaxFriedrichs).flux(&ctx, &ul, &ur).unwrap();
        let b = StandardFlux::from(FluxKind::LaxFriedrichsSolids).flux(&ctx, &ul, &ur).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() / (1.0 + x.abs()) < 1e-8);
        }
    }

    #[test]
    fn test_solid_deformation_flux() {
        let m = Materials::new(vec![
            StiffenedGas::air().into(),
            SmallShearSolid::copper().into(),
        ])
        .unwrap();
        let l = VariableLayout::of(&m);
        let u = state(&m, &[1e-6, 1.0 - 1e-6], &[1.2, 8900.0], &[1e5, 1e5], [2.0, 0.0, 0.0]);
        let ctx = FluxContext::new(&m, l, [1.0, 0.0, 0.0]);
        let f = LaxFriedrichsSolids.flux(&ctx, &u, &u).unwrap();
        assert_eq!(f.len(), l.ncomp() + l.nmat() + 1);
        // (u · g_i) n_j with g = I, u = (2, 0, 0), n = x
        assert!((f[l.deform(0, 0, 0)] - 2.0).abs() < TOL);
        assert!(f[l.deform(0, 1, 0)].abs() < TOL);
        assert!(f[l.deform(0, 0, 1)].abs() < TOL);
    }

    #[test]
    fn test_flux_rejects_short_state() {
        let m = two_fluids();
        let ctx = FluxContext::new(&m, VariableLayout::of(&m), [1.0, 0.0, 0.0]);
        let err = LaxFriedrichs.flux(&ctx, &[1.0; 3], &[1.0; 3]);
        assert!(matches!(err, Err(MultiMatError::DimensionMismatch { .. })));
    }
}
