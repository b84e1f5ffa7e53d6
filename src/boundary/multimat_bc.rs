//! Boundary states for the multi-material system.
//!
//! Every condition maps the interior face state `[conserved..., primitive...]`
//! to a ghost state of the same layout, which is then handed to the Riemann
//! flux like an interior neighbor.

use std::fmt;
use std::sync::Arc;

use crate::eos::Materials;
use crate::error::{MultiMatError, Result};
use crate::state::{VariableLayout, bulk_density, inverse_deformation};
use crate::types::{Vec3, dot};

/// Volume fraction above which a material contributes to the far-field
/// sound speed.
const SOUND_SPEED_ALPHA_MIN: f64 = 1e-4;

/// Context for boundary condition evaluation.
#[derive(Clone, Copy, Debug)]
pub struct BCContext<'a> {
    /// Current physical time.
    pub time: f64,
    /// Quadrature point on the boundary face.
    pub position: Vec3,
    /// Outward unit normal.
    pub normal: Vec3,
    /// Interior state, conserved followed by primitive variables.
    pub interior: &'a [f64],
    /// Material closures.
    pub materials: &'a Materials,
    /// Variable layout.
    pub layout: VariableLayout,
}

impl<'a> BCContext<'a> {
    /// Interior bulk velocity (from the primitives).
    pub fn interior_velocity(&self) -> Vec3 {
        let l = &self.layout;
        let base = l.ncomp();
        [
            self.interior[base + l.velocity(0)],
            self.interior[base + l.velocity(1)],
            self.interior[base + l.velocity(2)],
        ]
    }

    /// Interior normal velocity.
    pub fn interior_normal_velocity(&self) -> f64 {
        dot(&self.interior_velocity(), &self.normal)
    }

    /// Largest sound speed over the materials present at the face.
    pub fn interior_sound_speed(&self) -> Result<f64> {
        let l = &self.layout;
        let u = self.interior;
        let mut a: f64 = 0.0;
        for k in 0..l.nmat() {
            let alpha = u[l.volfrac(k)];
            if alpha > SOUND_SPEED_ALPHA_MIN {
                let g = inverse_deformation(l, self.materials, u, k);
                let ak = self.materials.sound_speed(
                    k,
                    u[l.density(k)],
                    u[l.ncomp() + l.pressure(k)],
                    alpha,
                    g.as_ref(),
                )?;
                a = a.max(ak);
            }
        }
        Ok(a)
    }
}

/// Trait for multi-material boundary conditions.
pub trait MultiMatBoundaryCondition: Send + Sync {
    /// Write the ghost state for flux evaluation into `ghost`, which has the
    /// same length as `ctx.interior`.
    fn ghost_state(&self, ctx: &BCContext, ghost: &mut [f64]) -> Result<()>;

    /// Name of this boundary condition for logging.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Dirichlet
// =============================================================================

/// Conserved state as a function of position and time.
pub type StateFn = Arc<dyn Fn(&Vec3, f64) -> Vec<f64> + Send + Sync>;

/// Prescribed state. The closure returns the conserved variables; the
/// primitives of the ghost state are derived through the material EOS.
#[derive(Clone)]
pub struct Dirichlet {
    state: StateFn,
}

impl Dirichlet {
    /// Create from a conserved-state function.
    pub fn new(state: impl Fn(&Vec3, f64) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Create from a shared conserved-state function.
    pub fn from_shared(state: StateFn) -> Self {
        Self { state }
    }
}

impl fmt::Debug for Dirichlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dirichlet").finish_non_exhaustive()
    }
}

impl MultiMatBoundaryCondition for Dirichlet {
    fn ghost_state(&self, ctx: &BCContext, ghost: &mut [f64]) -> Result<()> {
        let l = &ctx.layout;
        let ncomp = l.ncomp();
        let ur = (self.state)(&ctx.position, ctx.time);
        if ur.len() != ncomp {
            return Err(MultiMatError::dimension_mismatch(
                "Dirichlet boundary state",
                ncomp,
                ur.len(),
            ));
        }
        ghost[..ncomp].copy_from_slice(&ur);

        let rho = bulk_density(l, ghost);
        let vel = [
            ghost[l.momentum(0)] / rho,
            ghost[l.momentum(1)] / rho,
            ghost[l.momentum(2)] / rho,
        ];
        for (d, v) in vel.iter().enumerate() {
            ghost[ncomp + l.velocity(d)] = *v;
        }
        for k in 0..l.nmat() {
            let g = inverse_deformation(l, ctx.materials, ghost, k);
            ghost[ncomp + l.pressure(k)] = ctx.materials.pressure(
                k,
                ghost[l.density(k)],
                &vel,
                ghost[l.energy(k)],
                ghost[l.volfrac(k)],
                g.as_ref(),
            )?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dirichlet"
    }
}

// =============================================================================
// Symmetry
// =============================================================================

/// Slip wall: mirror state with reversed normal velocity.
///
/// ```text
/// u_ghost = u - 2 (u·n) n,   ρu_ghost = ρu - 2 (ρu·n) n
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Symmetry;

impl MultiMatBoundaryCondition for Symmetry {
    fn ghost_state(&self, ctx: &BCContext, ghost: &mut [f64]) -> Result<()> {
        let l = &ctx.layout;
        let n = &ctx.normal;
        ghost.copy_from_slice(ctx.interior);

        let mom = [
            ghost[l.momentum(0)],
            ghost[l.momentum(1)],
            ghost[l.momentum(2)],
        ];
        let mn = dot(&mom, n);
        let vn = ctx.interior_normal_velocity();
        for d in 0..3 {
            ghost[l.momentum(d)] -= 2.0 * mn * n[d];
            ghost[l.ncomp() + l.velocity(d)] -= 2.0 * vn * n[d];
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "symmetry"
    }
}

// =============================================================================
// Farfield outlet
// =============================================================================

/// Characteristic far-field outlet with prescribed back pressure.
///
/// Subsonic faces impose the far-field pressure on every material and
/// recompute the material energies from it; supersonic faces extrapolate.
#[derive(Clone, Copy, Debug)]
pub struct Farfield {
    /// Back pressure.
    pub pressure: f64,
}

impl Farfield {
    /// Create with the given back pressure.
    pub fn new(pressure: f64) -> Self {
        Self { pressure }
    }
}

impl MultiMatBoundaryCondition for Farfield {
    fn ghost_state(&self, ctx: &BCContext, ghost: &mut [f64]) -> Result<()> {
        let l = &ctx.layout;
        ghost.copy_from_slice(ctx.interior);

        let vn = ctx.interior_normal_velocity();
        let a = ctx.interior_sound_speed()?;
        if vn.abs() >= a {
            return Ok(());
        }

        let vel = ctx.interior_velocity();
        for k in 0..l.nmat() {
            let alpha = ghost[l.volfrac(k)];
            let rho = ghost[l.density(k)] / alpha;
            let g = inverse_deformation(l, ctx.materials, ghost, k);
            ghost[l.energy(k)] =
                alpha * ctx.materials.total_energy(k, rho, &vel, self.pressure, g.as_ref())?;
            ghost[l.ncomp() + l.pressure(k)] = alpha * self.pressure;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "farfield"
    }
}

// =============================================================================
// Extrapolation
// =============================================================================

/// Zero-gradient outflow: the ghost state equals the interior state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Extrapolation;

impl MultiMatBoundaryCondition for Extrapolation {
    fn ghost_state(&self, ctx: &BCContext, ghost: &mut [f64]) -> Result<()> {
        ghost.copy_from_slice(ctx.interior);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "extrapolate"
    }
}
