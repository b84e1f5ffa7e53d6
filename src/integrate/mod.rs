//! Residual assembly for the multi-material system.
//!
//! The weak-form residual `R` is accumulated in this order:
//!
//! 1. zero
//! 2. interior faces ([`interior_surface_integral`])
//! 3. volume flux ([`volume_integral`])
//! 4. boundary faces ([`boundary_surface_integral`])
//! 5. Riemann derivatives divided by the element volume
//! 6. non-conservative terms ([`non_conservative_integral`])
//! 7. finite-rate pressure relaxation ([`pressure_relaxation_integral`])
//!
//! Face integrals also collect the [`RiemannDerivatives`] consumed by the
//! non-conservative terms, so step 6 must follow steps 2 and 4.
//!
//! `R` is not multiplied by the inverse mass matrix; see
//! [`crate::basis::mass_matrix_dubiner`].

mod nonconservative;
mod relaxation;
mod surface;
mod volume;

pub use nonconservative::non_conservative_integral;
pub use relaxation::pressure_relaxation_integral;
pub use surface::{boundary_surface_integral, interior_surface_integral};
pub use volume::volume_integral;

#[cfg(feature = "parallel")]
pub use relaxation::pressure_relaxation_integral_parallel;
#[cfg(feature = "parallel")]
pub use surface::{boundary_surface_integral_parallel, interior_surface_integral_parallel};
#[cfg(feature = "parallel")]
pub use nonconservative::non_conservative_integral_parallel;
#[cfg(feature = "parallel")]
pub use volume::volume_integral_parallel;

use tracing::debug;

use crate::boundary::SidesetBoundaries;
use crate::config::RelaxationConfig;
use crate::eos::Materials;
use crate::error::{MultiMatError, Result};
use crate::flux::RiemannFlux;
use crate::mesh::TetMesh;
use crate::state::{Fields, VariableLayout};
use crate::types::Vec3;

/// Everything residual assembly reads besides the solution.
#[derive(Clone, Copy)]
pub struct ResidualContext<'a> {
    /// Mesh.
    pub mesh: &'a TetMesh,
    /// Material closures.
    pub materials: &'a Materials,
    /// Variable layout.
    pub layout: VariableLayout,
    /// Numerical flux at faces.
    pub flux: &'a dyn RiemannFlux,
    /// Ghost states at boundary faces.
    pub boundaries: &'a SidesetBoundaries,
    /// Finite-rate pressure relaxation.
    pub relaxation: RelaxationConfig,
    /// Physical time of the stage.
    pub time: f64,
}

impl std::fmt::Debug for ResidualContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResidualContext")
            .field("n_elements", &self.mesh.n_elements())
            .field("nmat", &self.layout.nmat())
            .field("flux", &self.flux.name())
            .field("relaxation", &self.relaxation)
            .field("time", &self.time)
            .finish()
    }
}

/// Face-accumulated data of the non-conservative terms, per element:
///
/// - `Σ_f ∫ (α p)*_k n dA / V` for every material (3 components each)
/// - `Σ_f ∫ v* B_i dA / V` for every stored dof `i`
///
/// where `(α p)*_k` and `v*` are the Riemann partial pressures and normal
/// velocity returned by the flux.
#[derive(Clone, Debug, PartialEq)]
pub struct RiemannDerivatives {
    nmat: usize,
    ndof: usize,
    data: Vec<f64>,
}

impl RiemannDerivatives {
    /// Zeroed storage for `nelem` elements.
    pub fn new(nelem: usize, nmat: usize, ndof: usize) -> Self {
        Self {
            nmat,
            ndof,
            data: vec![0.0; nelem * (3 * nmat + ndof)],
        }
    }

    /// Values stored per element.
    #[inline(always)]
    pub fn element_len(&self) -> usize {
        3 * self.nmat + self.ndof
    }

    /// Number of elements.
    pub fn nelem(&self) -> usize {
        self.data.len() / self.element_len()
    }

    /// Riemann partial-pressure gradient of material `k` in element `e`.
    #[inline]
    pub fn pressure_gradient(&self, e: usize, k: usize) -> Vec3 {
        let s = &self.element(e)[3 * k..3 * k + 3];
        [s[0], s[1], s[2]]
    }

    /// Riemann velocity moment `∫ v* B_dof dA / V` of element `e`.
    #[inline]
    pub fn velocity_moment(&self, e: usize, dof: usize) -> f64 {
        self.element(e)[3 * self.nmat + dof]
    }

    /// All values of element `e`.
    #[inline]
    pub fn element(&self, e: usize) -> &[f64] {
        let n = self.element_len();
        &self.data[e * n..(e + 1) * n]
    }

    /// Mutable values of element `e`.
    #[inline]
    pub fn element_mut(&mut self, e: usize) -> &mut [f64] {
        let n = self.element_len();
        &mut self.data[e * n..(e + 1) * n]
    }

    /// Divide every element's values by its volume.
    pub fn divide_by_volume(&mut self, volume: &[f64]) {
        let n = self.element_len();
        for (d, v) in self.data.chunks_exact_mut(n).zip(volume) {
            for x in d.iter_mut() {
                *x /= v;
            }
        }
    }
}

pub(crate) fn check_residual_arrays(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &Fields,
) -> Result<()> {
    let l = &ctx.layout;
    let n = ctx.mesh.n_elements();
    let checks = [
        ("residual conserved variables", l.ncomp(), u.nvar()),
        ("residual primitive variables", l.nprim(), p.nvar()),
        ("residual variables", l.ncomp(), r.nvar()),
        ("residual conserved elements", n, u.nelem()),
        ("residual primitive elements", n, p.nelem()),
        ("residual elements", n, r.nelem()),
        ("residual primitive dofs", u.ndof(), p.ndof()),
    ];
    for (context, expected, actual) in checks {
        if expected != actual {
            return Err(MultiMatError::dimension_mismatch(context, expected, actual));
        }
    }
    if r.ndof() > u.ndof() {
        return Err(MultiMatError::dimension_mismatch(
            "residual dofs exceed solution dofs",
            u.ndof(),
            r.ndof(),
        ));
    }
    Ok(())
}

/// Assemble the residual `r` of the reconstructed and limited solution
/// `u`/`p`.
///
/// `u` and `p` carry the reconstructed number of dofs, `r` the stored
/// number; the two differ for P0P1.
pub fn compute_residual(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
) -> Result<()> {
    check_residual_arrays(ctx, u, p, r)?;
    let mesh = ctx.mesh;
    r.fill(0.0);
    let mut derivs = RiemannDerivatives::new(mesh.n_elements(), ctx.layout.nmat(), r.ndof());

    interior_surface_integral(ctx, u, p, r, &mut derivs)?;
    volume_integral(ctx, u, p, r)?;
    boundary_surface_integral(ctx, u, p, r, &mut derivs)?;
    derivs.divide_by_volume(&mesh.volume);
    non_conservative_integral(ctx, u, p, &derivs, r)?;
    if ctx.relaxation.enabled {
        pressure_relaxation_integral(ctx, u, p, r)?;
    }

    debug!(
        elements = mesh.n_elements(),
        ndof = r.ndof(),
        flux = ctx.flux.name(),
        relaxation = ctx.relaxation.enabled,
        "assembled residual"
    );
    Ok(())
}

/// Parallel [`compute_residual`].
///
/// Face integrals are computed per face into face-owned buffers and merged
/// in face order; volume terms are element-parallel. The result matches
/// the serial residual to the last bit.
#[cfg(feature = "parallel")]
pub fn compute_residual_parallel(
    ctx: &ResidualContext,
    u: &Fields,
    p: &Fields,
    r: &mut Fields,
) -> Result<()> {
    check_residual_arrays(ctx, u, p, r)?;
    let mesh = ctx.mesh;
    r.fill(0.0);
    let mut derivs = RiemannDerivatives::new(mesh.n_elements(), ctx.layout.nmat(), r.ndof());

    interior_surface_integral_parallel(ctx, u, p, r, &mut derivs)?;
    volume_integral_parallel(ctx, u, p, r)?;
    boundary_surface_integral_parallel(ctx, u, p, r, &mut derivs)?;
    derivs.divide_by_volume(&mesh.volume);
    non_conservative_integral_parallel(ctx, u, p, &derivs, r)?;
    if ctx.relaxation.enabled {
        pressure_relaxation_integral_parallel(ctx, u, p, r)?;
    }

    debug!(
        elements = mesh.n_elements(),
        ndof = r.ndof(),
        flux = ctx.flux.name(),
        relaxation = ctx.relaxation.enabled,
        "assembled residual (parallel)"
    );
    Ok(())
}
