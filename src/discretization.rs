//! Per-stage driver facade.
//!
//! [`Discretization`] owns everything that is fixed for a run (material
//! block, limiter, flux, boundary table, least-squares stencils) and exposes
//! the calls an explicit time integrator makes once per stage:
//!
//! 1. [`Discretization::prepare_stage`]: project primitives, reconstruct,
//!    limit, correct the conserved dofs and clean up trace materials;
//! 2. [`Discretization::residual`]: assemble the weak-form residual;
//! 3. [`Discretization::apply_inverse_mass`]: turn it into a rate;
//! 4. [`Discretization::time_step`]: stable step for the next update.

use tracing::{debug, info};

use crate::basis::mass_matrix_dubiner;
use crate::boundary::{SidesetBoundaries, StateFn};
use crate::cleanup::{
    CleanupReport, clean_trace, correct_limited_conserved, update_interface_cells,
};
use crate::config::{DiscretizationConfig, Scheme};
use crate::eos::Materials;
use crate::error::{MultiMatError, Result};
use crate::flux::{RiemannFlux, StandardFlux};
use crate::integrate::{ResidualContext, compute_residual};
use crate::limiter::{Limiter, LimiterContext, LimiterReport, StandardLimiter};
use crate::mesh::{NodalExtrema, TetMesh};
use crate::reconstruction::{
    LeastSquares, ReconstructedVariables, ReconstructionContext, reconstruct,
};
use crate::state::{Fields, VariableLayout, project_primitives};
use crate::timestep::time_step;

/// Summary of one [`Discretization::prepare_stage`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageReport {
    /// Elements whose least-squares stencil was empty or singular.
    pub singular_stencils: usize,
    /// Limiter outcome.
    pub limiter: LimiterReport,
    /// Interface cells reset to first order (interface sharpening only).
    pub interface_cells: usize,
    /// Trace cleanup outcome.
    pub cleanup: CleanupReport,
}

/// Nodal extrema of conserved and primitive first derivatives gathered from
/// other partitions.
#[derive(Clone, Debug)]
struct Halo {
    u: NodalExtrema,
    p: NodalExtrema,
}

/// Spatial discretization of the multi-material system on one mesh.
pub struct Discretization<'m> {
    mesh: &'m TetMesh,
    config: DiscretizationConfig,
    materials: Materials,
    layout: VariableLayout,
    flux: StandardFlux,
    limiter: StandardLimiter,
    boundaries: SidesetBoundaries,
    lsq: Option<LeastSquares>,
    halo: Option<Halo>,
}

impl std::fmt::Debug for Discretization<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discretization")
            .field("n_elements", &self.mesh.n_elements())
            .field("scheme", &self.config.scheme)
            .field("nmat", &self.layout.nmat())
            .field("flux", &self.flux.name())
            .field("limiter", &self.limiter.name())
            .field("boundaries", &self.boundaries)
            .finish()
    }
}

impl<'m> Discretization<'m> {
    /// Set up the discretization.
    ///
    /// The configuration is validated, boundary conditions are built from
    /// its side-set table (`dirichlet` supplies the state of `Dirichlet`
    /// side sets) and every boundary face must resolve to a condition.
    pub fn new(
        mesh: &'m TetMesh,
        config: DiscretizationConfig,
        dirichlet: Option<StateFn>,
    ) -> Result<Self> {
        let boundaries = SidesetBoundaries::from_config(&config, dirichlet)?;
        Self::with_boundaries(mesh, config, boundaries)
    }

    /// Set up the discretization with a hand-built boundary table.
    pub fn with_boundaries(
        mesh: &'m TetMesh,
        config: DiscretizationConfig,
        boundaries: SidesetBoundaries,
    ) -> Result<Self> {
        config.validate()?;
        boundaries.check_mesh(mesh)?;
        let materials = config.material_block()?;
        let layout = VariableLayout::of(&materials);
        let needs_lsq = config.scheme == Scheme::P0P1
            || (config.reconstruct_volume_fractions && config.rdof() > 1);
        let lsq = needs_lsq.then(|| LeastSquares::new(mesh, config.stencil));
        let flux = StandardFlux::from(config.flux);
        let limiter = StandardLimiter::from_config(&config);
        info!(
            elements = mesh.n_elements(),
            scheme = ?config.scheme,
            nmat = layout.nmat(),
            ncomp = layout.ncomp(),
            flux = flux.name(),
            limiter = limiter.name(),
            "initialized multi-material discretization"
        );
        Ok(Self {
            mesh,
            config,
            materials,
            layout,
            flux,
            limiter,
            boundaries,
            lsq,
            halo: None,
        })
    }

    /// Attach first-derivative nodal extrema from other partitions, used by
    /// the quadratic vertex-based limiter.
    pub fn set_halo(&mut self, u: NodalExtrema, p: NodalExtrema) -> Result<()> {
        if u.nvar() != self.layout.ncomp() || p.nvar() != self.layout.nprim() {
            return Err(MultiMatError::dimension_mismatch(
                "halo extrema",
                self.layout.ncomp() + self.layout.nprim(),
                u.nvar() + p.nvar(),
            ));
        }
        self.halo = Some(Halo { u, p });
        Ok(())
    }

    /// The mesh.
    pub fn mesh(&self) -> &TetMesh {
        self.mesh
    }

    /// The configuration.
    pub fn config(&self) -> &DiscretizationConfig {
        &self.config
    }

    /// The material block.
    pub fn materials(&self) -> &Materials {
        &self.materials
    }

    /// Variable layout.
    pub fn layout(&self) -> VariableLayout {
        self.layout
    }

    /// Zeroed conserved and primitive arrays with the reconstructed number
    /// of dofs.
    pub fn allocate(&self) -> (Fields, Fields) {
        let n = self.mesh.n_elements();
        let rdof = self.config.rdof();
        (
            Fields::new(n, self.layout.ncomp(), rdof),
            Fields::new(n, self.layout.nprim(), rdof),
        )
    }

    /// Zeroed residual array with the stored number of dofs.
    pub fn allocate_residual(&self) -> Fields {
        Fields::new(self.mesh.n_elements(), self.layout.ncomp(), self.config.ndof())
    }

    fn limiter_context(&self) -> LimiterContext<'_> {
        let ctx = LimiterContext::new(self.mesh, &self.materials, &self.config);
        match &self.halo {
            Some(h) => ctx.with_halo(&h.u, &h.p),
            None => ctx,
        }
    }

    /// Project the primitives from the stored modes of `u`.
    pub fn update_primitives(&self, u: &Fields, p: &mut Fields) -> Result<()> {
        project_primitives(self.mesh, &self.materials, self.config.ndof(), u, p)
    }

    /// Least-squares reconstruction of the linear dofs, if the scheme uses
    /// one. Returns the number of elements with a singular stencil.
    pub fn reconstruct(&self, time: f64, u: &mut Fields, p: &mut Fields) -> Result<usize> {
        let Some(lsq) = &self.lsq else {
            return Ok(0);
        };
        let which = if self.config.scheme == Scheme::P0P1 {
            ReconstructedVariables::All
        } else {
            ReconstructedVariables::VolumeFractions
        };
        let ctx = ReconstructionContext {
            mesh: self.mesh,
            materials: &self.materials,
            layout: self.layout,
            lsq,
            boundaries: &self.boundaries,
            time,
        };
        reconstruct(&ctx, which, u, p)
    }

    /// Limit `u` and `p` and re-project the high-order conserved dofs from
    /// the limited primitives.
    pub fn limit(&self, u: &mut Fields, p: &mut Fields) -> Result<LimiterReport> {
        let report = self.limiter.apply(&self.limiter_context(), u, p)?;
        if self.config.rdof() > 1 && self.limiter != StandardLimiter::None {
            correct_limited_conserved(self.mesh, &self.materials, p, u)?;
        }
        Ok(report)
    }

    /// Reset interface cells (interface sharpening) and clean up trace
    /// materials.
    pub fn cleanup(&self, u: &mut Fields, p: &mut Fields) -> Result<(usize, CleanupReport)> {
        let interface_cells = update_interface_cells(&self.config, &self.layout, u);
        let report = clean_trace(
            self.mesh,
            &self.materials,
            &self.config.cleanup_thresholds,
            u,
            p,
        )?;
        Ok((interface_cells, report))
    }

    /// Everything that happens to the solution before the residual:
    /// primitives, reconstruction, limiting and cleanup.
    pub fn prepare_stage(&self, time: f64, u: &mut Fields, p: &mut Fields) -> Result<StageReport> {
        self.update_primitives(u, p)?;
        let singular_stencils = self.reconstruct(time, u, p)?;
        let limiter = self.limit(u, p)?;
        let (interface_cells, cleanup) = self.cleanup(u, p)?;
        let report = StageReport {
            singular_stencils,
            limiter,
            interface_cells,
            cleanup,
        };
        debug!(
            time,
            limited = report.limiter.limited,
            shocked = report.limiter.n_shocked(),
            cleaned = report.cleanup.cleaned,
            "prepared stage"
        );
        Ok(report)
    }

    fn residual_context(&self, time: f64) -> ResidualContext<'_> {
        ResidualContext {
            mesh: self.mesh,
            materials: &self.materials,
            layout: self.layout,
            flux: &self.flux,
            boundaries: &self.boundaries,
            relaxation: self.config.relaxation,
            time,
        }
    }

    /// Weak-form residual of the prepared state.
    pub fn residual(&self, time: f64, u: &Fields, p: &Fields, r: &mut Fields) -> Result<()> {
        compute_residual(&self.residual_context(time), u, p, r)
    }

    /// Multiply the residual by the inverse of the (diagonal) mass matrix.
    pub fn apply_inverse_mass(&self, r: &mut Fields) {
        let ndof = r.ndof();
        for (e, re) in r.elements_mut().enumerate() {
            let mass = mass_matrix_dubiner(ndof, self.mesh.volume[e]);
            for modes in re.chunks_exact_mut(ndof) {
                for (m, l) in modes.iter_mut().zip(&mass) {
                    *m /= l;
                }
            }
        }
    }

    /// Stable time step for the prepared state.
    pub fn time_step(&self, u: &Fields, p: &Fields) -> Result<f64> {
        time_step(
            self.mesh,
            &self.materials,
            self.config.ndof(),
            self.config.cfl,
            u,
            p,
        )
    }
}

#[cfg(feature = "parallel")]
impl Discretization<'_> {
    /// Element-parallel [`Discretization::prepare_stage`].
    pub fn prepare_stage_parallel(
        &self,
        time: f64,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<StageReport> {
        use crate::cleanup::{clean_trace_parallel, correct_limited_conserved_parallel};

        self.update_primitives(u, p)?;
        let singular_stencils = self.reconstruct(time, u, p)?;
        let limiter = self.limiter.apply_parallel(&self.limiter_context(), u, p)?;
        if self.config.rdof() > 1 && self.limiter != StandardLimiter::None {
            correct_limited_conserved_parallel(self.mesh, &self.materials, p, u)?;
        }
        let interface_cells = update_interface_cells(&self.config, &self.layout, u);
        let cleanup = clean_trace_parallel(
            self.mesh,
            &self.materials,
            &self.config.cleanup_thresholds,
            u,
            p,
        )?;
        Ok(StageReport {
            singular_stencils,
            limiter,
            interface_cells,
            cleanup,
        })
    }

    /// Parallel [`Discretization::residual`].
    pub fn residual_parallel(
        &self,
        time: f64,
        u: &Fields,
        p: &Fields,
        r: &mut Fields,
    ) -> Result<()> {
        crate::integrate::compute_residual_parallel(&self.residual_context(time), u, p, r)
    }

    /// Parallel [`Discretization::time_step`].
    pub fn time_step_parallel(&self, u: &Fields, p: &Fields) -> Result<f64> {
        crate::timestep::time_step_parallel(
            self.mesh,
            &self.materials,
            self.config.ndof(),
            self.config.cfl,
            u,
            p,
        )
    }
}
