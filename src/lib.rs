//! # multimat-dg
//!
//! Spatial discretization of the multi-material compressible Euler equations
//! on unstructured tetrahedral meshes, with discontinuous Galerkin (P1, P2)
//! and reconstructed finite-volume (P0, P0P1) schemes.
//!
//! Every stage an explicit time integrator asks for a residual and a stable
//! time step; this crate provides the pipeline in between:
//! - Dubiner and Taylor bases, tetrahedron and triangle quadrature
//! - Material closures (stiffened gas, JWL, small-shear solid)
//! - Least-squares reconstruction of linear dofs
//! - Slope limiters (Superbee, WENO, vertex-based) with bound-preserving,
//!   positivity and interface-consistency passes
//! - Lax-Friedrichs fluxes for fluids and solids
//! - Surface, volume, non-conservative and pressure-relaxation integrals
//! - Trace-material cleanup and the CFL time-step estimate
//!
//! [`Discretization`] ties the stages together.

pub mod basis;
pub mod boundary;
pub mod cleanup;
pub mod config;
pub mod discretization;
pub mod eos;
pub mod error;
pub mod flux;
pub mod integrate;
pub mod limiter;
pub mod mesh;
pub mod quadrature;
pub mod reconstruction;
pub mod state;
pub mod timestep;
pub mod types;

// Re-export main types for convenience
pub use boundary::{
    BCContext, Dirichlet, Extrapolation, Farfield, MultiMatBoundaryCondition, SidesetBoundaries,
    StateFn, Symmetry,
};
pub use cleanup::{CleanupReport, clean_trace, correct_limited_conserved, update_interface_cells};
pub use config::{
    BoundaryConfig, BoundaryKind, CleanupThresholds, DiscretizationConfig, FluxKind, LimiterKind,
    LimiterThresholds, MaterialConfig, RelaxationConfig, Scheme, ShockDetector, StencilKind,
};
pub use discretization::{Discretization, StageReport};
pub use eos::{EquationOfState, Jwl, MaterialEos, Materials, SmallShearSolid, StiffenedGas};
pub use error::{MultiMatError, Result};
pub use flux::{LaxFriedrichs, LaxFriedrichsSolids, RiemannFlux, StandardFlux, create_flux};
pub use integrate::{ResidualContext, RiemannDerivatives, compute_residual};
pub use limiter::{Limiter, LimiterContext, LimiterReport, StandardLimiter, create_limiter};
pub use mesh::{BoxSide, NodalExtrema, TetMesh};
pub use state::{Fields, VariableLayout, project_primitives};
pub use timestep::{WaveSpeed, time_step};
pub use types::{ElementIndex, FaceIndex};

#[cfg(feature = "parallel")]
pub use cleanup::{clean_trace_parallel, correct_limited_conserved_parallel};
#[cfg(feature = "parallel")]
pub use integrate::compute_residual_parallel;
#[cfg(feature = "parallel")]
pub use timestep::time_step_parallel;
