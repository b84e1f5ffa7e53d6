//! Approximate Riemann solvers.
//!
//! # Flux Trait
//!
//! The [`RiemannFlux`] trait is the seam between the surface integrals and
//! the flux functions. Besides the conserved fluxes every solver returns the
//! Riemann-averaged partial pressures and the Riemann velocity, which the
//! non-conservative terms consume.
//!
//! ## Built-in Flux Types
//! - [`LaxFriedrichs`]: fluids with isotropic pressure
//! - [`LaxFriedrichsSolids`]: fluids and small-shear elastic solids
//! - [`StandardFlux`]: enum for dispatch without boxing
//!
//! [`physical_flux`] gives the analytical flux tensor used by the volume
//! integrals.

mod lax_friedrichs;
mod lax_friedrichs_solids;
mod physical;
pub mod traits;

pub use lax_friedrichs::LaxFriedrichs;
pub use lax_friedrichs_solids::LaxFriedrichsSolids;
pub use physical::physical_flux;
pub use traits::{BoxedFlux, FluxContext, RiemannFlux, StandardFlux, create_flux};
