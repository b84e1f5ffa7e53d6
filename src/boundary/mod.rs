//! Boundary conditions for the multi-material system.
//!
//! Boundary conditions compute the ghost state outside the domain for flux
//! evaluation at boundary faces.
//!
//! | BC Type | Description |
//! |---------|-------------|
//! | `Dirichlet` | Prescribed conserved state, primitives from the EOS |
//! | `Symmetry` | Slip wall, normal velocity reversed |
//! | `Farfield` | Subsonic back pressure, supersonic extrapolation |
//! | `Extrapolation` | Zero gradient |
//!
//! [`SidesetBoundaries`] routes each boundary face to the condition of its
//! side set.

mod multimat_bc;
mod sideset_bc;

pub use multimat_bc::{
    BCContext, Dirichlet, Extrapolation, Farfield, MultiMatBoundaryCondition, StateFn, Symmetry,
};
pub use sideset_bc::SidesetBoundaries;
