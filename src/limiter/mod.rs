//! Slope limiters for the multi-material DG/FV solution.
//!
//! Every limiter runs the same staged pipeline: a shock sensor selects
//! which elements are fully limited, the raw strategy limits the
//! high-order dofs, and a multi-material pass enforces volume-fraction
//! bounds, positivity and interface consistency.
//!
//! - [`Limiter`]: Trait for limiters of the multi-material system
//! - [`SuperbeeP1`], [`WenoP1`], [`VertexBased`]: Raw strategies
//! - [`StandardLimiter`]: Dispatch enum built from configuration
//! - [`mark_shocked`]: Shock sensors gating full limiting

mod engine;
mod factors;
mod multimat;
mod points;
mod shock;
mod standard;
mod superbee;
pub mod traits;
mod vertex_based;
mod weno;

// Traits
pub use traits::{BoxedLimiter, Limiter, LimiterContext, LimiterReport};

// Standard limiter types (enum, factory)
pub use standard::{
    NoLimiter, StandardLimiter, SuperbeeP1, VertexBased, WenoP1, create_limiter,
};

// Building blocks
pub use factors::ElementFactors;
pub use points::ReferencePoints;
pub use shock::{LimitedVariables, flux_jump, mark_shocked, spectral_decay};

pub(crate) use multimat::interface_indicator;
