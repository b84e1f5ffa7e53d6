//! Realizability cleanup run between limiting and the residual.
//!
//! - [`clean_trace`]: reset trace and negative materials, close the volume
//!   fractions and report negative partial densities
//! - [`correct_limited_conserved`]: re-project the high-order energy and
//!   momentum dofs from the limited primitives
//! - [`update_interface_cells`]: drop high-order dofs in interface cells
//!   when interface sharpening is on

mod conserved;
mod trace;

pub use conserved::{correct_limited_conserved, update_interface_cells};
pub use trace::clean_trace;

#[cfg(feature = "parallel")]
pub use conserved::correct_limited_conserved_parallel;
#[cfg(feature = "parallel")]
pub use trace::clean_trace_parallel;

/// Outcome of a trace cleanup pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CleanupReport {
    /// Elements in which at least one material was reset.
    pub cleaned: usize,
    /// Largest deviation of the volume-fraction sum from one before
    /// renormalization.
    pub max_renormalization: f64,
}

impl CleanupReport {
    fn merge(self, other: Self) -> Self {
        Self {
            cleaned: self.cleaned + other.cleaned,
            max_renormalization: self.max_renormalization.max(other.max_renormalization),
        }
    }
}
