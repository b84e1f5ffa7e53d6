//! Error types for the multi-material discretization.
//!
//! Three families of failure exist:
//! - precondition violations (bad order, mismatched sizes, invalid config),
//!   which indicate a wiring defect in the caller;
//! - numerical divergence (a non-finite EOS output), reported with the
//!   material id, the offending state and, once known, the element;
//! - realizability violations (negative partial density after cleanup).
//!
//! Expected conditions such as absent neighbors or trace materials are
//! handled by explicit branches and never surface here.

use std::fmt;

use thiserror::Error;

use crate::types::ElementIndex;

/// Where in the mesh a numerical failure happened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementLocation {
    /// Element index.
    pub element: ElementIndex,
    /// Element centroid.
    pub centroid: [f64; 3],
}

impl fmt::Display for ElementLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at ({:.6e}, {:.6e}, {:.6e})",
            self.element, self.centroid[0], self.centroid[1], self.centroid[2]
        )
    }
}

/// Optional location wrapper so `Display` can print "unknown element".
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MaybeLocation(pub Option<ElementLocation>);

impl fmt::Display for MaybeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(loc) => write!(f, "{loc}"),
            None => write!(f, "unknown element"),
        }
    }
}

/// Snapshot of the material state that produced a failure.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MaterialState {
    /// Volume fraction.
    pub alpha: f64,
    /// Partial density (alpha * rho).
    pub partial_density: f64,
    /// Partial pressure or partial energy, depending on the quantity.
    pub partial_energy_or_pressure: f64,
    /// Bulk velocity.
    pub velocity: [f64; 3],
}

impl fmt::Display for MaterialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alpha={:.6e}, alpha*rho={:.6e}, alpha*(E|p)={:.6e}, u=({:.6e}, {:.6e}, {:.6e})",
            self.alpha,
            self.partial_density,
            self.partial_energy_or_pressure,
            self.velocity[0],
            self.velocity[1],
            self.velocity[2]
        )
    }
}

/// Errors raised by the discretization core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MultiMatError {
    /// Number of degrees of freedom is not 1, 4 or 10.
    #[error("Invalid polynomial order: ndof = {ndof} (expected 1, 4 or 10)")]
    InvalidOrder { ndof: usize },

    /// Array sizes do not agree.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An equation-of-state evaluation produced NaN or infinity.
    #[error("Non-finite {quantity} = {value} for material {material} ({state}) in {location}")]
    NonFinite {
        material: usize,
        quantity: &'static str,
        value: f64,
        state: MaterialState,
        location: MaybeLocation,
    },

    /// Partial density is negative after cleanup.
    #[error(
        "Negative partial density for material {material} in {location}: {state}, \
         majority pressure {major_pressure:.6e}, majority temperature {major_temperature:.6e}"
    )]
    NegativeDensity {
        material: usize,
        location: ElementLocation,
        state: MaterialState,
        major_pressure: f64,
        major_temperature: f64,
    },
}

impl MultiMatError {
    /// Create a non-finite EOS error without a location.
    pub fn non_finite(
        material: usize,
        quantity: &'static str,
        value: f64,
        state: MaterialState,
    ) -> Self {
        Self::NonFinite {
            material,
            quantity,
            value,
            state,
            location: MaybeLocation(None),
        }
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a negative partial density error.
    pub fn negative_density(
        material: usize,
        location: ElementLocation,
        state: MaterialState,
        major_pressure: f64,
        major_temperature: f64,
    ) -> Self {
        Self::NegativeDensity {
            material,
            location,
            state,
            major_pressure,
            major_temperature,
        }
    }

    /// Attach an element location to a non-finite error.
    ///
    /// Other variants are returned unchanged.
    pub fn at_element(self, element: ElementIndex, centroid: [f64; 3]) -> Self {
        match self {
            Self::NonFinite {
                material,
                quantity,
                value,
                state,
                location: MaybeLocation(None),
            } => Self::NonFinite {
                material,
                quantity,
                value,
                state,
                location: MaybeLocation(Some(ElementLocation { element, centroid })),
            },
            other => other,
        }
    }

    /// Set the material id of a non-finite error raised by a bare EOS.
    pub fn for_material(self, k: usize) -> Self {
        match self {
            Self::NonFinite {
                quantity,
                value,
                state,
                location,
                ..
            } => Self::NonFinite {
                material: k,
                quantity,
                value,
                state,
                location,
            },
            other => other,
        }
    }

    /// Whether this error is a realizability failure the driver may retry.
    pub fn is_realizability(&self) -> bool {
        matches!(self, Self::NegativeDensity { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MultiMatError>;

/// Return `value` if finite, otherwise a [`MultiMatError::NonFinite`].
#[inline]
pub(crate) fn check_finite(
    value: f64,
    material: usize,
    quantity: &'static str,
    state: impl FnOnce() -> MaterialState,
) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MultiMatError::non_finite(material, quantity, value, state()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_element_attaches_location() {
        let err = MultiMatError::non_finite(1, "pressure", f64::NAN, MaterialState::default());
        let err = err.at_element(ElementIndex::new(7), [0.1, 0.2, 0.3]);
        match &err {
            MultiMatError::NonFinite { location, .. } => {
                let loc = location.0.expect("location attached");
                assert_eq!(loc.element.get(), 7);
            }
            _ => panic!("wrong variant"),
        }
        let msg = err.to_string();
        assert!(msg.contains("material 1"));
        assert!(msg.contains("E7"));
    }

    #[test]
    fn test_check_finite() {
        assert!(check_finite(1.0, 0, "pressure", MaterialState::default).is_ok());
        let err = check_finite(f64::INFINITY, 2, "sound speed", MaterialState::default);
        assert!(matches!(
            err,
            Err(MultiMatError::NonFinite { material: 2, .. })
        ));
    }

    #[test]
    fn test_realizability_flag() {
        let err = MultiMatError::NegativeDensity {
            material: 0,
            location: ElementLocation {
                element: ElementIndex::new(0),
                centroid: [0.0; 3],
            },
            state: MaterialState::default(),
            major_pressure: 1.0,
            major_temperature: 300.0,
        };
        assert!(err.is_realizability());
        assert!(!MultiMatError::InvalidOrder { ndof: 3 }.is_realizability());
    }
}
