//! First-derivative extrema at partition-boundary vertices.
//!
//! When the mesh is partitioned, the vertex patch of a boundary vertex is
//! split across ranks. The communication layer gathers, per shared vertex,
//! the maximum and minimum of each variable's first derivatives over the
//! remote part of the patch; the quadratic vertex-based limiter folds them
//! into its bounds.

use std::collections::HashMap;

use crate::error::{MultiMatError, Result};

/// Per-vertex extrema of first derivatives, laid out as `var * 3 + dir`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodalExtrema {
    nvar: usize,
    entries: HashMap<usize, (Vec<f64>, Vec<f64>)>,
}

impl NodalExtrema {
    /// Empty halo data for `nvar` variables.
    pub fn new(nvar: usize) -> Self {
        Self {
            nvar,
            entries: HashMap::new(),
        }
    }

    /// Number of variables per vertex.
    #[inline]
    pub fn nvar(&self) -> usize {
        self.nvar
    }

    /// Number of vertices with halo data.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no vertex has halo data.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record the remote maxima and minima at `point`.
    pub fn insert(&mut self, point: usize, max: Vec<f64>, min: Vec<f64>) -> Result<()> {
        let expected = 3 * self.nvar;
        if max.len() != expected {
            return Err(MultiMatError::dimension_mismatch("nodal extrema max", expected, max.len()));
        }
        if min.len() != expected {
            return Err(MultiMatError::dimension_mismatch("nodal extrema min", expected, min.len()));
        }
        self.entries.insert(point, (max, min));
        Ok(())
    }

    /// Remote maxima and minima at `point`, if any.
    pub fn get(&self, point: usize) -> Option<(&[f64], &[f64])> {
        self.entries
            .get(&point)
            .map(|(max, min)| (max.as_slice(), min.as_slice()))
    }
}
