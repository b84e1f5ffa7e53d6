//! Flat per-element storage of polynomial degrees of freedom.

use crate::error::{MultiMatError, Result};

/// Degrees of freedom of `nvar` variables on every element.
///
/// Stored element-major: `data[e * nvar * ndof + var * ndof + dof]`, so all
/// modes of one variable are contiguous and one element is a single slice.
#[derive(Clone, Debug, PartialEq)]
pub struct Fields {
    data: Vec<f64>,
    nelem: usize,
    nvar: usize,
    ndof: usize,
}

impl Fields {
    /// Zero-initialized storage.
    pub fn new(nelem: usize, nvar: usize, ndof: usize) -> Self {
        Self {
            data: vec![0.0; nelem * nvar * ndof],
            nelem,
            nvar,
            ndof,
        }
    }

    /// Wrap existing data in element-major layout.
    pub fn from_data(data: Vec<f64>, nelem: usize, nvar: usize, ndof: usize) -> Result<Self> {
        let expected = nelem * nvar * ndof;
        if data.len() != expected {
            return Err(MultiMatError::dimension_mismatch(
                "Fields::from_data",
                expected,
                data.len(),
            ));
        }
        Ok(Self {
            data,
            nelem,
            nvar,
            ndof,
        })
    }

    /// Number of elements.
    #[inline(always)]
    pub fn nelem(&self) -> usize {
        self.nelem
    }

    /// Number of variables.
    #[inline(always)]
    pub fn nvar(&self) -> usize {
        self.nvar
    }

    /// Degrees of freedom per variable.
    #[inline(always)]
    pub fn ndof(&self) -> usize {
        self.ndof
    }

    #[inline(always)]
    fn offset(&self, e: usize, var: usize, dof: usize) -> usize {
        (e * self.nvar + var) * self.ndof + dof
    }

    /// Read one degree of freedom.
    #[inline(always)]
    pub fn get(&self, e: usize, var: usize, dof: usize) -> f64 {
        self.data[self.offset(e, var, dof)]
    }

    /// Write one degree of freedom.
    #[inline(always)]
    pub fn set(&mut self, e: usize, var: usize, dof: usize, value: f64) {
        let i = self.offset(e, var, dof);
        self.data[i] = value;
    }

    /// Add to one degree of freedom.
    #[inline(always)]
    pub fn add(&mut self, e: usize, var: usize, dof: usize, value: f64) {
        let i = self.offset(e, var, dof);
        self.data[i] += value;
    }

    /// Scale one degree of freedom.
    #[inline(always)]
    pub fn scale(&mut self, e: usize, var: usize, dof: usize, factor: f64) {
        let i = self.offset(e, var, dof);
        self.data[i] *= factor;
    }

    /// All modes of one variable on one element.
    #[inline(always)]
    pub fn modes(&self, e: usize, var: usize) -> &[f64] {
        let start = self.offset(e, var, 0);
        &self.data[start..start + self.ndof]
    }

    /// Mutable modes of one variable on one element.
    #[inline(always)]
    pub fn modes_mut(&mut self, e: usize, var: usize) -> &mut [f64] {
        let start = self.offset(e, var, 0);
        let ndof = self.ndof;
        &mut self.data[start..start + ndof]
    }

    /// All variables of one element.
    #[inline(always)]
    pub fn element(&self, e: usize) -> &[f64] {
        let n = self.nvar * self.ndof;
        &self.data[e * n..(e + 1) * n]
    }

    /// Mutable variables of one element.
    #[inline(always)]
    pub fn element_mut(&mut self, e: usize) -> &mut [f64] {
        let n = self.nvar * self.ndof;
        &mut self.data[e * n..(e + 1) * n]
    }

    /// Per-element mutable chunks, for element-parallel passes.
    pub fn elements_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        let n = (self.nvar * self.ndof).max(1);
        self.data.chunks_exact_mut(n)
    }

    /// Number of entries per element.
    #[inline(always)]
    pub fn element_len(&self) -> usize {
        self.nvar * self.ndof
    }

    /// Raw data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw data.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Fill every entry with `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Zero the modes `from..ndof` of every variable on element `e`.
    pub fn truncate_element(&mut self, e: usize, from: usize) {
        let from = from.min(self.ndof);
        for var in 0..self.nvar {
            for m in &mut self.modes_mut(e, var)[from..] {
                *m = 0.0;
            }
        }
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().map(|x| x.abs()).fold(0.0, f64::max)
    }

    /// Copy the first `min(ndof)` modes of every variable from `other`.
    pub fn copy_modes_from(&mut self, other: &Fields) -> Result<()> {
        if other.nelem != self.nelem || other.nvar != self.nvar {
            return Err(MultiMatError::dimension_mismatch(
                "Fields::copy_modes_from",
                self.nelem * self.nvar,
                other.nelem * other.nvar,
            ));
        }
        let n = self.ndof.min(other.ndof);
        for e in 0..self.nelem {
            for var in 0..self.nvar {
                self.modes_mut(e, var)[..n].copy_from_slice(&other.modes(e, var)[..n]);
            }
        }
        Ok(())
    }
}
