//! Variable ordering of the conserved and primitive arrays.

use crate::eos::Materials;

/// Index helpers for the multi-material variable layout.
///
/// Conserved variables, in order:
/// `α_k` (nmat), `α_k ρ_k` (nmat), `ρu` (3), `α_k ρ_k E_k` (nmat), and a
/// row-major 3x3 inverse deformation gradient per solid.
///
/// Primitive variables: `α_k p_k` (nmat), `u` (3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableLayout {
    nmat: usize,
    nsolid: usize,
}

impl VariableLayout {
    /// Layout for `nmat` materials of which `nsolid` are solids.
    pub fn new(nmat: usize, nsolid: usize) -> Self {
        Self { nmat, nsolid }
    }

    /// Layout of a material block.
    pub fn of(materials: &Materials) -> Self {
        Self::new(materials.nmat(), materials.nsolid())
    }

    /// Number of materials.
    #[inline]
    pub fn nmat(&self) -> usize {
        self.nmat
    }

    /// Number of solid materials.
    #[inline]
    pub fn nsolid(&self) -> usize {
        self.nsolid
    }

    /// Number of conserved variables.
    #[inline]
    pub fn ncomp(&self) -> usize {
        3 * self.nmat + 3 + 9 * self.nsolid
    }

    /// Number of primitive variables.
    #[inline]
    pub fn nprim(&self) -> usize {
        self.nmat + 3
    }

    /// Volume fraction of material `k`.
    #[inline]
    pub fn volfrac(&self, k: usize) -> usize {
        k
    }

    /// Partial density of material `k`.
    #[inline]
    pub fn density(&self, k: usize) -> usize {
        self.nmat + k
    }

    /// Bulk momentum component `dir`.
    #[inline]
    pub fn momentum(&self, dir: usize) -> usize {
        2 * self.nmat + dir
    }

    /// Partial total energy of material `k`.
    #[inline]
    pub fn energy(&self, k: usize) -> usize {
        2 * self.nmat + 3 + k
    }

    /// Entry `(i, j)` of the inverse deformation gradient of solid slot `s`.
    #[inline]
    pub fn deform(&self, s: usize, i: usize, j: usize) -> usize {
        3 * self.nmat + 3 + 9 * s + 3 * i + j
    }

    /// Partial pressure of material `k` in the primitive array.
    #[inline]
    pub fn pressure(&self, k: usize) -> usize {
        k
    }

    /// Velocity component `dir` in the primitive array.
    #[inline]
    pub fn velocity(&self, dir: usize) -> usize {
        self.nmat + dir
    }
}
