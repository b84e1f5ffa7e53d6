//! Polynomial bases on the tetrahedron.
//!
//! This module provides:
//! - the hierarchical orthogonal Dubiner basis (P0, P1, P2) and its
//!   reference/physical derivatives
//! - the diagonal Dubiner mass matrix
//! - a centroid-anchored Taylor basis with exact transforms to and from the
//!   Dubiner basis, in physical and reference frames
//! - Jacobian helpers for affine tetrahedra

mod dubiner;
mod taylor;

pub use dubiner::{
    BasisGradients, BasisValues, D2B_DXI2, MAX_NDOF, REF_CENTROID, eval_basis, eval_basis_at,
    eval_d2bdx2, eval_dbdx, eval_dbdx_p1, eval_dbdx_p2, eval_dbdxi, mass_matrix_dubiner,
};
pub use taylor::{REF_VERTICES, TaylorFrame, frame_volume};

use crate::error::{MultiMatError, Result};
use crate::types::{Tensor3, Vec3};

/// Polynomial order (0, 1 or 2) for a number of degrees of freedom.
pub fn order_of(ndof: usize) -> Result<usize> {
    match ndof {
        1 => Ok(0),
        4 => Ok(1),
        10 => Ok(2),
        _ => Err(MultiMatError::InvalidOrder { ndof }),
    }
}

/// Determinant of the affine map of the tetrahedron `(a, b, c, d)`,
/// i.e. six times its signed volume.
#[inline]
pub fn jacobian_det(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> f64 {
    let ba = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let ca = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let da = [d[0] - a[0], d[1] - a[1], d[2] - a[2]];
    ba[0] * (ca[1] * da[2] - ca[2] * da[1]) - ca[0] * (ba[1] * da[2] - ba[2] * da[1])
        + da[0] * (ba[1] * ca[2] - ba[2] * ca[1])
}

/// Inverse Jacobian `d xi_k / d x_i` of an affine tetrahedron.
///
/// Returns `None` for a degenerate (zero-volume) element.
pub fn inverse_jacobian(v: &[Vec3; 4]) -> Option<Tensor3> {
    // J[i][k] = d x_i / d xi_k
    let mut j = [[0.0; 3]; 3];
    for i in 0..3 {
        for k in 0..3 {
            j[i][k] = v[k + 1][i] - v[0][i];
        }
    }
    let det = j[0][0] * (j[1][1] * j[2][2] - j[1][2] * j[2][1])
        - j[0][1] * (j[1][0] * j[2][2] - j[1][2] * j[2][0])
        + j[0][2] * (j[1][0] * j[2][1] - j[1][1] * j[2][0]);
    if det.abs() < f64::MIN_POSITIVE {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (j[1][1] * j[2][2] - j[1][2] * j[2][1]) * inv_det,
            (j[0][2] * j[2][1] - j[0][1] * j[2][2]) * inv_det,
            (j[0][1] * j[1][2] - j[0][2] * j[1][1]) * inv_det,
        ],
        [
            (j[1][2] * j[2][0] - j[1][0] * j[2][2]) * inv_det,
            (j[0][0] * j[2][2] - j[0][2] * j[2][0]) * inv_det,
            (j[0][2] * j[1][0] - j[0][0] * j[1][2]) * inv_det,
        ],
        [
            (j[1][0] * j[2][1] - j[1][1] * j[2][0]) * inv_det,
            (j[0][1] * j[2][0] - j[0][0] * j[2][1]) * inv_det,
            (j[0][0] * j[1][1] - j[0][1] * j[1][0]) * inv_det,
        ],
    ])
}

/// Solve a 3x3 system `a x = b` by Cramer's rule.
///
/// Returns `None` when the determinant vanishes.
pub fn cramer(a: &Tensor3, b: &Vec3) -> Option<Vec3> {
    let det3 = |m: &Tensor3| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let det = det3(a);
    if det.abs() < 1e-300 || !det.is_finite() {
        return None;
    }
    let mut x = [0.0; 3];
    for (col, xc) in x.iter_mut().enumerate() {
        let mut m = *a;
        for row in 0..3 {
            m[row][col] = b[row];
        }
        *xc = det3(&m) / det;
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-13;

    #[test]
    fn test_inverse_jacobian() {
        let v = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 0.0, 0.5],
        ];
        let ji = inverse_jacobian(&v).unwrap();
        assert!((ji[0][0] - 0.5).abs() < TOL);
        assert!((ji[1][1] - 0.25).abs() < TOL);
        assert!((ji[2][2] - 2.0).abs() < TOL);
        assert!(ji[0][1].abs() < TOL);
    }

    #[test]
    fn test_degenerate_jacobian() {
        let v = [[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        assert!(inverse_jacobian(&v).is_none());
    }

    #[test]
    fn test_cramer() {
        let a = [[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let x_true = [1.0, -2.0, 3.0];
        let b = [
            a[0][0] * x_true[0] + a[0][1] * x_true[1] + a[0][2] * x_true[2],
            a[1][0] * x_true[0] + a[1][1] * x_true[1] + a[1][2] * x_true[2],
            a[2][0] * x_true[0] + a[2][1] * x_true[1] + a[2][2] * x_true[2],
        ];
        let x = cramer(&a, &b).unwrap();
        for i in 0..3 {
            assert!((x[i] - x_true[i]).abs() < TOL);
        }
        assert!(cramer(&[[0.0; 3]; 3], &b).is_none());
    }

    #[test]
    fn test_order_of() {
        assert_eq!(order_of(1).unwrap(), 0);
        assert_eq!(order_of(4).unwrap(), 1);
        assert_eq!(order_of(10).unwrap(), 2);
        assert!(order_of(6).is_err());
    }
}
