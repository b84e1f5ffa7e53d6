//! Symmetric quadrature rules on the reference triangle
//! `{x, y >= 0, x + y <= 1}` and the mapping of face points into the
//! reference coordinates of an adjacent tetrahedron.

use super::TriRule;
use crate::basis::jacobian_det;
use crate::types::Vec3;

const THIRD: f64 = 1.0 / 3.0;

/// Centroid rule, exact for linear polynomials.
pub const TRI_1: TriRule = TriRule {
    points: &[[THIRD, THIRD]],
    weights: &[1.0],
};

const SIXTH: f64 = 1.0 / 6.0;

/// Three-point rule, exact for quadratic polynomials.
pub const TRI_3: TriRule = TriRule {
    points: &[[SIXTH, SIXTH], [2.0 / 3.0, SIXTH], [SIXTH, 2.0 / 3.0]],
    weights: &[THIRD, THIRD, THIRD],
};

const DA: f64 = 0.445_948_490_915_965;
const DWA: f64 = 0.223_381_589_678_011;
const DB: f64 = 0.091_576_213_509_771;
const DWB: f64 = 0.109_951_743_655_322;

/// Six-point Dunavant rule, exact for polynomials of degree 4.
pub const TRI_6: TriRule = TriRule {
    points: &[
        [DA, DA],
        [1.0 - 2.0 * DA, DA],
        [DA, 1.0 - 2.0 * DA],
        [DB, DB],
        [1.0 - 2.0 * DB, DB],
        [DB, 1.0 - 2.0 * DB],
    ],
    weights: &[DWA, DWA, DWA, DWB, DWB, DWB],
};

/// Physical location of a reference-triangle point on the face `verts`.
#[inline]
pub fn face_point(verts: &[Vec3; 3], xi: &[f64; 2]) -> Vec3 {
    let n0 = 1.0 - xi[0] - xi[1];
    let mut x = [0.0; 3];
    for (d, xd) in x.iter_mut().enumerate() {
        *xd = n0 * verts[0][d] + xi[0] * verts[1][d] + xi[1] * verts[2][d];
    }
    x
}

/// Reference coordinates, in the tetrahedron `tet`, of the physical point
/// `x`, computed as ratios of sub-tetrahedron determinants.
#[inline]
pub fn face_point_to_reference(tet: &[Vec3; 4], x: &Vec3) -> Vec3 {
    let det = jacobian_det(&tet[0], &tet[1], &tet[2], &tet[3]);
    [
        jacobian_det(&tet[0], x, &tet[2], &tet[3]) / det,
        jacobian_det(&tet[0], &tet[1], x, &tet[3]) / det,
        jacobian_det(&tet[0], &tet[1], &tet[2], x) / det,
    ]
}
