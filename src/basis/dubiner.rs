//! Hierarchical orthogonal (Dubiner) basis on the reference tetrahedron.
//!
//! The basis is ordered by polynomial degree: one constant, three linear and
//! six quadratic functions. Every non-constant function has zero mean over
//! the element, so dof 0 is always the cell average, and the functions are
//! mutually orthogonal, giving a diagonal mass matrix.
//!
//! # References
//!
//! - Dubiner, M. (1991). Spectral methods on triangles and other domains.
//!   Journal of Scientific Computing, 6(4), 345-390.

use crate::types::{Tensor3, Vec3};

/// Maximum number of degrees of freedom per variable (quadratic order).
pub const MAX_NDOF: usize = 10;

/// Basis values at a point, padded to [`MAX_NDOF`].
pub type BasisValues = [f64; MAX_NDOF];

/// Basis gradients `[direction][dof]`, padded to [`MAX_NDOF`].
pub type BasisGradients = [[f64; MAX_NDOF]; 3];

/// Reference centroid of the tetrahedron.
pub const REF_CENTROID: Vec3 = [0.25, 0.25, 0.25];

/// Mass-matrix diagonal of the unit-volume reference element.
const MASS_FACTORS: [f64; MAX_NDOF] = [
    1.0,
    1.0 / 10.0,
    3.0 / 10.0,
    3.0 / 5.0,
    1.0 / 35.0,
    1.0 / 21.0,
    1.0 / 14.0,
    1.0 / 7.0,
    3.0 / 14.0,
    3.0 / 7.0,
];

/// Reference-space second derivatives of the quadratic basis functions.
///
/// Rows are (xi xi, eta eta, zeta zeta, xi eta, xi zeta, eta zeta), columns
/// are basis functions 4..10. The quadratic functions have constant Hessians.
pub const D2B_DXI2: [[f64; 6]; 6] = [
    [12.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [2.0, 10.0, 0.0, 20.0, 0.0, 0.0],
    [2.0, 2.0, 12.0, 2.0, 12.0, 30.0],
    [6.0, 10.0, 0.0, 0.0, 0.0, 0.0],
    [6.0, 2.0, 12.0, 0.0, 0.0, 0.0],
    [2.0, 6.0, 6.0, 8.0, 18.0, 0.0],
];

/// Evaluate the basis at reference coordinates `(xi, eta, zeta)`.
///
/// Entries at and beyond `ndof` are zero.
///
/// # Example
///
/// ```
/// use multimat_dg::basis::eval_basis;
///
/// let b = eval_basis(4, 0.25, 0.25, 0.25);
/// assert_eq!(b[0], 1.0);
/// assert!(b[1].abs() < 1e-15);
/// ```
#[inline]
pub fn eval_basis(ndof: usize, xi: f64, eta: f64, zeta: f64) -> BasisValues {
    let mut b = [0.0; MAX_NDOF];
    b[0] = 1.0;
    if ndof > 1 {
        b[1] = 2.0 * xi + eta + zeta - 1.0;
        b[2] = 3.0 * eta + zeta - 1.0;
        b[3] = 4.0 * zeta - 1.0;
    }
    if ndof > 4 {
        let (x, y, z) = (xi, eta, zeta);
        b[4] = 6.0 * x * x + y * y + z * z + 6.0 * x * y + 6.0 * x * z + 2.0 * y * z
            - 6.0 * x
            - 2.0 * y
            - 2.0 * z
            + 1.0;
        b[5] = 5.0 * y * y + z * z + 10.0 * x * y + 2.0 * x * z + 6.0 * y * z
            - 2.0 * x
            - 6.0 * y
            - 2.0 * z
            + 1.0;
        b[6] = 6.0 * z * z + 12.0 * x * z + 6.0 * y * z - 2.0 * x - y - 7.0 * z + 1.0;
        b[7] = 10.0 * y * y + z * z + 8.0 * y * z - 8.0 * y - 2.0 * z + 1.0;
        b[8] = 6.0 * z * z + 18.0 * y * z - 3.0 * y - 7.0 * z + 1.0;
        b[9] = 15.0 * z * z - 10.0 * z + 1.0;
    }
    b
}

/// Evaluate the basis at a reference point given as an array.
#[inline]
pub fn eval_basis_at(ndof: usize, xi: &Vec3) -> BasisValues {
    eval_basis(ndof, xi[0], xi[1], xi[2])
}

/// Reference-space gradients `dB/dxi_k` at `xi`.
pub fn eval_dbdxi(ndof: usize, xi: &Vec3) -> BasisGradients {
    let mut d = [[0.0; MAX_NDOF]; 3];
    if ndof > 1 {
        d[0][1] = 2.0;
        d[1][1] = 1.0;
        d[2][1] = 1.0;
        d[1][2] = 3.0;
        d[2][2] = 1.0;
        d[2][3] = 4.0;
    }
    if ndof > 4 {
        let (x, y, z) = (xi[0], xi[1], xi[2]);

        d[0][4] = 12.0 * x + 6.0 * y + 6.0 * z - 6.0;
        d[1][4] = 6.0 * x + 2.0 * y + 2.0 * z - 2.0;
        d[2][4] = 6.0 * x + 2.0 * y + 2.0 * z - 2.0;

        d[0][5] = 10.0 * y + 2.0 * z - 2.0;
        d[1][5] = 10.0 * x + 10.0 * y + 6.0 * z - 6.0;
        d[2][5] = 2.0 * x + 6.0 * y + 2.0 * z - 2.0;

        d[0][6] = 12.0 * z - 2.0;
        d[1][6] = 6.0 * z - 1.0;
        d[2][6] = 12.0 * x + 6.0 * y + 12.0 * z - 7.0;

        d[1][7] = 20.0 * y + 8.0 * z - 8.0;
        d[2][7] = 8.0 * y + 2.0 * z - 2.0;

        d[1][8] = 18.0 * z - 3.0;
        d[2][8] = 18.0 * y + 12.0 * z - 7.0;

        d[2][9] = 30.0 * z - 10.0;
    }
    d
}

/// Physical-space gradients `dB/dx_i` at reference point `xi`.
///
/// `jac_inv[k][i] = d xi_k / d x_i`.
pub fn eval_dbdx(ndof: usize, xi: &Vec3, jac_inv: &Tensor3) -> BasisGradients {
    let dxi = eval_dbdxi(ndof, xi);
    let mut d = [[0.0; MAX_NDOF]; 3];
    for (i, di) in d.iter_mut().enumerate() {
        for dof in 1..ndof.min(MAX_NDOF) {
            di[dof] = dxi[0][dof] * jac_inv[0][i]
                + dxi[1][dof] * jac_inv[1][i]
                + dxi[2][dof] * jac_inv[2][i];
        }
    }
    d
}

/// Constant physical gradients of the linear basis functions.
///
/// Quadratic entries are left at zero; fill them per point with
/// [`eval_dbdx_p2`].
pub fn eval_dbdx_p1(ndof: usize, jac_inv: &Tensor3) -> BasisGradients {
    eval_dbdx(ndof.min(4), &REF_CENTROID, jac_inv)
}

/// Fill the quadratic entries of `dbdx` at reference point `xi`.
pub fn eval_dbdx_p2(xi: &Vec3, jac_inv: &Tensor3, dbdx: &mut BasisGradients) {
    let full = eval_dbdx(MAX_NDOF, xi, jac_inv);
    for (dst, src) in dbdx.iter_mut().zip(full.iter()) {
        dst[4..].copy_from_slice(&src[4..]);
    }
}

/// Physical second derivatives of the quadratic basis functions.
///
/// Returns `[component][basis - 4]` with components ordered
/// (xx, yy, zz, xy, xz, yz).
pub fn eval_d2bdx2(jac_inv: &Tensor3) -> [[f64; 6]; 6] {
    let j = jac_inv;
    let h = &D2B_DXI2;
    let mut out = [[0.0; 6]; 6];
    for ib in 0..6 {
        for dir in 0..3 {
            out[dir][ib] = h[0][ib] * j[0][dir] * j[0][dir]
                + h[1][ib] * j[1][dir] * j[1][dir]
                + h[2][ib] * j[2][dir] * j[2][dir]
                + 2.0
                    * (h[3][ib] * j[0][dir] * j[1][dir]
                        + h[4][ib] * j[0][dir] * j[2][dir]
                        + h[5][ib] * j[1][dir] * j[2][dir]);
        }
        for (row, (a, b)) in [(3usize, (0usize, 1usize)), (4, (0, 2)), (5, (1, 2))] {
            out[row][ib] = h[0][ib] * j[0][a] * j[0][b]
                + h[1][ib] * j[1][a] * j[1][b]
                + h[2][ib] * j[2][a] * j[2][b]
                + h[3][ib] * (j[0][a] * j[1][b] + j[1][a] * j[0][b])
                + h[4][ib] * (j[0][a] * j[2][b] + j[2][a] * j[0][b])
                + h[5][ib] * (j[1][a] * j[2][b] + j[2][a] * j[1][b]);
        }
    }
    out
}

/// Diagonal of the Dubiner mass matrix for an element of `volume`.
pub fn mass_matrix_dubiner(ndof: usize, volume: f64) -> BasisValues {
    let mut l = [0.0; MAX_NDOF];
    for (li, f) in l.iter_mut().zip(MASS_FACTORS.iter()).take(ndof.min(MAX_NDOF)) {
        *li = volume * f;
    }
    l
}
