//! Taylor basis anchored at the element centroid and the exact transforms
//! between it and the Dubiner basis.
//!
//! In the Taylor basis the coefficients are the cell average, the gradient
//! at the centroid and the (constant) second derivatives:
//!
//! ```text
//! T = { 1, dx, dy, dz, dx²/2 - <dx²/2>, dy²/2 - <dy²/2>, dz²/2 - <dz²/2>,
//!       dx dy - <dx dy>, dx dz - <dx dz>, dy dz - <dy dz> }
//! ```
//!
//! where `<.>` is the element average, making every non-constant function
//! zero-mean. Hierarchical limiting works on these coefficients; transport
//! works on Dubiner coefficients.
//!
//! Two frames are provided: the physical element (derivatives in x, y, z)
//! and the reference element (derivatives in xi, eta, zeta), the latter used
//! by the quadratic vertex-based limiter.
//!
//! # References
//!
//! - Luo, H., Baum, J. D., & Löhner, R. (2008). A discontinuous Galerkin
//!   method based on a Taylor basis for the compressible flows on arbitrary
//!   grids. Journal of Computational Physics, 227(20), 8875-8893.

use super::dubiner::{
    BasisValues, MAX_NDOF, REF_CENTROID, eval_basis_at, eval_d2bdx2, eval_dbdx,
    mass_matrix_dubiner,
};
use super::{inverse_jacobian, jacobian_det};
use crate::error::{MultiMatError, Result};
use crate::quadrature::volume_rule;
use crate::types::{IDENTITY, Tensor3, Vec3};

/// Reference tetrahedron vertices.
pub const REF_VERTICES: [Vec3; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Geometric frame of a Taylor expansion: element vertices, inverse
/// Jacobian, centroid and the element averages of the quadratic monomials.
#[derive(Clone, Debug)]
pub struct TaylorFrame {
    ndof: usize,
    vertices: [Vec3; 4],
    jac: Tensor3,
    jac_inv: Tensor3,
    centroid: Vec3,
    avg: [f64; 6],
}

impl TaylorFrame {
    /// Frame of a physical tetrahedron.
    pub fn physical(ndof: usize, vertices: &[Vec3; 4]) -> Result<Self> {
        let jac_inv = inverse_jacobian(vertices).ok_or_else(|| {
            MultiMatError::invalid_config("degenerate tetrahedron in Taylor frame")
        })?;
        let mut centroid = [0.0; 3];
        for v in vertices {
            for d in 0..3 {
                centroid[d] += 0.25 * v[d];
            }
        }
        Self::build(ndof, *vertices, jac_inv, centroid)
    }

    /// Frame of the reference tetrahedron (derivatives in reference space).
    pub fn reference(ndof: usize) -> Result<Self> {
        Self::build(ndof, REF_VERTICES, IDENTITY, REF_CENTROID)
    }

    fn build(ndof: usize, vertices: [Vec3; 4], jac_inv: Tensor3, centroid: Vec3) -> Result<Self> {
        let rule = volume_rule(ndof)?;
        let mut jac = [[0.0; 3]; 3];
        for d in 0..3 {
            for k in 0..3 {
                jac[d][k] = vertices[k + 1][d] - vertices[0][d];
            }
        }
        let mut frame = Self {
            ndof,
            vertices,
            jac,
            jac_inv,
            centroid,
            avg: [0.0; 6],
        };
        if ndof > 4 {
            let mut avg = [0.0; 6];
            for (p, w) in rule.iter() {
                let x = frame.to_physical(p);
                let dx = [
                    x[0] - centroid[0],
                    x[1] - centroid[1],
                    x[2] - centroid[2],
                ];
                avg[0] += w * 0.5 * dx[0] * dx[0];
                avg[1] += w * 0.5 * dx[1] * dx[1];
                avg[2] += w * 0.5 * dx[2] * dx[2];
                avg[3] += w * dx[0] * dx[1];
                avg[4] += w * dx[0] * dx[2];
                avg[5] += w * dx[1] * dx[2];
            }
            frame.avg = avg;
        }
        Ok(frame)
    }

    /// Number of degrees of freedom this frame transforms.
    #[inline]
    pub fn ndof(&self) -> usize {
        self.ndof
    }

    /// Centroid of the frame.
    #[inline]
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Map reference coordinates to frame coordinates.
    #[inline]
    pub fn to_physical(&self, xi: &Vec3) -> Vec3 {
        let v0 = &self.vertices[0];
        let j = &self.jac;
        [
            v0[0] + j[0][0] * xi[0] + j[0][1] * xi[1] + j[0][2] * xi[2],
            v0[1] + j[1][0] * xi[0] + j[1][1] * xi[1] + j[1][2] * xi[2],
            v0[2] + j[2][0] * xi[0] + j[2][1] * xi[1] + j[2][2] * xi[2],
        ]
    }

    /// Evaluate the Taylor basis at a frame-coordinate point `x`.
    pub fn eval_taylor(&self, x: &Vec3) -> BasisValues {
        let mut b = [0.0; MAX_NDOF];
        b[0] = 1.0;
        if self.ndof > 1 {
            b[1] = x[0] - self.centroid[0];
            b[2] = x[1] - self.centroid[1];
            b[3] = x[2] - self.centroid[2];
        }
        if self.ndof > 4 {
            b[4] = 0.5 * b[1] * b[1] - self.avg[0];
            b[5] = 0.5 * b[2] * b[2] - self.avg[1];
            b[6] = 0.5 * b[3] * b[3] - self.avg[2];
            b[7] = b[1] * b[2] - self.avg[3];
            b[8] = b[1] * b[3] - self.avg[4];
            b[9] = b[2] * b[3] - self.avg[5];
        }
        b
    }

    /// Convert the Dubiner coefficients of one variable to Taylor
    /// coefficients.
    pub fn dubiner_to_taylor(&self, dubiner: &[f64]) -> BasisValues {
        let n = self.ndof;
        let mut t = [0.0; MAX_NDOF];
        t[0] = dubiner[0];
        if n > 1 {
            let dbdx = eval_dbdx(n, &REF_CENTROID, &self.jac_inv);
            for dir in 0..3 {
                t[dir + 1] = (1..n).map(|dof| dubiner[dof] * dbdx[dir][dof]).sum();
            }
        }
        if n > 4 {
            let d2 = eval_d2bdx2(&self.jac_inv);
            for comp in 0..6 {
                t[comp + 4] = (0..6).map(|ib| dubiner[ib + 4] * d2[comp][ib]).sum();
            }
        }
        t
    }

    /// Convert Taylor coefficients of one variable back to Dubiner
    /// coefficients by L2 projection.
    pub fn taylor_to_dubiner(&self, taylor: &[f64]) -> BasisValues {
        let n = self.ndof;
        let mut r = [0.0; MAX_NDOF];
        // Rule was validated in `build`.
        let rule = match volume_rule(n) {
            Ok(rule) => rule,
            Err(_) => return r,
        };
        for (p, w) in rule.iter() {
            let x = self.to_physical(p);
            let bt = self.eval_taylor(&x);
            let state: f64 = (0..n).map(|i| taylor[i] * bt[i]).sum();
            let b = eval_basis_at(n, p);
            for i in 0..n {
                r[i] += w * state * b[i];
            }
        }
        // Weights are per unit volume, so project with the unit mass matrix.
        let l = mass_matrix_dubiner(n, 1.0);
        for i in 0..n {
            r[i] /= l[i];
        }
        r
    }
}

/// Signed volume of a frame's element.
pub fn frame_volume(vertices: &[Vec3; 4]) -> f64 {
    jacobian_det(&vertices[0], &vertices[1], &vertices[2], &vertices[3]) / 6.0
}
