//! Least-squares gradient stencils.
//!
//! For element `e` with stencil points `j` at displacements `dx_j` from its
//! centroid, the gradient solves the normal equations
//!
//! ```text
//! (Σ_j dx_j dx_jᵀ) ∇u = Σ_j dx_j (u_j - u_e)
//! ```
//!
//! by Cramer's rule. The matrix depends only on geometry and is assembled
//! once per mesh.

use crate::basis::{cramer, eval_dbdx_p1};
use crate::config::StencilKind;
use crate::mesh::TetMesh;
use crate::types::{Tensor3, Vec3};

/// Where the value of a stencil point comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StencilPoint {
    /// Cell average of a neighboring element.
    Element(usize),
    /// Boundary state at the centroid of a boundary face.
    Boundary(usize),
}

/// One stencil point and its displacement from the element centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilEntry {
    /// Value source.
    pub point: StencilPoint,
    /// Displacement from the element centroid.
    pub dx: Vec3,
}

/// Precomputed stencils and normal-equation matrices.
#[derive(Clone, Debug)]
pub struct LeastSquares {
    kind: StencilKind,
    stencils: Vec<Vec<StencilEntry>>,
    lhs: Vec<Tensor3>,
}

fn displacement(from: &Vec3, to: &Vec3) -> Vec3 {
    [to[0] - from[0], to[1] - from[1], to[2] - from[2]]
}

impl LeastSquares {
    /// Assemble the stencils of every element.
    ///
    /// The face stencil uses face neighbors plus the centroids of boundary
    /// faces; the nodal stencil uses every element sharing a vertex.
    pub fn new(mesh: &TetMesh, kind: StencilKind) -> Self {
        let nelem = mesh.n_elements();
        let mut stencils: Vec<Vec<StencilEntry>> = vec![Vec::new(); nelem];

        match kind {
            StencilKind::Face => {
                for (f, face) in mesh.faces.iter().enumerate() {
                    let el = face.left;
                    let xl = &mesh.centroid[el];
                    match face.right {
                        Some(er) => {
                            let xr = &mesh.centroid[er];
                            stencils[el].push(StencilEntry {
                                point: StencilPoint::Element(er),
                                dx: displacement(xl, xr),
                            });
                            stencils[er].push(StencilEntry {
                                point: StencilPoint::Element(el),
                                dx: displacement(xr, xl),
                            });
                        }
                        None => stencils[el].push(StencilEntry {
                            point: StencilPoint::Boundary(f),
                            dx: displacement(xl, &face.centroid),
                        }),
                    }
                }
            }
            StencilKind::Nodal => {
                for (e, stencil) in stencils.iter_mut().enumerate() {
                    let mut neighbors: Vec<usize> = mesh.inpoel[e]
                        .iter()
                        .flat_map(|&p| mesh.esup[p].iter().copied())
                        .filter(|&er| er != e)
                        .collect();
                    neighbors.sort_unstable();
                    neighbors.dedup();
                    let xe = &mesh.centroid[e];
                    stencil.extend(neighbors.into_iter().map(|er| StencilEntry {
                        point: StencilPoint::Element(er),
                        dx: displacement(xe, &mesh.centroid[er]),
                    }));
                }
            }
        }

        let lhs = stencils
            .iter()
            .map(|stencil| {
                let mut a = [[0.0; 3]; 3];
                for entry in stencil {
                    for i in 0..3 {
                        for j in 0..3 {
                            a[i][j] += entry.dx[i] * entry.dx[j];
                        }
                    }
                }
                a
            })
            .collect();

        Self {
            kind,
            stencils,
            lhs,
        }
    }

    /// Stencil kind.
    pub fn kind(&self) -> StencilKind {
        self.kind
    }

    /// Stencil of element `e`.
    #[inline]
    pub fn stencil(&self, e: usize) -> &[StencilEntry] {
        &self.stencils[e]
    }

    /// Physical gradient of a variable of element `e`, given the jump
    /// `u_j - u_e` at every stencil point (same order as [`Self::stencil`]).
    ///
    /// Returns `None` for empty or singular stencils.
    pub fn reconstruct_gradient(&self, e: usize, jumps: &[f64]) -> Option<Vec3> {
        let stencil = &self.stencils[e];
        if stencil.is_empty() {
            return None;
        }
        let mut rhs = [0.0; 3];
        for (entry, du) in stencil.iter().zip(jumps) {
            for (r, dx) in rhs.iter_mut().zip(&entry.dx) {
                *r += dx * du;
            }
        }
        cramer(&self.lhs[e], &rhs)
    }
}

/// Convert a physical gradient into the linear Dubiner coefficients of an
/// element with inverse Jacobian `jac_inv`.
pub fn gradient_to_dubiner(jac_inv: &Tensor3, grad: &Vec3) -> Option<Vec3> {
    let dbdx = eval_dbdx_p1(4, jac_inv);
    let a = [
        [dbdx[0][1], dbdx[0][2], dbdx[0][3]],
        [dbdx[1][1], dbdx[1][2], dbdx[1][3]],
        [dbdx[2][1], dbdx[2][2], dbdx[2][3]],
    ];
    cramer(&a, grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{eval_basis, inverse_jacobian};

    const TOL: f64 = 1e-10;

    fn linear(x: &Vec3) -> f64 {
        2.0 + 0.5 * x[0] - 1.5 * x[1] + 3.0 * x[2]
    }

    #[test]
    fn test_linear_field_recovered_exactly() {
        let mesh = TetMesh::unit_box([2, 2, 2]).unwrap();
        for kind in [StencilKind::Face, StencilKind::Nodal] {
            let lsq = LeastSquares::new(&mesh, kind);
            for e in 0..mesh.n_elements() {
                let ue = linear(&mesh.centroid[e]);
                let jumps: Vec<f64> = lsq
                    .stencil(e)
                    .iter()
                    .map(|s| match s.point {
                        StencilPoint::Element(j) => linear(&mesh.centroid[j]) - ue,
                        StencilPoint::Boundary(f) => linear(&mesh.faces[f].centroid) - ue,
                    })
                    .collect();
                let g = lsq.reconstruct_gradient(e, &jumps).unwrap();
                assert!((g[0] - 0.5).abs() < TOL);
                assert!((g[1] + 1.5).abs() < TOL);
                assert!((g[2] - 3.0).abs() < TOL);
            }
        }
    }

    #[test]
    fn test_dubiner_transform_reproduces_gradient() {
        let v = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 0.5],
        ];
        let jac_inv = inverse_jacobian(&v).unwrap();
        let grad = [0.5, -1.5, 3.0];
        let c = gradient_to_dubiner(&jac_inv, &grad).unwrap();

        // difference of the linear modes between two reference points
        let b0 = eval_basis(4, 0.1, 0.1, 0.1);
        let b1 = eval_basis(4, 0.3, 0.2, 0.15);
        let du: f64 = (1..4).map(|i| c[i - 1] * (b1[i] - b0[i])).sum();
        // physical displacement between the two reference points
        let dx = [2.0 * 0.2, 1.0 * 0.1, 0.5 * 0.05];
        let expected = grad[0] * dx[0] + grad[1] * dx[1] + grad[2] * dx[2];
        assert!((du - expected).abs() < TOL);
    }

    #[test]
    fn test_empty_stencil_gives_none() {
        let mesh = TetMesh::new(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            vec![[0, 1, 2, 3]],
            &[],
        )
        .unwrap();
        let lsq = LeastSquares::new(&mesh, StencilKind::Nodal);
        assert!(lsq.reconstruct_gradient(0, &[]).is_none());
    }
}
