//! Vertex-based (Kuzmin) limiting.
//!
//! For linear data the bounds at each vertex are the extrema of the cell
//! averages over all elements sharing that vertex, and the limiter function
//! is checked at the element's vertices. For quadratic data the same is
//! done one level up: the first derivatives (Taylor coefficients on the
//! reference element) are bounded by the derivatives of the vertex patch,
//! including remote patch members reported through [`NodalExtrema`].
//!
//! # References
//!
//! - Kuzmin, D. (2010). A vertex-based hierarchical slope limiter for
//!   p-adaptive discontinuous Galerkin methods. Journal of Computational and
//!   Applied Mathematics, 233(12), 3077-3085.

use super::points::{ReferencePoints, eval_modes};
use crate::basis::{BasisGradients, REF_CENTROID, REF_VERTICES, TaylorFrame};
use crate::mesh::{NodalExtrema, TetMesh};
use crate::state::Fields;

/// Relative deviation below which no limiting happens.
const RELATIVE_EPS: f64 = 1.0e-6;
/// Smallest reference magnitude.
const REFERENCE_FLOOR: f64 = 1.0e-14;

/// Vertex-based limiter function for one vertex value.
#[inline]
pub(crate) fn vertex_phi(avg: f64, umin: f64, umax: f64, value: f64) -> f64 {
    let dev = value - avg;
    let uref = avg.abs().max(REFERENCE_FLOOR);
    let phi = if dev > RELATIVE_EPS * uref {
        ((umax - avg) / dev).min(1.0)
    } else if dev < -RELATIVE_EPS * uref {
        ((umin - avg) / dev).min(1.0)
    } else {
        1.0
    };
    phi.max(0.0)
}

/// Extrema of the cell averages of `var` over the elements around `point`.
#[inline]
fn patch_bounds(mesh: &TetMesh, fields: &Fields, point: usize, var: usize) -> (f64, f64) {
    mesh.esup[point]
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &n| {
            let a = fields.get(n, var, 0);
            (lo.min(a), hi.max(a))
        })
}

/// Whether no other element shares a vertex with `e`, locally or through
/// the partition halo.
fn is_isolated(mesh: &TetMesh, e: usize, halo: Option<&NodalExtrema>) -> bool {
    mesh.inpoel[e].iter().all(|&point| {
        mesh.esup[point].iter().all(|&n| n == e)
            && halo.and_then(|h| h.get(point)).is_none()
    })
}

/// Linear vertex-based coefficients of `vars` of element `e`, evaluated on
/// the Dubiner expansion.
pub(crate) fn vertex_p1_factors(
    mesh: &TetMesh,
    fields: &Fields,
    e: usize,
    vars: &[usize],
    points: &ReferencePoints,
    phi: &mut [f64],
) {
    if is_isolated(mesh, e, None) {
        return;
    }
    for &var in vars {
        let avg = fields.get(e, var, 0);
        let modes = fields.modes(e, var);
        for (lv, &point) in mesh.inpoel[e].iter().enumerate() {
            let (umin, umax) = patch_bounds(mesh, fields, point, var);
            let value = eval_modes(modes, points.vertex(lv));
            phi[var] = phi[var].min(vertex_phi(avg, umin, umax, value));
        }
    }
}

/// Quadratic vertex-based coefficients of `vars` of element `e`.
///
/// `phi_p1` receives the coefficient of the linear part of the Taylor
/// expansion (bounded by the patch averages), `phi_p2` the coefficient of
/// the second derivatives (bounded by the patch first derivatives).
/// `dbdxi` holds reference-basis gradients at the reference centroid.
#[allow(clippy::too_many_arguments)]
pub(crate) fn vertex_p2_factors(
    mesh: &TetMesh,
    fields: &Fields,
    e: usize,
    vars: &[usize],
    frame: &TaylorFrame,
    dbdxi: &BasisGradients,
    halo: Option<&NodalExtrema>,
    phi_p1: &mut [f64],
    phi_p2: &mut [f64],
) {
    if is_isolated(mesh, e, halo) {
        return;
    }
    let rdof = fields.ndof();
    for &var in vars {
        let t = frame.dubiner_to_taylor(fields.modes(e, var));
        for (lv, &point) in mesh.inpoel[e].iter().enumerate() {
            let dx = [
                REF_VERTICES[lv][0] - REF_CENTROID[0],
                REF_VERTICES[lv][1] - REF_CENTROID[1],
                REF_VERTICES[lv][2] - REF_CENTROID[2],
            ];

            // linear part against the patch averages
            let (umin, umax) = patch_bounds(mesh, fields, point, var);
            let value = t[0] + t[1] * dx[0] + t[2] * dx[1] + t[3] * dx[2];
            phi_p1[var] = phi_p1[var].min(vertex_phi(t[0], umin, umax, value));

            // first derivatives against the patch derivatives
            let mut lo = [t[1], t[2], t[3]];
            let mut hi = lo;
            for &n in &mesh.esup[point] {
                let modes = fields.modes(n, var);
                for dir in 0..3 {
                    let slope: f64 = (1..rdof).map(|dof| modes[dof] * dbdxi[dir][dof]).sum();
                    lo[dir] = lo[dir].min(slope);
                    hi[dir] = hi[dir].max(slope);
                }
            }
            if let Some((max, min)) = halo.and_then(|h| h.get(point)) {
                for dir in 0..3 {
                    hi[dir] = hi[dir].max(max[var * 3 + dir]);
                    lo[dir] = lo[dir].min(min[var * 3 + dir]);
                }
            }
            let slopes = [
                t[1] + t[4] * dx[0] + t[7] * dx[1] + t[8] * dx[2],
                t[2] + t[7] * dx[0] + t[5] * dx[1] + t[9] * dx[2],
                t[3] + t[8] * dx[0] + t[9] * dx[1] + t[6] * dx[2],
            ];
            for dir in 0..3 {
                let phi = vertex_phi(t[dir + 1], lo[dir], hi[dir], slopes[dir]);
                phi_p2[var] = phi_p2[var].min(phi);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::eval_dbdxi;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_vertex_phi() {
        assert_eq!(vertex_phi(1.0, 0.5, 1.5, 1.2), 1.0);
        assert!((vertex_phi(1.0, 0.5, 1.5, 2.0) - 0.5).abs() < TOL);
        assert!((vertex_phi(1.0, 0.8, 1.5, 0.0) - 0.2).abs() < TOL);
        // negligible deviation relative to the average
        assert_eq!(vertex_phi(1.0, 1.0, 1.0, 1.0 + 1e-9), 1.0);
    }

    #[test]
    fn test_constant_state_is_unlimited() {
        let mesh = TetMesh::unit_box([2, 1, 1]).unwrap();
        let n = mesh.n_elements();
        let mut f = Fields::new(n, 2, 4);
        for e in 0..n {
            f.set(e, 0, 0, 3.0);
            f.set(e, 1, 0, -1.0);
        }
        let points = ReferencePoints::new(4).unwrap();
        for e in 0..n {
            let mut phi = vec![1.0; 2];
            vertex_p1_factors(&mesh, &f, e, &[0, 1], &points, &mut phi);
            assert_eq!(phi, vec![1.0, 1.0]);
        }
    }

    #[test]
    fn test_p1_limits_new_extremum() {
        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        let n = mesh.n_elements();
        let mut f = Fields::new(n, 1, 4);
        for e in 0..n {
            f.set(e, 0, 0, 1.0);
        }
        f.set(0, 0, 2, 0.5);
        let points = ReferencePoints::new(4).unwrap();
        let mut phi = vec![1.0];
        vertex_p1_factors(&mesh, &f, 0, &[0], &points, &mut phi);
        assert_eq!(phi[0], 0.0);
    }

    #[test]
    fn test_isolated_element_is_unlimited() {
        let mesh = TetMesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            vec![[0, 1, 2, 3]],
            &[],
        )
        .unwrap();
        let mut f = Fields::new(1, 1, 10);
        f.modes_mut(0, 0)[..4].copy_from_slice(&[1.0, 0.1, -0.2, 0.05]);
        f.set(0, 0, 4, 0.3);

        let mut lin = Fields::new(1, 1, 4);
        lin.modes_mut(0, 0).copy_from_slice(&f.modes(0, 0)[..4]);
        let points = ReferencePoints::new(4).unwrap();
        let mut phi = vec![1.0];
        vertex_p1_factors(&mesh, &lin, 0, &[0], &points, &mut phi);
        assert_eq!(phi[0], 1.0);

        let frame = TaylorFrame::reference(10).unwrap();
        let dbdxi = eval_dbdxi(10, &REF_CENTROID);
        let mut p1 = vec![1.0];
        let mut p2 = vec![1.0];
        vertex_p2_factors(&mesh, &f, 0, &[0], &frame, &dbdxi, None, &mut p1, &mut p2);
        assert_eq!((p1[0], p2[0]), (1.0, 1.0));
    }

    #[test]
    fn test_p2_quadratic_bump_is_limited() {
        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        let n = mesh.n_elements();
        let mut f = Fields::new(n, 1, 10);
        for e in 0..n {
            f.set(e, 0, 0, 1.0);
        }
        f.set(0, 0, 4, 2.0);
        let frame = TaylorFrame::reference(10).unwrap();
        let dbdxi = eval_dbdxi(10, &REF_CENTROID);
        let mut p1 = vec![1.0];
        let mut p2 = vec![1.0];
        vertex_p2_factors(&mesh, &f, 0, &[0], &frame, &dbdxi, None, &mut p1, &mut p2);
        assert!(p2[0] < 1.0);
        assert!((0.0..=1.0).contains(&p1[0]));

        // a remote patch with wide slopes relaxes the bound
        let mut halo = NodalExtrema::new(1);
        for &point in &mesh.inpoel[0] {
            halo.insert(point, vec![1e6; 3], vec![-1e6; 3]).unwrap();
        }
        let mut q1 = vec![1.0];
        let mut q2 = vec![1.0];
        vertex_p2_factors(&mesh, &f, 0, &[0], &frame, &dbdxi, Some(&halo), &mut q1, &mut q2);
        assert!(q2[0] >= p2[0]);
        assert!((q2[0] - 1.0).abs() < TOL);
    }
}
