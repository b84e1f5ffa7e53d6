//! WENO blending of linear dofs.
//!
//! The limited linear dofs are a convex combination of the element's own
//! linear dofs (weighted by the central weight) and those of its face
//! neighbors, with weights inversely proportional to the squared
//! oscillation of each candidate.

use crate::mesh::TetMesh;
use crate::state::Fields;

/// Regularization of the oscillation indicator.
const OSCILLATION_EPS: f64 = 1.0e-8;

/// Blended linear dofs of variable `var` of element `e`.
///
/// Boundary faces contribute a zero-weight, zero-gradient candidate.
pub(crate) fn weno_linear_dofs(
    mesh: &TetMesh,
    fields: &Fields,
    e: usize,
    var: usize,
    central_weight: f64,
) -> [f64; 3] {
    let mut grads = [[0.0; 3]; 5];
    let mut weights = [0.0; 5];
    grads[0].copy_from_slice(&fields.modes(e, var)[1..4]);
    weights[0] = central_weight;
    for (i, nb) in mesh.esuel[e].iter().enumerate() {
        if let Some(n) = *nb {
            grads[i + 1].copy_from_slice(&fields.modes(n, var)[1..4]);
            weights[i + 1] = 1.0;
        }
    }

    let mut wsum = 0.0;
    for (w, g) in weights.iter_mut().zip(&grads) {
        let osc = (g[0] * g[0] + g[1] * g[1] + g[2] * g[2]).sqrt();
        *w /= (OSCILLATION_EPS + osc).powi(2);
        wsum += *w;
    }

    let mut out = [0.0; 3];
    for (w, g) in weights.iter().zip(&grads) {
        for d in 0..3 {
            out[d] += w / wsum * g[d];
        }
    }
    out
}
