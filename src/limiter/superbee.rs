//! Superbee limiting of linear dofs.
//!
//! Bounds come from the cell averages of the element and its face
//! neighbors; the limiter function is checked at the face quadrature points.
//! `beta = 2` gives Superbee, `beta = 1` reduces to minmod.

use super::points::{ReferencePoints, eval_modes};
use crate::mesh::TetMesh;
use crate::state::Fields;

/// Deviations below this count as zero.
const DEVIATION_EPS: f64 = 1.0e-14;
/// Lower bound on the magnitude of a non-zero deviation.
const DEVIATION_FLOOR: f64 = 1.0e-8;

/// Superbee limiter function for one point value.
#[inline]
pub(crate) fn superbee_phi(avg: f64, umin: f64, umax: f64, value: f64, beta: f64) -> f64 {
    let dev = value - avg;
    let phi = if dev > DEVIATION_EPS {
        let dev = dev.max(DEVIATION_FLOOR);
        ((umax - avg) / (2.0 * dev)).min(1.0)
    } else if dev < -DEVIATION_EPS {
        let dev = dev.min(-DEVIATION_FLOOR);
        ((umin - avg) / (2.0 * dev)).min(1.0)
    } else {
        1.0
    };
    (beta * phi).min(1.0).max(phi.min(beta)).max(0.0)
}

/// Lower `phi[var]` to the Superbee coefficient of every variable in
/// `vars` of element `e`.
pub(crate) fn superbee_factors(
    mesh: &TetMesh,
    fields: &Fields,
    e: usize,
    vars: &[usize],
    points: &ReferencePoints,
    beta: f64,
    phi: &mut [f64],
) {
    // no face neighbor gives no bounds to enforce
    if mesh.esuel[e].iter().all(Option::is_none) {
        return;
    }
    for &var in vars {
        let avg = fields.get(e, var, 0);
        let (umin, umax) = mesh.esuel[e]
            .iter()
            .flatten()
            .fold((avg, avg), |(lo, hi), &n| {
                let a = fields.get(n, var, 0);
                (lo.min(a), hi.max(a))
            });
        let modes = fields.modes(e, var);
        let limited = points
            .face()
            .iter()
            .map(|b| superbee_phi(avg, umin, umax, eval_modes(modes, b), beta))
            .fold(1.0_f64, f64::min);
        phi[var] = phi[var].min(limited);
    }
}
