//! Analytical flux tensor for volume integrals.

use crate::eos::{EquationOfState, Materials};
use crate::error::Result;
use crate::state::{VariableLayout, inverse_deformation};
use crate::types::{Tensor3, Vec3, dot};

/// Physical flux `F[c][d]` of every conserved component `c` in direction `d`
/// at a point with conserved state `ugp` and primitive state `pgp`.
///
/// Volume fractions carry no conservative flux: their transport enters the
/// residual through the face fluxes and the non-conservative term
/// `α ∇·(u B)`. Fluids use the primitive partial pressure, solids their
/// Cauchy stress, matching the face fluxes.
pub fn physical_flux(
    layout: &VariableLayout,
    materials: &Materials,
    ugp: &[f64],
    pgp: &[f64],
    out: &mut [[f64; 3]],
) -> Result<()> {
    let l = layout;
    let vel: Vec3 = [pgp[l.velocity(0)], pgp[l.velocity(1)], pgp[l.velocity(2)]];

    for f in out.iter_mut() {
        *f = [0.0; 3];
    }

    let mut stress: Tensor3 = [[0.0; 3]; 3];
    for k in 0..l.nmat() {
        let alpha = ugp[l.volfrac(k)];
        let arho = ugp[l.density(k)];
        let arho_e = ugp[l.energy(k)];
        let g = inverse_deformation(l, materials, ugp, k);

        let sigma = if materials.get(k).is_solid() {
            materials.cauchy_stress(k, arho, &vel, arho_e, alpha, g.as_ref())?
        } else {
            let apr = pgp[l.pressure(k)];
            [[-apr, 0.0, 0.0], [0.0, -apr, 0.0], [0.0, 0.0, -apr]]
        };

        for d in 0..3 {
            out[l.density(k)][d] = arho * vel[d];
            let work: f64 = (0..3).map(|i| vel[i] * sigma[i][d]).sum();
            out[l.energy(k)][d] = arho_e * vel[d] - work;
        }
        for (srow, arow) in stress.iter_mut().zip(sigma.iter()) {
            for (s, a) in srow.iter_mut().zip(arow.iter()) {
                *s += a;
            }
        }

        if let (Some(s), Some(g)) = (materials.solid_slot(k), g.as_ref()) {
            for (i, gi) in g.iter().enumerate() {
                let ug = dot(&vel, gi);
                for j in 0..3 {
                    out[l.deform(s, i, j)][j] = ug;
                }
            }
        }
    }

    for i in 0..3 {
        let mom = ugp[l.momentum(i)];
        for d in 0..3 {
            out[l.momentum(i)][d] = mom * vel[d] - stress[i][d];
        }
    }
    Ok(())
}
