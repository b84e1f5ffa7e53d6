//! L2 projection of primitive quantities from the conserved state.

use tracing::debug;

use super::{Fields, VariableLayout, eval_state, inverse_deformation};
use crate::basis::{MAX_NDOF, eval_basis_at, mass_matrix_dubiner};
use crate::eos::Materials;
use crate::error::Result;
use crate::mesh::TetMesh;
use crate::quadrature::volume_rule;
use crate::types::ElementIndex;

/// Projected modes smaller than this are set to zero.
const ROUND_OFF: f64 = 1.0e-16;

/// Project partial pressures and bulk velocity onto the first `ndof` modes
/// of `prim`.
///
/// At every volume quadrature point the conserved state is evaluated, the
/// velocity is `ρu / Σ α_k ρ_k` and the partial pressures come from the
/// material closures. Modes `ndof..` of `prim` are left untouched.
pub fn project_primitives(
    mesh: &TetMesh,
    materials: &Materials,
    ndof: usize,
    unk: &Fields,
    prim: &mut Fields,
) -> Result<()> {
    let layout = VariableLayout::of(materials);
    let nmat = layout.nmat();
    let rule = volume_rule(ndof)?;
    let mass = mass_matrix_dubiner(ndof, 1.0);

    let mut ugp = vec![0.0; layout.ncomp()];
    let mut acc = vec![[0.0; MAX_NDOF]; layout.nprim()];
    for e in 0..mesh.n_elements() {
        for a in acc.iter_mut() {
            *a = [0.0; MAX_NDOF];
        }
        for (xi, w) in rule.iter() {
            let b = eval_basis_at(ndof, xi);
            eval_state(unk, e, ndof, &b, &mut ugp);

            let rhob: f64 = (0..nmat).map(|k| ugp[layout.density(k)]).sum();
            let vel = [
                ugp[layout.momentum(0)] / rhob,
                ugp[layout.momentum(1)] / rhob,
                ugp[layout.momentum(2)] / rhob,
            ];
            for k in 0..nmat {
                let g = inverse_deformation(&layout, materials, &ugp, k);
                let apr = materials
                    .pressure(
                        k,
                        ugp[layout.density(k)],
                        &vel,
                        ugp[layout.energy(k)],
                        ugp[layout.volfrac(k)],
                        g.as_ref(),
                    )
                    .map_err(|err| err.at_element(ElementIndex::new(e), mesh.centroid[e]))?;
                for i in 0..ndof {
                    acc[layout.pressure(k)][i] += w * apr * b[i];
                }
            }
            for (dir, v) in vel.iter().enumerate() {
                for i in 0..ndof {
                    acc[layout.velocity(dir)][i] += w * v * b[i];
                }
            }
        }
        for (var, a) in acc.iter().enumerate() {
            let modes = prim.modes_mut(e, var);
            for i in 0..ndof {
                let v = a[i] / mass[i];
                modes[i] = if v.abs() < ROUND_OFF { 0.0 } else { v };
            }
        }
    }
    debug!(nelem = mesh.n_elements(), ndof, "projected primitive quantities");
    Ok(())
}
