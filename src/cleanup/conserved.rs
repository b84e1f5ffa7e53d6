//! Keep the high-order conserved dofs consistent with the limited state.

use tracing::debug;

use crate::basis::{MAX_NDOF, eval_basis_at, mass_matrix_dubiner};
use crate::config::DiscretizationConfig;
use crate::eos::Materials;
use crate::error::{MultiMatError, Result};
use crate::limiter::interface_indicator;
use crate::mesh::TetMesh;
use crate::quadrature::{TetRule, volume_rule};
use crate::state::{Fields, VariableLayout, bulk_density, eval_state, inverse_deformation};
use crate::types::ElementIndex;

struct Projection<'a> {
    mesh: &'a TetMesh,
    materials: &'a Materials,
    layout: VariableLayout,
    rule: TetRule,
    mass: [f64; MAX_NDOF],
}

impl Projection<'_> {
    /// Project material energies and bulk momentum of element `e` from the
    /// limited state and overwrite their high-order dofs in `ue`.
    fn element(
        &self,
        e: usize,
        u: &Fields,
        p: &Fields,
        ugp: &mut [f64],
        pgp: &mut [f64],
        ue: &mut [f64],
    ) -> Result<()> {
        let l = &self.layout;
        let nmat = l.nmat();
        let rdof = u.ndof();
        let mut acc = vec![[0.0; MAX_NDOF]; nmat + 3];

        for (xi, w) in self.rule.iter() {
            let b = eval_basis_at(rdof, xi);
            eval_state(u, e, rdof, &b, ugp);
            eval_state(p, e, rdof, &b, pgp);
            let rhob = bulk_density(l, ugp);
            let vel = [pgp[l.velocity(0)], pgp[l.velocity(1)], pgp[l.velocity(2)]];

            for k in 0..nmat {
                let alpha = ugp[l.volfrac(k)];
                let g = inverse_deformation(l, self.materials, ugp, k);
                let rho_e = self
                    .materials
                    .total_energy(
                        k,
                        ugp[l.density(k)] / alpha,
                        &vel,
                        pgp[l.pressure(k)] / alpha,
                        g.as_ref(),
                    )
                    .map_err(|err| {
                        err.at_element(ElementIndex::new(e), self.mesh.centroid[e])
                    })?;
                for (a, bi) in acc[k].iter_mut().zip(&b).take(rdof) {
                    *a += w * alpha * rho_e * bi;
                }
            }
            for (d, v) in vel.iter().enumerate() {
                for (a, bi) in acc[nmat + d].iter_mut().zip(&b).take(rdof) {
                    *a += w * rhob * v * bi;
                }
            }
        }

        let targets = (0..nmat).map(|k| l.energy(k)).chain((0..3).map(|d| l.momentum(d)));
        for (var, a) in targets.zip(&acc) {
            let modes = &mut ue[var * rdof..(var + 1) * rdof];
            for (m, (ai, mi)) in modes.iter_mut().zip(a.iter().zip(&self.mass)).skip(1) {
                *m = ai / mi;
            }
        }
        Ok(())
    }
}

fn setup<'a>(
    mesh: &'a TetMesh,
    materials: &'a Materials,
    u: &Fields,
    p: &Fields,
) -> Result<Option<Projection<'a>>> {
    let layout = VariableLayout::of(materials);
    if u.nvar() != layout.ncomp() || p.nvar() != layout.nprim() {
        return Err(MultiMatError::dimension_mismatch(
            "correct_limited_conserved: variables",
            layout.ncomp() + layout.nprim(),
            u.nvar() + p.nvar(),
        ));
    }
    if u.ndof() != p.ndof() || u.nelem() != mesh.n_elements() || p.nelem() != u.nelem() {
        return Err(MultiMatError::dimension_mismatch(
            "correct_limited_conserved: storage",
            u.nelem() * u.ndof(),
            p.nelem() * p.ndof(),
        ));
    }
    let rdof = u.ndof();
    if rdof == 1 {
        return Ok(None);
    }
    Ok(Some(Projection {
        mesh,
        materials,
        layout,
        rule: volume_rule(rdof)?,
        mass: mass_matrix_dubiner(rdof, 1.0),
    }))
}

/// Re-project the high-order dofs of the material energies and the bulk
/// momentum from the limited conserved and primitive arrays.
///
/// Cell averages are untouched, so the correction is conservative. A no-op
/// for first-order data.
pub fn correct_limited_conserved(
    mesh: &TetMesh,
    materials: &Materials,
    p: &Fields,
    u: &mut Fields,
) -> Result<()> {
    let Some(proj) = setup(mesh, materials, u, p)? else {
        return Ok(());
    };
    let mut ugp = vec![0.0; proj.layout.ncomp()];
    let mut pgp = vec![0.0; proj.layout.nprim()];
    let mut ue = vec![0.0; u.element_len()];
    for e in 0..u.nelem() {
        ue.copy_from_slice(u.element(e));
        proj.element(e, u, p, &mut ugp, &mut pgp, &mut ue)?;
        u.element_mut(e).copy_from_slice(&ue);
    }
    Ok(())
}

/// Element-parallel [`correct_limited_conserved`].
#[cfg(feature = "parallel")]
pub fn correct_limited_conserved_parallel(
    mesh: &TetMesh,
    materials: &Materials,
    p: &Fields,
    u: &mut Fields,
) -> Result<()> {
    use rayon::prelude::*;

    let Some(proj) = setup(mesh, materials, u, p)? else {
        return Ok(());
    };
    let (ncomp, nprim) = (proj.layout.ncomp(), proj.layout.nprim());
    let src = u.clone();
    let len = u.element_len();
    u.as_mut_slice()
        .par_chunks_exact_mut(len)
        .enumerate()
        .try_for_each_init(
            || (vec![0.0; ncomp], vec![0.0; nprim]),
            |(ugp, pgp), (e, ue)| proj.element(e, &src, p, ugp, pgp, ue),
        )
}

/// Drop the high-order dofs of interface cells when interface sharpening is
/// on: density and energy of every interface material, and bulk momentum.
///
/// Returns the number of interface cells.
pub fn update_interface_cells(
    config: &DiscretizationConfig,
    layout: &VariableLayout,
    u: &mut Fields,
) -> usize {
    if !config.intsharp {
        return 0;
    }
    let nmat = layout.nmat();
    let bound = config.limiter_thresholds.interface_bound;
    let rdof = u.ndof();

    let mut alphas = vec![0.0; nmat];
    let mut mat_int = vec![false; nmat];
    let mut count = 0;
    for e in 0..u.nelem() {
        for (k, a) in alphas.iter_mut().enumerate() {
            *a = u.get(e, layout.volfrac(k), 0);
        }
        if !interface_indicator(&alphas, bound, &mut mat_int) {
            continue;
        }
        count += 1;
        for (k, _) in mat_int.iter().enumerate().filter(|(_, m)| **m) {
            for var in [layout.density(k), layout.energy(k)] {
                u.modes_mut(e, var)[1..rdof].fill(0.0);
            }
        }
        for d in 0..3 {
            u.modes_mut(e, layout.momentum(d))[1..rdof].fill(0.0);
        }
    }
    debug!(interface_cells = count, "reset interface cells to first order");
    count
}
