//! Solution storage and pointwise evaluation.
//!
//! The conserved array holds volume fractions, partial densities, bulk
//! momentum, partial total energies and solid inverse deformation gradients;
//! the primitive array holds partial pressures and bulk velocity. Both are
//! [`Fields`] indexed through a [`VariableLayout`].

mod fields;
mod layout;
mod primitives;

pub use fields::Fields;
pub use layout::VariableLayout;
pub use primitives::project_primitives;

use crate::eos::Materials;
use crate::types::Tensor3;

/// Evaluate every variable of element `e` at a point with basis values `b`,
/// using the first `nmodes` modes.
#[inline]
pub fn eval_state(fields: &Fields, e: usize, nmodes: usize, b: &[f64], out: &mut [f64]) {
    let n = nmodes.min(fields.ndof());
    for (var, o) in out.iter_mut().enumerate().take(fields.nvar()) {
        let modes = fields.modes(e, var);
        *o = modes[..n].iter().zip(&b[..n]).map(|(m, bi)| m * bi).sum();
    }
}

/// Inverse deformation gradient of material `k` from a pointwise conserved
/// state, or `None` for fluids.
pub fn inverse_deformation(
    layout: &VariableLayout,
    materials: &Materials,
    ugp: &[f64],
    k: usize,
) -> Option<Tensor3> {
    materials.solid_slot(k).map(|s| {
        let mut g = [[0.0; 3]; 3];
        for (i, row) in g.iter_mut().enumerate() {
            for (j, gij) in row.iter_mut().enumerate() {
                *gij = ugp[layout.deform(s, i, j)];
            }
        }
        g
    })
}

/// Bulk density `Σ α_k ρ_k` of a pointwise conserved state.
#[inline]
pub fn bulk_density(layout: &VariableLayout, ugp: &[f64]) -> f64 {
    (0..layout.nmat()).map(|k| ugp[layout.density(k)]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::eval_basis;
    use crate::eos::{SmallShearSolid, StiffenedGas};

    #[test]
    fn test_eval_state_sums_modes() {
        let mut f = Fields::new(1, 2, 4);
        f.modes_mut(0, 0).copy_from_slice(&[1.0, 2.0, 0.0, 0.0]);
        f.modes_mut(0, 1).copy_from_slice(&[3.0, 0.0, 0.0, 1.0]);
        let b = eval_basis(4, 0.1, 0.2, 0.3);
        let mut out = [0.0; 2];
        eval_state(&f, 0, 4, &b, &mut out);
        assert!((out[0] - (1.0 + 2.0 * b[1])).abs() < 1e-14);
        assert!((out[1] - (3.0 + b[3])).abs() < 1e-14);
        eval_state(&f, 0, 1, &b, &mut out);
        assert_eq!(out, [1.0, 3.0]);
    }

    #[test]
    fn test_inverse_deformation_only_for_solids() {
        let materials = Materials::new(vec![
            StiffenedGas::air().into(),
            SmallShearSolid::copper().into(),
        ])
        .unwrap();
        let layout = VariableLayout::of(&materials);
        let mut ugp = vec![0.0; layout.ncomp()];
        ugp[layout.deform(0, 1, 2)] = 0.25;
        assert!(inverse_deformation(&layout, &materials, &ugp, 0).is_none());
        let g = inverse_deformation(&layout, &materials, &ugp, 1).unwrap();
        assert_eq!(g[1][2], 0.25);
    }
}
