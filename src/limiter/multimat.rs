//! Multi-material sub-passes run after every raw limiter.
//!
//! Each pass reads one element's (already raw-limited) dofs and lowers the
//! element's [`ElementFactors`]; the factors are applied once at the end.
//! Passes:
//!
//! - bound preservation of the volume fractions,
//! - positivity of partial densities, partial energies and pressures
//!   (both skipped under interface sharpening),
//! - interface detection, which either exempts interface materials from
//!   volume-fraction limiting (interface sharpening) or makes the high-order
//!   dofs of densities and energies consistent with the volume fractions.

use super::factors::ElementFactors;
use super::points::{ReferencePoints, eval_modes};
use crate::config::LimiterThresholds;
use crate::eos::Materials;
use crate::state::VariableLayout;

/// Deviations below this are not limited by the positivity pass.
const POSITIVITY_DEVIATION_EPS: f64 = 1.0e-13;
/// Volume fractions used as divisors are floored at this value.
const ALPHA_DIVISOR_FLOOR: f64 = 1.0e-14;

/// Coefficient keeping `value` inside `[min, max]` when scaled towards `avg`.
#[inline]
pub(crate) fn bound_phi(min: f64, max: f64, avg: f64, value: f64) -> f64 {
    let dev = value - avg;
    if dev.abs() < f64::EPSILON * avg.abs().max(1.0) {
        return 1.0;
    }
    let phi = if value > max {
        ((max - avg) / dev).abs()
    } else if value < min {
        ((min - avg) / dev).abs()
    } else {
        1.0
    };
    phi.min(1.0)
}

/// Coefficient keeping `value` above `min` when scaled towards `avg`.
#[inline]
pub(crate) fn positivity_phi(min: f64, value: f64, avg: f64) -> f64 {
    let dev = value - avg;
    if value < min && dev.abs() > POSITIVITY_DEVIATION_EPS {
        ((min - avg) / dev).abs().min(1.0)
    } else {
        1.0
    }
}

/// Whether the element holds a material interface. `mat_int[k]` is set for
/// every material whose volume fraction lies strictly inside
/// `(bound, 1 - bound)`.
pub(crate) fn interface_indicator(alphas: &[f64], bound: f64, mat_int: &mut [bool]) -> bool {
    let hi = 1.0 - bound;
    let mut almax = 0.0_f64;
    for (a, m) in alphas.iter().zip(mat_int.iter_mut()) {
        almax = almax.max(*a);
        *m = *a > bound && *a < hi;
    }
    almax > bound && almax < hi
}

/// Common multi-material pass over one element.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MultiMatPass<'a> {
    pub layout: VariableLayout,
    pub materials: &'a Materials,
    pub points: &'a ReferencePoints,
    pub thresholds: LimiterThresholds,
    pub intsharp: bool,
    pub accuracy_test: bool,
}

impl MultiMatPass<'_> {
    /// Compute the multi-material factors of one element, modify its
    /// density and energy dofs in interface cells, and apply the factors.
    ///
    /// `u` and `p` are element slices laid out `var * rdof + dof`.
    /// Returns whether any coefficient was below one.
    pub fn run(&self, u: &mut [f64], p: &mut [f64], factors: &mut ElementFactors) -> bool {
        let l = &self.layout;
        let rdof = self.points.rdof();
        let nmat = l.nmat();
        factors.reset();

        if !self.intsharp {
            if nmat > 1 {
                self.bound_preserving(u, factors);
            }
            self.positivity(u, p, factors);
        }

        let alphas: Vec<f64> = (0..nmat).map(|k| u[l.volfrac(k) * rdof]).collect();
        let mut mat_int = vec![false; nmat];
        let int_ind =
            interface_indicator(&alphas, self.thresholds.interface_bound, &mut mat_int);
        if self.intsharp && int_ind {
            for (k, _) in mat_int.iter().enumerate().filter(|(_, m)| **m) {
                factors.cons_p1[l.volfrac(k)] = 1.0;
                factors.cons_p2[l.volfrac(k)] = 1.0;
            }
        } else if !self.accuracy_test {
            self.consistent_limiting(u, factors);
        }

        let limited = !factors.is_unlimited();
        if limited {
            factors.apply_dubiner(u, p, rdof);
        }
        limited
    }

    /// Keep every volume fraction inside `[bound, 1 - bound]` at the check
    /// points.
    pub fn bound_preserving(&self, u: &[f64], factors: &mut ElementFactors) {
        let l = &self.layout;
        let rdof = self.points.rdof();
        let min = self.thresholds.volfrac_bound;
        let max = 1.0 - min;
        for k in 0..l.nmat() {
            let var = l.volfrac(k);
            let modes = &u[var * rdof..(var + 1) * rdof];
            let avg = modes[0];
            let phi = self
                .points
                .check_points()
                .map(|b| bound_phi(min, max, avg, eval_modes(modes, b)))
                .fold(1.0_f64, f64::min);
            factors.limit_cons(var, phi);
        }
    }

    /// Keep partial densities, partial energies and pressures above their
    /// floors at the check points.
    pub fn positivity(&self, u: &[f64], p: &[f64], factors: &mut ElementFactors) {
        let l = &self.layout;
        let rdof = self.points.rdof();
        let floor = self.thresholds.positivity_floor;
        for k in 0..l.nmat() {
            let alpha = u[l.volfrac(k) * rdof];
            let pmin = self.materials.min_effective_pressure(k, floor, alpha);
            for (data, var, min, conserved) in [
                (u, l.density(k), floor, true),
                (u, l.energy(k), floor, true),
                (p, l.pressure(k), pmin, false),
            ] {
                let m = &data[var * rdof..(var + 1) * rdof];
                let phi = self
                    .points
                    .check_points()
                    .map(|b| positivity_phi(min, eval_modes(m, b), m[0]))
                    .fold(1.0_f64, f64::min);
                if conserved {
                    factors.limit_cons(var, phi);
                } else {
                    factors.limit_prim(var, phi);
                }
            }
        }
    }

    /// Inside the interface band, tie the high-order dofs of the partial
    /// densities and energies to those of the volume fractions and give all
    /// three the common volume-fraction coefficient. Outside the band only
    /// the volume-fraction coefficients are unified.
    pub fn consistent_limiting(&self, u: &mut [f64], factors: &mut ElementFactors) {
        let l = &self.layout;
        let rdof = self.points.rdof();
        let nmat = l.nmat();
        let band = self.thresholds.al_band;
        let (phi_p1, phi_p2) = factors.volume_fraction_min(l);
        let almax = (0..nmat)
            .map(|k| u[l.volfrac(k) * rdof])
            .fold(0.0_f64, f64::max);

        if almax > band && almax < 1.0 - band {
            for k in 0..nmat {
                let va = l.volfrac(k) * rdof;
                let vr = l.density(k) * rdof;
                let ve = l.energy(k) * rdof;
                let alk = u[va].max(ALPHA_DIVISOR_FLOOR);
                let rho = u[vr] / alk;
                let rho_e = u[ve] / alk;
                for dof in 1..rdof {
                    let da = u[va + dof];
                    u[vr + dof] = rho * da;
                    u[ve + dof] = rho_e * da;
                }
                for var in [l.volfrac(k), l.density(k), l.energy(k)] {
                    factors.cons_p1[var] = factors.cons_p1[var].min(phi_p1);
                    factors.cons_p2[var] = factors.cons_p2[var].min(phi_p2);
                }
            }
        }
        factors.unify_volume_fractions(l);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::StiffenedGas;

    const TOL: f64 = 1e-12;

    fn two_fluids() -> Materials {
        Materials::new(vec![StiffenedGas::air().into(), StiffenedGas::water().into()]).unwrap()
    }

    fn pass<'a>(materials: &'a Materials, points: &'a ReferencePoints) -> MultiMatPass<'a> {
        MultiMatPass {
            layout: VariableLayout::of(materials),
            materials,
            points,
            thresholds: LimiterThresholds::default(),
            intsharp: false,
            accuracy_test: false,
        }
    }

    #[test]
    fn test_bound_phi() {
        assert_eq!(bound_phi(0.0, 1.0, 0.5, 0.7), 1.0);
        assert!((bound_phi(0.0, 1.0, 0.5, 1.5) - 0.5).abs() < TOL);
        assert!((bound_phi(0.0, 1.0, 0.5, -0.5) - 0.5).abs() < TOL);
    }

    #[test]
    fn test_positivity_phi() {
        assert_eq!(positivity_phi(1e-15, 2.0, 1.0), 1.0);
        assert!((positivity_phi(0.0, -1.0, 1.0) - 0.5).abs() < TOL);
        // negligible high-order part
        assert_eq!(positivity_phi(0.0, -1e-20, 0.0), 1.0);
    }

    #[test]
    fn test_interface_indicator() {
        let mut m = [false; 2];
        assert!(interface_indicator(&[0.5, 0.5], 2e-8, &mut m));
        assert_eq!(m, [true, true]);
        assert!(!interface_indicator(&[1.0 - 1e-10, 1e-10], 2e-8, &mut m));
        assert_eq!(m, [false, false]);
    }

    /// Element slices of a two-fluid state with a steep volume-fraction
    /// gradient.
    fn steep_interface(rdof: usize, layout: &VariableLayout) -> (Vec<f64>, Vec<f64>) {
        let mut u = vec![0.0; layout.ncomp() * rdof];
        let mut p = vec![0.0; layout.nprim() * rdof];
        let alpha = [0.5, 0.5];
        let rho = [1.2, 1000.0];
        for k in 0..2 {
            let sign = if k == 0 { 1.0 } else { -1.0 };
            u[layout.volfrac(k) * rdof] = alpha[k];
            u[layout.volfrac(k) * rdof + 1] = sign * 2.0;
            u[layout.density(k) * rdof] = alpha[k] * rho[k];
            u[layout.density(k) * rdof + 2] = 0.3;
            u[layout.energy(k) * rdof] = alpha[k] * 2.5e5;
            p[layout.pressure(k) * rdof] = alpha[k] * 1e5;
        }
        (u, p)
    }

    #[test]
    fn test_pass_bounds_volume_fractions_and_keeps_averages() {
        let materials = two_fluids();
        let layout = VariableLayout::of(&materials);
        for rdof in [4, 10] {
            let points = ReferencePoints::new(rdof).unwrap();
            let (mut u, mut p) = steep_interface(rdof, &layout);
            let before = u.clone();
            let mut f = ElementFactors::ones(layout.ncomp(), layout.nprim());
            assert!(pass(&materials, &points).run(&mut u, &mut p, &mut f));
            for var in 0..layout.ncomp() {
                assert_eq!(u[var * rdof], before[var * rdof]);
            }
            for b in points.check_points() {
                let mut sum = 0.0;
                for k in 0..2 {
                    let v = layout.volfrac(k);
                    let a = eval_modes(&u[v * rdof..(v + 1) * rdof], b);
                    assert!(a >= 1e-14 - TOL && a <= 1.0 - 1e-14 + TOL);
                    sum += a;
                    let r = layout.density(k);
                    assert!(eval_modes(&u[r * rdof..(r + 1) * rdof], b) > 0.0);
                }
                assert!((sum - 1.0).abs() < TOL);
            }
            assert!((0.0..=1.0).contains(&f.cons_p1[layout.volfrac(0)]));
            assert_eq!(f.cons_p1[layout.volfrac(0)], f.cons_p1[layout.volfrac(1)]);
        }
    }

    #[test]
    fn test_consistency_ties_density_to_volume_fraction() {
        let materials = two_fluids();
        let layout = VariableLayout::of(&materials);
        let points = ReferencePoints::new(4).unwrap();
        let (mut u, _) = steep_interface(4, &layout);
        let mut f = ElementFactors::ones(layout.ncomp(), layout.nprim());
        pass(&materials, &points).consistent_limiting(&mut u, &mut f);
        let r = layout.density(1) * 4;
        let a = layout.volfrac(1) * 4;
        assert!((u[r + 1] - 1000.0 * u[a + 1]).abs() < 1e-9);
        assert_eq!(u[r + 2], 0.0);
    }

    #[test]
    fn test_intsharp_exempts_interface_materials() {
        let materials = two_fluids();
        let layout = VariableLayout::of(&materials);
        let points = ReferencePoints::new(4).unwrap();
        let (mut u, mut p) = steep_interface(4, &layout);
        let before = u.clone();
        let mut mm = pass(&materials, &points);
        mm.intsharp = true;
        let mut f = ElementFactors::ones(layout.ncomp(), layout.nprim());
        mm.run(&mut u, &mut p, &mut f);
        let v = layout.volfrac(0) * 4;
        assert_eq!(u[v + 1], before[v + 1]);
    }

    #[test]
    fn test_negative_pressure_is_limited() {
        let materials = Materials::new(vec![StiffenedGas::air().into()]).unwrap();
        let layout = VariableLayout::of(&materials);
        let points = ReferencePoints::new(4).unwrap();
        let mut u = vec![0.0; layout.ncomp() * 4];
        let mut p = vec![0.0; layout.nprim() * 4];
        u[layout.volfrac(0) * 4] = 1.0;
        u[layout.density(0) * 4] = 1.0;
        u[layout.energy(0) * 4] = 2.5e5;
        p[layout.pressure(0) * 4] = 1.0;
        p[layout.pressure(0) * 4 + 1] = 10.0;
        let mut f = ElementFactors::ones(layout.ncomp(), layout.nprim());
        pass(&materials, &points).run(&mut u, &mut p, &mut f);
        let v = layout.pressure(0) * 4;
        for b in points.check_points() {
            assert!(eval_modes(&p[v..v + 4], b) >= -TOL);
        }
    }

    #[test]
    fn test_intsharp_skips_positivity() {
        let materials = Materials::new(vec![StiffenedGas::air().into()]).unwrap();
        let layout = VariableLayout::of(&materials);
        let points = ReferencePoints::new(4).unwrap();
        let mut u = vec![0.0; layout.ncomp() * 4];
        let mut p = vec![0.0; layout.nprim() * 4];
        u[layout.volfrac(0) * 4] = 1.0;
        u[layout.density(0) * 4] = 1.0;
        u[layout.energy(0) * 4] = 2.5e5;
        p[layout.pressure(0) * 4] = 1.0;
        p[layout.pressure(0) * 4 + 1] = 10.0;
        let before = p.clone();
        let mut mm = pass(&materials, &points);
        mm.intsharp = true;
        let mut f = ElementFactors::ones(layout.ncomp(), layout.nprim());
        assert!(!mm.run(&mut u, &mut p, &mut f));
        assert_eq!(p, before);
    }
}
