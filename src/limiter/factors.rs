//! Per-element limiter coefficients.

use crate::basis::TaylorFrame;
use crate::state::VariableLayout;

/// Limiter coefficients of one element: one set for the linear dofs and one
/// for the quadratic dofs, for the conserved and the primitive variables.
///
/// Every coefficient lies in `[0, 1]`. Sub-passes only ever lower them
/// (intersection by `min`), except for the explicit unification steps.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementFactors {
    /// Linear-dof coefficients of the conserved variables.
    pub cons_p1: Vec<f64>,
    /// Quadratic-dof coefficients of the conserved variables.
    pub cons_p2: Vec<f64>,
    /// Linear-dof coefficients of the primitive variables.
    pub prim_p1: Vec<f64>,
    /// Quadratic-dof coefficients of the primitive variables.
    pub prim_p2: Vec<f64>,
}

impl ElementFactors {
    /// No limiting.
    pub fn ones(ncomp: usize, nprim: usize) -> Self {
        Self {
            cons_p1: vec![1.0; ncomp],
            cons_p2: vec![1.0; ncomp],
            prim_p1: vec![1.0; nprim],
            prim_p2: vec![1.0; nprim],
        }
    }

    /// Reset every coefficient to 1.
    pub fn reset(&mut self) {
        for v in self
            .cons_p1
            .iter_mut()
            .chain(self.cons_p2.iter_mut())
            .chain(self.prim_p1.iter_mut())
            .chain(self.prim_p2.iter_mut())
        {
            *v = 1.0;
        }
    }

    /// Lower both coefficients of conserved variable `var` to at most `phi`.
    #[inline]
    pub fn limit_cons(&mut self, var: usize, phi: f64) {
        let phi = phi.clamp(0.0, 1.0);
        self.cons_p1[var] = self.cons_p1[var].min(phi);
        self.cons_p2[var] = self.cons_p2[var].min(phi);
    }

    /// Lower both coefficients of primitive variable `var` to at most `phi`.
    #[inline]
    pub fn limit_prim(&mut self, var: usize, phi: f64) {
        let phi = phi.clamp(0.0, 1.0);
        self.prim_p1[var] = self.prim_p1[var].min(phi);
        self.prim_p2[var] = self.prim_p2[var].min(phi);
    }

    /// Intersect with another set of coefficients.
    pub fn intersect(&mut self, other: &ElementFactors) {
        fn min_into(a: &mut [f64], b: &[f64]) {
            for (x, y) in a.iter_mut().zip(b) {
                *x = x.min(*y);
            }
        }
        min_into(&mut self.cons_p1, &other.cons_p1);
        min_into(&mut self.cons_p2, &other.cons_p2);
        min_into(&mut self.prim_p1, &other.prim_p1);
        min_into(&mut self.prim_p2, &other.prim_p2);
    }

    /// Smallest linear and quadratic volume-fraction coefficients.
    pub fn volume_fraction_min(&self, layout: &VariableLayout) -> (f64, f64) {
        (0..layout.nmat()).fold((1.0_f64, 1.0_f64), |(p1, p2), k| {
            let v = layout.volfrac(k);
            (p1.min(self.cons_p1[v]), p2.min(self.cons_p2[v]))
        })
    }

    /// Give every volume fraction the smallest coefficient among them, so
    /// that the limited fractions still sum to one.
    pub fn unify_volume_fractions(&mut self, layout: &VariableLayout) {
        let (p1, p2) = self.volume_fraction_min(layout);
        for k in 0..layout.nmat() {
            self.cons_p1[layout.volfrac(k)] = p1;
            self.cons_p2[layout.volfrac(k)] = p2;
        }
    }

    /// Whether no coefficient is below one.
    pub fn is_unlimited(&self) -> bool {
        self.cons_p1
            .iter()
            .chain(&self.cons_p2)
            .chain(&self.prim_p1)
            .chain(&self.prim_p2)
            .all(|&v| v >= 1.0)
    }

    /// Scale the Dubiner dofs of one element in place: dofs 1..4 by the
    /// linear coefficient, dofs 4.. by the quadratic one.
    ///
    /// `u` and `p` are element slices laid out `var * rdof + dof`.
    pub fn apply_dubiner(&self, u: &mut [f64], p: &mut [f64], rdof: usize) {
        scale_dofs(u, rdof, &self.cons_p1, &self.cons_p2);
        scale_dofs(p, rdof, &self.prim_p1, &self.prim_p2);
    }

    /// Scale in Taylor space: convert every variable to Taylor
    /// coefficients of `frame`, scale first and second derivatives, convert
    /// back.
    pub fn apply_taylor(&self, frame: &TaylorFrame, u: &mut [f64], p: &mut [f64], rdof: usize) {
        scale_taylor(frame, u, rdof, &self.cons_p1, &self.cons_p2);
        scale_taylor(frame, p, rdof, &self.prim_p1, &self.prim_p2);
    }
}

fn scale_dofs(data: &mut [f64], rdof: usize, p1: &[f64], p2: &[f64]) {
    for (var, modes) in data.chunks_exact_mut(rdof).enumerate() {
        for m in modes.iter_mut().take(rdof.min(4)).skip(1) {
            *m *= p1[var];
        }
        for m in modes.iter_mut().skip(4) {
            *m *= p2[var];
        }
    }
}

fn scale_taylor(frame: &TaylorFrame, data: &mut [f64], rdof: usize, p1: &[f64], p2: &[f64]) {
    for (var, modes) in data.chunks_exact_mut(rdof).enumerate() {
        if p1[var] >= 1.0 && p2[var] >= 1.0 {
            continue;
        }
        let mut t = frame.dubiner_to_taylor(modes);
        for ti in t.iter_mut().take(rdof.min(4)).skip(1) {
            *ti *= p1[var];
        }
        for ti in t.iter_mut().take(rdof).skip(4) {
            *ti *= p2[var];
        }
        let d = frame.taylor_to_dubiner(&t);
        // the average is untouched by construction; keep it bit-exact
        modes[1..].copy_from_slice(&d[1..rdof]);
    }
}
