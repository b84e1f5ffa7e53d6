//! Fixed quadrature rules on the reference tetrahedron and triangle.
//!
//! Weights are normalized to sum to one, so a rule integrates the
//! *average* of a function; multiply by the element volume (or face area)
//! to obtain the integral.
//!
//! Rule selection follows the polynomial order of the solution:
//!
//! | ndof | volume rule      | face rule        |
//! |------|------------------|------------------|
//! | 1    | 1 point (deg 1)  | 1 point (deg 1)  |
//! | 4    | 4 points (deg 2) | 3 points (deg 2) |
//! | 10   | 14 points (deg 5)| 6 points (deg 4) |
//!
//! # References
//!
//! - Keast, P. (1986). Moderate-degree tetrahedral quadrature formulas.
//!   Computer Methods in Applied Mechanics and Engineering, 55(3), 339-348.
//! - Dunavant, D. A. (1985). High degree efficient symmetrical Gaussian
//!   quadrature rules for the triangle. IJNME, 21(6), 1129-1148.

mod tetrahedron;
mod triangle;

pub use tetrahedron::{TET_1, TET_4, TET_14};
pub use triangle::{TRI_1, TRI_3, TRI_6, face_point, face_point_to_reference};

use crate::error::{MultiMatError, Result};

/// A quadrature rule with `D`-dimensional reference points.
#[derive(Clone, Copy, Debug)]
pub struct QuadratureRule<const D: usize> {
    /// Reference coordinates of the points.
    pub points: &'static [[f64; D]],
    /// Weights, summing to one.
    pub weights: &'static [f64],
}

impl<const D: usize> QuadratureRule<D> {
    /// Number of quadrature points.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the rule has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate over (point, weight) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64; D], f64)> + '_ {
        self.points.iter().zip(self.weights.iter().copied())
    }
}

/// Volume rule on the reference tetrahedron.
pub type TetRule = QuadratureRule<3>;

/// Face rule on the reference triangle.
pub type TriRule = QuadratureRule<2>;

/// Volume quadrature rule for a solution with `ndof` degrees of freedom.
pub fn volume_rule(ndof: usize) -> Result<TetRule> {
    match ndof {
        1 => Ok(TET_1),
        4 => Ok(TET_4),
        10 => Ok(TET_14),
        _ => Err(MultiMatError::InvalidOrder { ndof }),
    }
}

/// Face quadrature rule for a solution with `ndof` degrees of freedom.
pub fn face_rule(ndof: usize) -> Result<TriRule> {
    match ndof {
        1 => Ok(TRI_1),
        4 => Ok(TRI_3),
        10 => Ok(TRI_6),
        _ => Err(MultiMatError::InvalidOrder { ndof }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-13;

    /// Exact average of x^a y^b z^c over the reference tetrahedron:
    /// 6 * a! b! c! / (a + b + c + 3)!
    fn tet_monomial_average(a: u32, b: u32, c: u32) -> f64 {
        fn fact(n: u32) -> f64 {
            (1..=n).map(|k| k as f64).product()
        }
        6.0 * fact(a) * fact(b) * fact(c) / fact(a + b + c + 3)
    }

    /// Exact average of x^a y^b over the reference triangle:
    /// 2 * a! b! / (a + b + 2)!
    fn tri_monomial_average(a: u32, b: u32) -> f64 {
        fn fact(n: u32) -> f64 {
            (1..=n).map(|k| k as f64).product()
        }
        2.0 * fact(a) * fact(b) / fact(a + b + 2)
    }

    fn check_tet(rule: TetRule, degree: u32) {
        for a in 0..=degree {
            for b in 0..=(degree - a) {
                for c in 0..=(degree - a - b) {
                    let q: f64 = rule
                        .iter()
                        .map(|(p, w)| {
                            w * p[0].powi(a as i32) * p[1].powi(b as i32) * p[2].powi(c as i32)
                        })
                        .sum();
                    let exact = tet_monomial_average(a, b, c);
                    assert!(
                        (q - exact).abs() < TOL,
                        "x^{a} y^{b} z^{c}: {q} vs {exact}"
                    );
                }
            }
        }
    }

    fn check_tri(rule: TriRule, degree: u32) {
        for a in 0..=degree {
            for b in 0..=(degree - a) {
                let q: f64 = rule
                    .iter()
                    .map(|(p, w)| w * p[0].powi(a as i32) * p[1].powi(b as i32))
                    .sum();
                let exact = tri_monomial_average(a, b);
                assert!((q - exact).abs() < 1e-12, "x^{a} y^{b}: {q} vs {exact}");
            }
        }
    }

    #[test]
    fn test_tet_rules_exactness() {
        check_tet(TET_1, 1);
        check_tet(TET_4, 2);
        check_tet(TET_14, 5);
    }

    #[test]
    fn test_tri_rules_exactness() {
        check_tri(TRI_1, 1);
        check_tri(TRI_3, 2);
        check_tri(TRI_6, 4);
    }

    #[test]
    fn test_weights_sum_to_one() {
        for ndof in [1, 4, 10] {
            let v: f64 = volume_rule(ndof).unwrap().weights.iter().sum();
            let f: f64 = face_rule(ndof).unwrap().weights.iter().sum();
            assert!((v - 1.0).abs() < TOL);
            assert!((f - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_order() {
        assert!(matches!(
            volume_rule(3),
            Err(MultiMatError::InvalidOrder { ndof: 3 })
        ));
        assert!(face_rule(0).is_err());
    }
}
