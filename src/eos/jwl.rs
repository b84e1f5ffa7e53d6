//! Jones-Wilkins-Lee equation of state for detonation products.
//!
//! ```text
//! p(ρ, e) = A (1 - ωρ/(R1 ρ0)) exp(-R1 ρ0/ρ)
//!         + B (1 - ωρ/(R2 ρ0)) exp(-R2 ρ0/ρ) + ωρ (e - e0)
//! ```
//!
//! The thermal part is closed by `e - e0 = c_v T`, so along an isotherm
//! `p(ρ, T) = p_ref(ρ) + ωρ c_v T`. Density from pressure and temperature is
//! found by bisection on that relation within `[1e-6 ρ0, 10 ρ0]`, which
//! excludes the spurious high-compression root of the isotherm.
//!
//! # References
//!
//! - Lee, E. L., Hornig, H. C., & Kury, J. W. (1968). Adiabatic expansion of
//!   high explosive detonation products. UCRL-50422.

use serde::{Deserialize, Serialize};

use super::EquationOfState;
use crate::error::{MaterialState, MultiMatError, Result, check_finite};
use crate::types::{Tensor3, Vec3, dot};

const MAX_BISECTION_ITERS: usize = 200;

/// JWL material parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Jwl {
    /// Reference (unreacted) density.
    pub rho0: f64,
    /// First exponential coefficient.
    pub a: f64,
    /// Second exponential coefficient.
    pub b: f64,
    /// First exponential decay constant.
    pub r1: f64,
    /// Second exponential decay constant.
    pub r2: f64,
    /// Grüneisen coefficient.
    pub omega: f64,
    /// Reference specific internal energy.
    pub e0: f64,
    /// Specific heat at constant volume.
    pub cv: f64,
}

impl Jwl {
    /// TNT products (Dobratz & Crawford).
    pub fn tnt() -> Self {
        Self {
            rho0: 1630.0,
            a: 3.712e11,
            b: 3.231e9,
            r1: 4.15,
            r2: 0.95,
            omega: 0.3,
            e0: 0.0,
            cv: 1000.0,
        }
    }

    /// Reference-curve pressure `p_ref(ρ)` and its density derivative.
    fn reference_pressure(&self, rho: f64) -> (f64, f64) {
        let term = |c: f64, r: f64| {
            let x = r * self.rho0 / rho;
            let ex = (-x).exp();
            let lin = 1.0 - self.omega * rho / (r * self.rho0);
            let dlin = -self.omega / (r * self.rho0);
            // d/dρ exp(-r ρ0/ρ) = exp * r ρ0 / ρ²
            (c * lin * ex, c * (dlin * ex + lin * ex * x / rho))
        };
        let (p1, d1) = term(self.a, self.r1);
        let (p2, d2) = term(self.b, self.r2);
        (p1 + p2, d1 + d2)
    }

    fn pressure_from_internal(&self, rho: f64, e: f64) -> f64 {
        self.reference_pressure(rho).0 + self.omega * rho * (e - self.e0)
    }
}

impl Default for Jwl {
    fn default() -> Self {
        Self::tnt()
    }
}

impl EquationOfState for Jwl {
    fn pressure(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        _defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let rho = arho / alpha;
        let e = (arho_e - 0.5 * arho * dot(vel, vel)) / arho;
        let apr = alpha * self.pressure_from_internal(rho, e);
        check_finite(apr, 0, "pressure", || MaterialState {
            alpha,
            partial_density: arho,
            partial_energy_or_pressure: arho_e,
            velocity: *vel,
        })
    }

    fn sound_speed(
        &self,
        arho: f64,
        apr: f64,
        alpha: f64,
        _defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let rho = arho / alpha;
        let p = apr / alpha;
        let (pref, dpref) = self.reference_pressure(rho);
        // a² = dp/dρ|_e + (p/ρ²) dp/de|_ρ
        let a2 = dpref + (p - pref) / rho + self.omega * p / rho;
        let a = a2.max(f64::MIN_POSITIVE).sqrt();
        check_finite(a, 0, "sound speed", || MaterialState {
            alpha,
            partial_density: arho,
            partial_energy_or_pressure: apr,
            velocity: [0.0; 3],
        })
    }

    fn total_energy(
        &self,
        rho: f64,
        vel: &Vec3,
        pr: f64,
        _defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let (pref, _) = self.reference_pressure(rho);
        let rho_e = rho * self.e0 + (pr - pref) / self.omega + 0.5 * rho * dot(vel, vel);
        check_finite(rho_e, 0, "total energy", || MaterialState {
            alpha: 1.0,
            partial_density: rho,
            partial_energy_or_pressure: pr,
            velocity: *vel,
        })
    }

    fn temperature(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        _defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let e = (arho_e - 0.5 * arho * dot(vel, vel)) / arho;
        let t = (e - self.e0) / self.cv;
        check_finite(t, 0, "temperature", || MaterialState {
            alpha,
            partial_density: arho,
            partial_energy_or_pressure: arho_e,
            velocity: *vel,
        })
    }

    fn density(&self, pr: f64, temp: f64) -> Result<f64> {
        let state = || MaterialState {
            alpha: 1.0,
            partial_density: f64::NAN,
            partial_energy_or_pressure: pr,
            velocity: [0.0; 3],
        };
        check_finite(temp, 0, "temperature", state)?;
        let residual =
            |rho: f64| self.reference_pressure(rho).0 + self.omega * rho * self.cv * temp - pr;

        let mut lo = 1.0e-6 * self.rho0;
        let mut hi = 10.0 * self.rho0;
        let (mut flo, fhi) = (residual(lo), residual(hi));
        if flo * fhi > 0.0 {
            return Err(MultiMatError::non_finite(0, "density", f64::NAN, state()));
        }
        for _ in 0..MAX_BISECTION_ITERS {
            let mid = 0.5 * (lo + hi);
            let fmid = residual(mid);
            if fmid * flo > 0.0 {
                lo = mid;
                flo = fmid;
            } else {
                hi = mid;
            }
            if hi - lo <= 1.0e-14 * hi {
                break;
            }
        }
        Ok(0.5 * (lo + hi))
    }

    fn stiffening_pressure(&self) -> f64 {
        0.0
    }

    fn min_effective_pressure(&self, floor: f64, _alpha: f64) -> f64 {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-8;

    #[test]
    fn test_energy_pressure_round_trip() {
        let eos = Jwl::tnt();
        let vel = [100.0, 0.0, -20.0];
        for &(rho, p) in &[(1630.0, 2.0e10), (800.0, 1.0e9), (100.0, 1.0e6)] {
            let rho_e = eos.total_energy(rho, &vel, p, None).unwrap();
            let ap = eos.pressure(0.5 * rho, &vel, 0.5 * rho_e, 0.5, None).unwrap();
            assert!((ap / 0.5 - p).abs() < TOL * p);
        }
    }

    #[test]
    fn test_density_temperature_round_trip() {
        let eos = Jwl::tnt();
        let vel = [0.0; 3];
        let rho = 1200.0;
        let p = 5.0e9;
        let rho_e = eos.total_energy(rho, &vel, p, None).unwrap();
        let t = eos.temperature(rho, &vel, rho_e, 1.0, None).unwrap();
        let rho_back = eos.density(p, t).unwrap();
        assert!((rho_back - rho).abs() < 1e-6 * rho);
    }

    #[test]
    fn test_sound_speed_positive() {
        let eos = Jwl::tnt();
        let a = eos.sound_speed(1630.0, 2.0e10, 1.0, None).unwrap();
        assert!(a > 1000.0 && a < 20000.0);
    }

    #[test]
    fn test_sound_speed_matches_isentropic_derivative() {
        // a² = dp/dρ along ds = 0, i.e. de = p/ρ² dρ
        let eos = Jwl::tnt();
        let rho = 1500.0;
        let p = 1.0e10;
        let e = (eos.total_energy(rho, &[0.0; 3], p, None).unwrap()) / rho;
        let h = 1e-3;
        let p_plus = eos.pressure_from_internal(rho + h, e + p / (rho * rho) * h);
        let p_minus = eos.pressure_from_internal(rho - h, e - p / (rho * rho) * h);
        let a2_fd = (p_plus - p_minus) / (2.0 * h);
        let a = eos.sound_speed(rho, p, 1.0, None).unwrap();
        assert!((a * a - a2_fd).abs() < 1e-4 * a2_fd);
    }
}
