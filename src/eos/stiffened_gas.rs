//! Stiffened-gas equation of state.
//!
//! ```text
//! p = (γ - 1) ρ e - γ p_c,   ρE = (p + p_c)/(γ - 1) + p_c + ρ|u|²/2
//! T = (ρE - ρ|u|²/2 - p_c) / (ρ c_v)
//! ```
//!
//! With `p_c = 0` this reduces to the calorically perfect ideal gas.
//!
//! # References
//!
//! - Le Métayer, O., Massoni, J., & Saurel, R. (2004). Élaboration des lois
//!   d'état d'un liquide et de sa vapeur pour les modèles d'écoulements
//!   diphasiques. International Journal of Thermal Sciences, 43(3), 265-276.

use serde::{Deserialize, Serialize};

use super::EquationOfState;
use crate::error::{MaterialState, Result, check_finite};
use crate::types::{Tensor3, Vec3, dot};

/// Floor on the effective pressure `αp + αp_c` inside the sound speed.
const SOUND_SPEED_PRESSURE_FLOOR: f64 = 1.0e-15;

/// Stiffened-gas material parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StiffenedGas {
    /// Ratio of specific heats.
    pub gamma: f64,
    /// Stiffening pressure.
    pub pstiff: f64,
    /// Specific heat at constant volume.
    pub cv: f64,
}

impl StiffenedGas {
    /// Create a stiffened gas.
    pub fn new(gamma: f64, pstiff: f64, cv: f64) -> Self {
        Self { gamma, pstiff, cv }
    }

    /// Ideal gas with the given ratio of specific heats.
    pub fn ideal(gamma: f64, cv: f64) -> Self {
        Self::new(gamma, 0.0, cv)
    }

    /// Air at standard conditions.
    pub fn air() -> Self {
        Self::ideal(1.4, 717.5)
    }

    /// Water as a stiffened gas.
    pub fn water() -> Self {
        Self::new(4.4, 6.0e8, 1000.0)
    }

    /// Partial pressure from a partial internal energy `arho_ei` that already
    /// excludes kinetic (and any elastic) energy.
    #[inline]
    pub(crate) fn partial_pressure_from_internal(&self, arho_ei: f64, alpha: f64) -> f64 {
        (arho_ei - alpha * self.pstiff) * (self.gamma - 1.0) - alpha * self.pstiff
    }

    #[inline]
    pub(crate) fn sound_speed_squared(&self, arho: f64, apr: f64, alpha: f64) -> f64 {
        let p_eff = (apr + alpha * self.pstiff).max(SOUND_SPEED_PRESSURE_FLOOR);
        self.gamma * p_eff / arho
    }
}

impl EquationOfState for StiffenedGas {
    fn pressure(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        _defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let apr = self.partial_pressure_from_internal(arho_e - 0.5 * arho * dot(vel, vel), alpha);
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
        let a = self.sound_speed_squared(arho, apr, alpha).sqrt();
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
        let rho_e =
            (pr + self.pstiff) / (self.gamma - 1.0) + 0.5 * rho * dot(vel, vel) + self.pstiff;
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
        let t = (arho_e - 0.5 * arho * dot(vel, vel) - alpha * self.pstiff) / (arho * self.cv);
        check_finite(t, 0, "temperature", || MaterialState {
            alpha,
            partial_density: arho,
            partial_energy_or_pressure: arho_e,
            velocity: *vel,
        })
    }

    fn density(&self, pr: f64, temp: f64) -> Result<f64> {
        let rho = (pr + self.pstiff) / ((self.gamma - 1.0) * self.cv * temp);
        check_finite(rho, 0, "density", || MaterialState {
            alpha: 1.0,
            partial_density: f64::NAN,
            partial_energy_or_pressure: pr,
            velocity: [0.0; 3],
        })
    }

    fn stiffening_pressure(&self) -> f64 {
        self.pstiff
    }

    fn min_effective_pressure(&self, floor: f64, alpha: f64) -> f64 {
        floor - alpha * self.pstiff
    }
}
