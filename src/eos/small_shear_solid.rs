//! Stiffened-gas solid with a small-strain shear response.
//!
//! The volumetric response is a stiffened gas; the deviatoric response is
//! linear in the Almansi strain `ε = (I - gᵀg)/2`, where `g` is the inverse
//! deformation gradient:
//!
//! ```text
//! ρ e_el = μ dev(ε):dev(ε),   σ = -p I + 2 μ dev(ε)
//! ```
//!
//! The elastic energy is part of the stored total energy, so pressure and
//! temperature subtract it before applying the stiffened-gas relations.
//!
//! # References
//!
//! - Barton, P. T. (2019). An interface-capturing Godunov method for the
//!   simulation of compressible solid-fluid problems. Journal of
//!   Computational Physics, 390, 25-50.

use serde::{Deserialize, Serialize};

use super::{EquationOfState, StiffenedGas};
use crate::error::{MaterialState, Result, check_finite};
use crate::types::{IDENTITY, Tensor3, Vec3, dot};

/// Solid material parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmallShearSolid {
    /// Ratio of specific heats.
    pub gamma: f64,
    /// Stiffening pressure.
    pub pstiff: f64,
    /// Specific heat at constant volume.
    pub cv: f64,
    /// Shear modulus.
    pub mu: f64,
}

impl SmallShearSolid {
    /// Create a solid.
    pub fn new(gamma: f64, pstiff: f64, cv: f64, mu: f64) -> Self {
        Self {
            gamma,
            pstiff,
            cv,
            mu,
        }
    }

    /// Copper-like parameters.
    pub fn copper() -> Self {
        Self::new(2.0, 4.0e10, 393.0, 5.0e10)
    }

    fn volumetric(&self) -> StiffenedGas {
        StiffenedGas::new(self.gamma, self.pstiff, self.cv)
    }

    /// Deviatoric Almansi strain of the inverse deformation gradient.
    pub fn deviatoric_strain(g: &Tensor3) -> Tensor3 {
        let mut eps = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                let gtg: f64 = (0..3).map(|k| g[k][i] * g[k][j]).sum();
                eps[i][j] = 0.5 * (IDENTITY[i][j] - gtg);
            }
        }
        let tr = (eps[0][0] + eps[1][1] + eps[2][2]) / 3.0;
        for (i, row) in eps.iter_mut().enumerate() {
            row[i] -= tr;
        }
        eps
    }

    /// Elastic energy per unit material volume.
    pub fn elastic_energy(&self, g: &Tensor3) -> f64 {
        let dev = Self::deviatoric_strain(g);
        self.mu * dev.iter().flatten().map(|e| e * e).sum::<f64>()
    }

    /// Sound speed in the direction of the first axis of the rotated
    /// inverse deformation gradient `gn`.
    pub fn directional_sound_speed(
        &self,
        arho: f64,
        apr: f64,
        alpha: f64,
        gn: &Tensor3,
    ) -> Result<f64> {
        let a2 = self.volumetric().sound_speed_squared(arho, apr, alpha)
            + alpha * 4.0 / 3.0 * self.mu * gn[0][0] * gn[0][0] / arho;
        check_finite(a2.sqrt(), 0, "sound speed", || MaterialState {
            alpha,
            partial_density: arho,
            partial_energy_or_pressure: apr,
            velocity: [0.0; 3],
        })
    }
}

impl EquationOfState for SmallShearSolid {
    fn pressure(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let g = defgrad.unwrap_or(&IDENTITY);
        let arho_ei = arho_e - 0.5 * arho * dot(vel, vel) - alpha * self.elastic_energy(g);
        let apr = self.volumetric().partial_pressure_from_internal(arho_ei, alpha);
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
        self.directional_sound_speed(arho, apr, alpha, &IDENTITY)
    }

    fn total_energy(
        &self,
        rho: f64,
        vel: &Vec3,
        pr: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let g = defgrad.unwrap_or(&IDENTITY);
        Ok(self.volumetric().total_energy(rho, vel, pr, None)? + self.elastic_energy(g))
    }

    fn temperature(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        let g = defgrad.unwrap_or(&IDENTITY);
        self.volumetric()
            .temperature(arho, vel, arho_e - alpha * self.elastic_energy(g), alpha, None)
    }

    fn density(&self, pr: f64, temp: f64) -> Result<f64> {
        self.volumetric().density(pr, temp)
    }

    fn stiffening_pressure(&self) -> f64 {
        self.pstiff
    }

    fn min_effective_pressure(&self, floor: f64, alpha: f64) -> f64 {
        floor - alpha * self.pstiff
    }

    fn cauchy_stress(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<Tensor3> {
        let g = defgrad.unwrap_or(&IDENTITY);
        let apr = self.pressure(arho, vel, arho_e, alpha, Some(g))?;
        let dev = Self::deviatoric_strain(g);
        let mut sigma = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                sigma[i][j] = 2.0 * alpha * self.mu * dev[i][j];
            }
            sigma[i][i] -= apr;
        }
        Ok(sigma)
    }

    fn is_solid(&self) -> bool {
        true
    }
}
