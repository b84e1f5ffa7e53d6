//! Equations of state for the material block.
//!
//! Every material carries one closure relation. All quantities are passed in
//! *partial* form (`α ρ`, `α ρ E`, `α p`) except where noted, matching the
//! conserved and primitive storage. Non-finite results are reported as
//! [`MultiMatError::NonFinite`].
//!
//! Available closures:
//! - [`StiffenedGas`]: ideal and stiffened gases
//! - [`Jwl`]: Jones-Wilkins-Lee detonation products
//! - [`SmallShearSolid`]: stiffened gas with a linear shear response
//!
//! [`MaterialEos`] is the closed set dispatched by `match`; [`Materials`] is
//! the immutable block shared by every stage.

mod jwl;
mod small_shear_solid;
mod stiffened_gas;

pub use jwl::Jwl;
pub use small_shear_solid::SmallShearSolid;
pub use stiffened_gas::StiffenedGas;

use serde::{Deserialize, Serialize};

use crate::error::{MultiMatError, Result};
use crate::types::{Tensor3, Vec3};

/// Closure relation of one material.
pub trait EquationOfState {
    /// Partial pressure `α p` from partial density, bulk velocity and partial
    /// total energy.
    fn pressure(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64>;

    /// Material sound speed from partial density and partial pressure.
    fn sound_speed(&self, arho: f64, apr: f64, alpha: f64, defgrad: Option<&Tensor3>)
    -> Result<f64>;

    /// Material total energy per unit volume `ρ E` from *material* density
    /// and pressure.
    fn total_energy(&self, rho: f64, vel: &Vec3, pr: f64, defgrad: Option<&Tensor3>)
    -> Result<f64>;

    /// Material temperature.
    fn temperature(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64>;

    /// Material density from pressure and temperature.
    fn density(&self, pr: f64, temp: f64) -> Result<f64>;

    /// Stiffening pressure `p_c` (zero when the closure has none).
    fn stiffening_pressure(&self) -> f64;

    /// Lower bound for the partial pressure used by positivity limiting.
    fn min_effective_pressure(&self, floor: f64, alpha: f64) -> f64;

    /// Partial Cauchy stress `α σ`. Fluids carry only the isotropic part.
    fn cauchy_stress(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<Tensor3> {
        let apr = self.pressure(arho, vel, arho_e, alpha, defgrad)?;
        Ok([[-apr, 0.0, 0.0], [0.0, -apr, 0.0], [0.0, 0.0, -apr]])
    }

    /// Whether the material transports an inverse deformation gradient.
    fn is_solid(&self) -> bool {
        false
    }
}

/// The closed set of supported closures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eos", rename_all = "snake_case")]
pub enum MaterialEos {
    StiffenedGas(StiffenedGas),
    Jwl(Jwl),
    SmallShearSolid(SmallShearSolid),
}

macro_rules! dispatch {
    ($self:expr, $eos:ident => $body:expr) => {
        match $self {
            MaterialEos::StiffenedGas($eos) => $body,
            MaterialEos::Jwl($eos) => $body,
            MaterialEos::SmallShearSolid($eos) => $body,
        }
    };
}

impl EquationOfState for MaterialEos {
    fn pressure(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        dispatch!(self, eos => eos.pressure(arho, vel, arho_e, alpha, defgrad))
    }

    fn sound_speed(
        &self,
        arho: f64,
        apr: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        dispatch!(self, eos => eos.sound_speed(arho, apr, alpha, defgrad))
    }

    fn total_energy(
        &self,
        rho: f64,
        vel: &Vec3,
        pr: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        dispatch!(self, eos => eos.total_energy(rho, vel, pr, defgrad))
    }

    fn temperature(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        dispatch!(self, eos => eos.temperature(arho, vel, arho_e, alpha, defgrad))
    }

    fn density(&self, pr: f64, temp: f64) -> Result<f64> {
        dispatch!(self, eos => eos.density(pr, temp))
    }

    fn stiffening_pressure(&self) -> f64 {
        dispatch!(self, eos => eos.stiffening_pressure())
    }

    fn min_effective_pressure(&self, floor: f64, alpha: f64) -> f64 {
        dispatch!(self, eos => eos.min_effective_pressure(floor, alpha))
    }

    fn cauchy_stress(
        &self,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<Tensor3> {
        dispatch!(self, eos => eos.cauchy_stress(arho, vel, arho_e, alpha, defgrad))
    }

    fn is_solid(&self) -> bool {
        dispatch!(self, eos => eos.is_solid())
    }
}

impl MaterialEos {
    /// Sound speed along the face normal given the inverse deformation
    /// gradient rotated into the face frame. Fluids ignore `gn`.
    pub fn directional_sound_speed(
        &self,
        arho: f64,
        apr: f64,
        alpha: f64,
        gn: &Tensor3,
    ) -> Result<f64> {
        match self {
            Self::SmallShearSolid(solid) => solid.directional_sound_speed(arho, apr, alpha, gn),
            other => other.sound_speed(arho, apr, alpha, None),
        }
    }
}

impl From<StiffenedGas> for MaterialEos {
    fn from(eos: StiffenedGas) -> Self {
        Self::StiffenedGas(eos)
    }
}

impl From<Jwl> for MaterialEos {
    fn from(eos: Jwl) -> Self {
        Self::Jwl(eos)
    }
}

impl From<SmallShearSolid> for MaterialEos {
    fn from(eos: SmallShearSolid) -> Self {
        Self::SmallShearSolid(eos)
    }
}

/// Immutable material block: one closure per material plus the map from
/// material id to solid slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Materials {
    eos: Vec<MaterialEos>,
    solid_slot: Vec<Option<usize>>,
}

impl Materials {
    /// Build the block. At least one material is required.
    pub fn new(eos: Vec<MaterialEos>) -> Result<Self> {
        if eos.is_empty() {
            return Err(MultiMatError::invalid_config("at least one material is required"));
        }
        let mut next = 0;
        let solid_slot = eos
            .iter()
            .map(|m| {
                m.is_solid().then(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();
        Ok(Self { eos, solid_slot })
    }

    /// Number of materials.
    #[inline]
    pub fn nmat(&self) -> usize {
        self.eos.len()
    }

    /// Number of solid materials.
    pub fn nsolid(&self) -> usize {
        self.solid_slot.iter().filter(|s| s.is_some()).count()
    }

    /// Solid slot of material `k`, if it is a solid.
    #[inline]
    pub fn solid_slot(&self, k: usize) -> Option<usize> {
        self.solid_slot[k]
    }

    /// Closure of material `k`.
    #[inline]
    pub fn get(&self, k: usize) -> &MaterialEos {
        &self.eos[k]
    }

    /// Iterate over the closures.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialEos> {
        self.eos.iter()
    }

    /// Partial pressure of material `k`.
    pub fn pressure(
        &self,
        k: usize,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        self.eos[k]
            .pressure(arho, vel, arho_e, alpha, defgrad)
            .map_err(|e| e.for_material(k))
    }

    /// Sound speed of material `k`.
    pub fn sound_speed(
        &self,
        k: usize,
        arho: f64,
        apr: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        self.eos[k]
            .sound_speed(arho, apr, alpha, defgrad)
            .map_err(|e| e.for_material(k))
    }

    /// Directional sound speed of material `k`.
    pub fn directional_sound_speed(
        &self,
        k: usize,
        arho: f64,
        apr: f64,
        alpha: f64,
        gn: &Tensor3,
    ) -> Result<f64> {
        self.eos[k]
            .directional_sound_speed(arho, apr, alpha, gn)
            .map_err(|e| e.for_material(k))
    }

    /// Material total energy `ρ E` of material `k`.
    pub fn total_energy(
        &self,
        k: usize,
        rho: f64,
        vel: &Vec3,
        pr: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        self.eos[k]
            .total_energy(rho, vel, pr, defgrad)
            .map_err(|e| e.for_material(k))
    }

    /// Temperature of material `k`.
    pub fn temperature(
        &self,
        k: usize,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<f64> {
        self.eos[k]
            .temperature(arho, vel, arho_e, alpha, defgrad)
            .map_err(|e| e.for_material(k))
    }

    /// Density of material `k` from pressure and temperature.
    pub fn density(&self, k: usize, pr: f64, temp: f64) -> Result<f64> {
        self.eos[k].density(pr, temp).map_err(|e| e.for_material(k))
    }

    /// Partial Cauchy stress of material `k`.
    pub fn cauchy_stress(
        &self,
        k: usize,
        arho: f64,
        vel: &Vec3,
        arho_e: f64,
        alpha: f64,
        defgrad: Option<&Tensor3>,
    ) -> Result<Tensor3> {
        self.eos[k]
            .cauchy_stress(arho, vel, arho_e, alpha, defgrad)
            .map_err(|e| e.for_material(k))
    }

    /// Positivity floor on the partial pressure of material `k`.
    #[inline]
    pub fn min_effective_pressure(&self, k: usize, floor: f64, alpha: f64) -> f64 {
        self.eos[k].min_effective_pressure(floor, alpha)
    }

    /// Stiffening pressure of material `k`.
    #[inline]
    pub fn stiffening_pressure(&self, k: usize) -> f64 {
        self.eos[k].stiffening_pressure()
    }
}
