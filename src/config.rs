//! Immutable configuration of the discretization.
//!
//! A [`DiscretizationConfig`] is built once (by hand with the `with_*`
//! builders, or deserialized by a configuration collaborator) and passed by
//! reference to every stage.
//!
//! # Example
//!
//! ```
//! use multimat_dg::config::{DiscretizationConfig, LimiterKind, MaterialConfig, Scheme};
//! use multimat_dg::eos::StiffenedGas;
//!
//! let config = DiscretizationConfig::new(
//!     Scheme::DgP1,
//!     vec![
//!         MaterialConfig::new("air", StiffenedGas::air()),
//!         MaterialConfig::new("water", StiffenedGas::water()),
//!     ],
//! )
//! .with_limiter(LimiterKind::VertexBased)
//! .with_cfl(0.2);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::eos::{MaterialEos, Materials};
use crate::error::{MultiMatError, Result};

/// Discretization family: stored dofs (`ndof`) and reconstructed dofs
/// (`rdof`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// First-order finite volume.
    P0,
    /// Finite volume with least-squares linear reconstruction.
    P0P1,
    /// Linear DG.
    DgP1,
    /// Quadratic DG.
    DgP2,
}

impl Scheme {
    /// Stored degrees of freedom per variable.
    pub fn ndof(self) -> usize {
        match self {
            Self::P0 | Self::P0P1 => 1,
            Self::DgP1 => 4,
            Self::DgP2 => 10,
        }
    }

    /// Degrees of freedom after reconstruction.
    pub fn rdof(self) -> usize {
        match self {
            Self::P0 => 1,
            Self::P0P1 | Self::DgP1 => 4,
            Self::DgP2 => 10,
        }
    }

    /// Polynomial order of the reconstructed solution.
    pub fn order(self) -> usize {
        match self.rdof() {
            1 => 0,
            4 => 1,
            _ => 2,
        }
    }
}

/// Slope-limiting strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterKind {
    /// No limiting.
    NoLimiter,
    /// Superbee on linear dofs.
    SuperbeeP1,
    /// WENO blending of linear dofs.
    WenoP1,
    /// Vertex-based (Kuzmin) limiting; hierarchical for quadratic DG.
    VertexBased,
}

/// Numerical flux at faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxKind {
    /// Lax-Friedrichs for fluids.
    LaxFriedrichs,
    /// Lax-Friedrichs with Cauchy tractions and deformation-gradient fluxes.
    LaxFriedrichsSolids,
}

/// Gate between full limiting and minor-material limiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockDetector {
    /// Every element is treated as shocked.
    Always,
    /// Modal decay of the bulk density.
    SpectralDecay,
    /// Jump of the bulk-density flux across faces.
    FluxJump,
}

/// Reconstruction / limiting stencil.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StencilKind {
    /// Face neighbors.
    Face,
    /// All elements sharing a vertex.
    Nodal,
}

/// Boundary treatment of one side set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryKind {
    /// Prescribed state supplied at runtime.
    Dirichlet,
    /// Slip wall.
    Symmetry,
    /// Characteristic far field with prescribed back pressure.
    Farfield { pressure: f64 },
    /// Zero-gradient outflow.
    Extrapolate,
}

/// Side-set to boundary treatment mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// Side-set id in the mesh.
    pub sideset: usize,
    /// Boundary treatment.
    pub kind: BoundaryKind,
}

impl BoundaryConfig {
    /// Create a boundary mapping.
    pub fn new(sideset: usize, kind: BoundaryKind) -> Self {
        Self { sideset, kind }
    }
}

/// One material: a label and its closure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Human-readable label used in logs.
    pub name: String,
    /// Equation of state.
    #[serde(flatten)]
    pub eos: MaterialEos,
}

impl MaterialConfig {
    /// Create a material.
    pub fn new(name: impl Into<String>, eos: impl Into<MaterialEos>) -> Self {
        Self {
            name: name.into(),
            eos: eos.into(),
        }
    }
}

/// Empirical thresholds of the limiter engine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterThresholds {
    /// Band `(al_band, 1 - al_band)` of the majority volume fraction inside
    /// which the consistency fix applies.
    pub al_band: f64,
    /// Volume fraction bound of the interface indicator.
    pub interface_bound: f64,
    /// Materials below this volume fraction are minor.
    pub minor_material: f64,
    /// Spectral-decay indicator threshold.
    pub spectral_decay: f64,
    /// Flux-jump indicator threshold.
    pub flux_jump: f64,
    /// Volume fractions are kept in `[bound, 1 - bound]`.
    pub volfrac_bound: f64,
    /// Positivity floor for density, energy and pressure.
    pub positivity_floor: f64,
}

impl Default for LimiterThresholds {
    fn default() -> Self {
        Self {
            al_band: 1.0e-4,
            interface_bound: 2.0e-8,
            minor_material: 1.0e-4,
            spectral_decay: 10f64.powf(-5.7),
            flux_jump: 1.0e-6,
            volfrac_bound: 1.0e-14,
            positivity_floor: 1.0e-15,
        }
    }
}

/// Empirical thresholds of the trace-material cleanup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupThresholds {
    /// Materials below this volume fraction are reset to the majority
    /// pressure.
    pub al_eps: f64,
    /// Volume fraction assigned to materials that became negative.
    pub alpha_floor: f64,
    /// Floor on the majority pressure.
    pub pressure_floor: f64,
}

impl Default for CleanupThresholds {
    fn default() -> Self {
        Self {
            al_eps: 1.0e-2,
            alpha_floor: 1.0e-14,
            pressure_floor: 1.0e-14,
        }
    }
}

/// Finite-rate pressure relaxation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxationConfig {
    /// Whether the relaxation source is added to the residual.
    pub enabled: bool,
    /// Time-scale factor `ct` in `τ = max_k(ct Δx / a_k)`.
    pub time_scale_factor: f64,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time_scale_factor: 1.0,
        }
    }
}

/// Configuration of the whole discretization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscretizationConfig {
    /// Discretization family.
    pub scheme: Scheme,
    /// Materials in storage order.
    pub materials: Vec<MaterialConfig>,
    /// Slope limiter.
    #[serde(default = "default_limiter")]
    pub limiter: LimiterKind,
    /// Numerical flux.
    #[serde(default = "default_flux")]
    pub flux: FluxKind,
    /// Shock detector gating full limiting.
    #[serde(default = "default_shock_detector")]
    pub shock_detector: ShockDetector,
    /// Reconstruction stencil.
    #[serde(default = "default_stencil")]
    pub stencil: StencilKind,
    /// CFL number.
    #[serde(default = "default_cfl")]
    pub cfl: f64,
    /// Interface sharpening toggle.
    #[serde(default)]
    pub intsharp: bool,
    /// Accuracy-test mode: skip the consistency fix.
    #[serde(default)]
    pub accuracy_test: bool,
    /// Reconstruct volume fractions in DG modes.
    #[serde(default)]
    pub reconstruct_volume_fractions: bool,
    /// Superbee compression parameter (1 = minmod, 2 = superbee).
    #[serde(default = "default_superbee_beta")]
    pub superbee_beta: f64,
    /// Weight of the central stencil in WENO.
    #[serde(default = "default_weno_central_weight")]
    pub weno_central_weight: f64,
    /// Pressure relaxation.
    #[serde(default)]
    pub relaxation: RelaxationConfig,
    /// Boundary treatments per side set.
    #[serde(default)]
    pub boundaries: Vec<BoundaryConfig>,
    /// Limiter thresholds.
    #[serde(default)]
    pub limiter_thresholds: LimiterThresholds,
    /// Cleanup thresholds.
    #[serde(default)]
    pub cleanup_thresholds: CleanupThresholds,
}

fn default_limiter() -> LimiterKind {
    LimiterKind::VertexBased
}

fn default_flux() -> FluxKind {
    FluxKind::LaxFriedrichs
}

fn default_shock_detector() -> ShockDetector {
    ShockDetector::Always
}

fn default_stencil() -> StencilKind {
    StencilKind::Face
}

fn default_cfl() -> f64 {
    0.3
}

fn default_superbee_beta() -> f64 {
    2.0
}

fn default_weno_central_weight() -> f64 {
    1000.0
}

impl DiscretizationConfig {
    /// Create a configuration with default settings.
    pub fn new(scheme: Scheme, materials: Vec<MaterialConfig>) -> Self {
        let flux = if materials.iter().any(|m| matches!(m.eos, MaterialEos::SmallShearSolid(_))) {
            FluxKind::LaxFriedrichsSolids
        } else {
            default_flux()
        };
        Self {
            scheme,
            materials,
            limiter: default_limiter(),
            flux,
            shock_detector: default_shock_detector(),
            stencil: default_stencil(),
            cfl: default_cfl(),
            intsharp: false,
            accuracy_test: false,
            reconstruct_volume_fractions: false,
            superbee_beta: default_superbee_beta(),
            weno_central_weight: default_weno_central_weight(),
            relaxation: RelaxationConfig::default(),
            boundaries: Vec::new(),
            limiter_thresholds: LimiterThresholds::default(),
            cleanup_thresholds: CleanupThresholds::default(),
        }
    }

    /// Set the limiter.
    pub fn with_limiter(mut self, limiter: LimiterKind) -> Self {
        self.limiter = limiter;
        self
    }

    /// Set the numerical flux.
    pub fn with_flux(mut self, flux: FluxKind) -> Self {
        self.flux = flux;
        self
    }

    /// Set the shock detector.
    pub fn with_shock_detector(mut self, detector: ShockDetector) -> Self {
        self.shock_detector = detector;
        self
    }

    /// Set the reconstruction stencil.
    pub fn with_stencil(mut self, stencil: StencilKind) -> Self {
        self.stencil = stencil;
        self
    }

    /// Set the CFL number.
    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.cfl = cfl;
        self
    }

    /// Toggle interface sharpening.
    pub fn with_intsharp(mut self, intsharp: bool) -> Self {
        self.intsharp = intsharp;
        self
    }

    /// Toggle accuracy-test mode.
    pub fn with_accuracy_test(mut self, accuracy_test: bool) -> Self {
        self.accuracy_test = accuracy_test;
        self
    }

    /// Toggle volume-fraction reconstruction in DG modes.
    pub fn with_reconstruct_volume_fractions(mut self, on: bool) -> Self {
        self.reconstruct_volume_fractions = on;
        self
    }

    /// Set the Superbee compression parameter.
    pub fn with_superbee_beta(mut self, beta: f64) -> Self {
        self.superbee_beta = beta;
        self
    }

    /// Set the WENO central weight.
    pub fn with_weno_central_weight(mut self, weight: f64) -> Self {
        self.weno_central_weight = weight;
        self
    }

    /// Enable pressure relaxation with time-scale factor `ct`.
    pub fn with_relaxation(mut self, ct: f64) -> Self {
        self.relaxation = RelaxationConfig {
            enabled: true,
            time_scale_factor: ct,
        };
        self
    }

    /// Add a boundary treatment.
    pub fn with_boundary(mut self, sideset: usize, kind: BoundaryKind) -> Self {
        self.boundaries.push(BoundaryConfig::new(sideset, kind));
        self
    }

    /// Replace the limiter thresholds.
    pub fn with_limiter_thresholds(mut self, thresholds: LimiterThresholds) -> Self {
        self.limiter_thresholds = thresholds;
        self
    }

    /// Replace the cleanup thresholds.
    pub fn with_cleanup_thresholds(mut self, thresholds: CleanupThresholds) -> Self {
        self.cleanup_thresholds = thresholds;
        self
    }

    /// Number of materials.
    #[inline]
    pub fn nmat(&self) -> usize {
        self.materials.len()
    }

    /// Stored degrees of freedom.
    #[inline]
    pub fn ndof(&self) -> usize {
        self.scheme.ndof()
    }

    /// Reconstructed degrees of freedom.
    #[inline]
    pub fn rdof(&self) -> usize {
        self.scheme.rdof()
    }

    /// Build the material block.
    pub fn material_block(&self) -> Result<Materials> {
        Materials::new(self.materials.iter().map(|m| m.eos).collect())
    }

    /// Boundary treatment of a side set, if configured.
    pub fn boundary_kind(&self, sideset: usize) -> Option<BoundaryKind> {
        self.boundaries
            .iter()
            .find(|b| b.sideset == sideset)
            .map(|b| b.kind)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.materials.is_empty() {
            return Err(MultiMatError::invalid_config("at least one material is required"));
        }
        if !(self.cfl > 0.0 && self.cfl.is_finite()) {
            return Err(MultiMatError::invalid_config(format!(
                "cfl must be positive, got {}",
                self.cfl
            )));
        }
        let has_solid = self
            .materials
            .iter()
            .any(|m| matches!(m.eos, MaterialEos::SmallShearSolid(_)));
        if has_solid && self.flux != FluxKind::LaxFriedrichsSolids {
            return Err(MultiMatError::invalid_config(
                "solid materials require the lax_friedrichs_solids flux",
            ));
        }
        let linear_only = matches!(self.limiter, LimiterKind::SuperbeeP1 | LimiterKind::WenoP1);
        if linear_only && self.rdof() != 4 {
            return Err(MultiMatError::invalid_config(format!(
                "{:?} limits linear data only; scheme {:?} has rdof = {}",
                self.limiter,
                self.scheme,
                self.rdof()
            )));
        }
        if !(self.superbee_beta >= 1.0 && self.superbee_beta <= 2.0) {
            return Err(MultiMatError::invalid_config(format!(
                "superbee_beta must lie in [1, 2], got {}",
                self.superbee_beta
            )));
        }
        if self.weno_central_weight <= 0.0 {
            return Err(MultiMatError::invalid_config("weno_central_weight must be positive"));
        }
        if self.relaxation.enabled && self.relaxation.time_scale_factor <= 0.0 {
            return Err(MultiMatError::invalid_config(
                "pressure relaxation time-scale factor must be positive",
            ));
        }
        let t = &self.limiter_thresholds;
        let in_band = |x: f64| x > 0.0 && x < 0.5;
        if !in_band(t.al_band) || !in_band(t.interface_bound) {
            return Err(MultiMatError::invalid_config(
                "volume-fraction bands must lie in (0, 0.5)",
            ));
        }
        if !(self.cleanup_thresholds.al_eps > 0.0 && self.cleanup_thresholds.al_eps < 1.0) {
            return Err(MultiMatError::invalid_config("al_eps must lie in (0, 1)"));
        }
        for (i, b) in self.boundaries.iter().enumerate() {
            if self.boundaries[..i].iter().any(|o| o.sideset == b.sideset) {
                return Err(MultiMatError::invalid_config(format!(
                    "side set {} configured twice",
                    b.sideset
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::{SmallShearSolid, StiffenedGas};

    fn two_fluids() -> Vec<MaterialConfig> {
        vec![
            MaterialConfig::new("air", StiffenedGas::air()),
            MaterialConfig::new("water", StiffenedGas::water()),
        ]
    }

    #[test]
    fn test_scheme_dofs() {
        assert_eq!(Scheme::P0.ndof(), 1);
        assert_eq!(Scheme::P0P1.rdof(), 4);
        assert_eq!(Scheme::DgP2.ndof(), 10);
        assert_eq!(Scheme::P0P1.order(), 1);
    }

    #[test]
    fn test_defaults_validate() {
        let config = DiscretizationConfig::new(Scheme::DgP2, two_fluids());
        assert!(config.validate().is_ok());
        assert_eq!(config.nmat(), 2);
        assert_eq!(config.material_block().unwrap().nmat(), 2);
    }

    #[test]
    fn test_solids_select_solid_flux() {
        let config = DiscretizationConfig::new(
            Scheme::DgP1,
            vec![
                MaterialConfig::new("air", StiffenedGas::air()),
                MaterialConfig::new("copper", SmallShearSolid::copper()),
            ],
        );
        assert_eq!(config.flux, FluxKind::LaxFriedrichsSolids);
        let bad = config.with_flux(FluxKind::LaxFriedrichs);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_superbee_requires_linear() {
        let config =
            DiscretizationConfig::new(Scheme::DgP2, two_fluids())
                .with_limiter(LimiterKind::SuperbeeP1);
        assert!(matches!(config.validate(), Err(MultiMatError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_sideset_rejected() {
        let config = DiscretizationConfig::new(Scheme::P0, two_fluids())
            .with_boundary(1, BoundaryKind::Symmetry)
            .with_boundary(1, BoundaryKind::Extrapolate);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let json = r#"{
            "scheme": "dg_p1",
            "materials": [
                {"name": "air", "eos": "stiffened_gas", "gamma": 1.4, "pstiff": 0.0, "cv": 717.5},
                {"name": "water", "eos": "stiffened_gas",
                 "gamma": 4.4, "pstiff": 6.0e8, "cv": 1000.0}
            ],
            "limiter": "superbee_p1",
            "boundaries": [{"sideset": 2, "kind": {"type": "farfield", "pressure": 1.0e5}}]
        }"#;
        let config: DiscretizationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.limiter, LimiterKind::SuperbeeP1);
        assert_eq!(config.cfl, 0.3);
        assert_eq!(
            config.boundary_kind(2),
            Some(BoundaryKind::Farfield { pressure: 1.0e5 })
        );
        assert!(config.validate().is_ok());
        let back: DiscretizationConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(back.materials, config.materials);
        assert_eq!(back.boundaries, config.boundaries);
        assert_eq!(back.scheme, Scheme::DgP1);
    }
}
