//! Standard limiter implementations.

use super::engine::{RawStrategy, limit};
#[cfg(feature = "parallel")]
use super::engine::limit_parallel;
use super::traits::{BoxedLimiter, Limiter, LimiterContext, LimiterReport};
use crate::config::{DiscretizationConfig, LimiterKind};
use crate::error::Result;
use crate::state::Fields;

/// No-op limiter.
///
/// Useful for smooth problems and accuracy studies.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLimiter;

impl Limiter for NoLimiter {
    fn apply(
        &self,
        ctx: &LimiterContext,
        _u: &mut Fields,
        _p: &mut Fields,
    ) -> Result<LimiterReport> {
        Ok(LimiterReport {
            shocked: vec![false; ctx.mesh.n_elements()],
            limited: 0,
        })
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Superbee limiter on linear dofs, followed by the multi-material passes.
#[derive(Clone, Copy, Debug)]
pub struct SuperbeeP1 {
    beta: f64,
}

impl SuperbeeP1 {
    /// Create a Superbee limiter; `beta = 1` gives minmod.
    pub fn new(beta: f64) -> Self {
        Self { beta }
    }

    /// Compression parameter.
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl Default for SuperbeeP1 {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl Limiter for SuperbeeP1 {
    fn apply(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        limit(ctx, RawStrategy::Superbee { beta: self.beta }, u, p)
    }

    #[cfg(feature = "parallel")]
    fn apply_parallel(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        limit_parallel(ctx, RawStrategy::Superbee { beta: self.beta }, u, p)
    }

    fn name(&self) -> &'static str {
        "superbee_p1"
    }

    fn preserves_positivity(&self) -> bool {
        true
    }
}

/// WENO blending of linear dofs, followed by the multi-material passes.
#[derive(Clone, Copy, Debug)]
pub struct WenoP1 {
    central_weight: f64,
}

impl WenoP1 {
    /// Create a WENO limiter with the given weight of the central stencil.
    pub fn new(central_weight: f64) -> Self {
        Self { central_weight }
    }
}

impl Default for WenoP1 {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

impl Limiter for WenoP1 {
    fn apply(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        limit(ctx, self.strategy(), u, p)
    }

    #[cfg(feature = "parallel")]
    fn apply_parallel(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        limit_parallel(ctx, self.strategy(), u, p)
    }

    fn name(&self) -> &'static str {
        "weno_p1"
    }

    fn preserves_positivity(&self) -> bool {
        true
    }
}

impl WenoP1 {
    fn strategy(&self) -> RawStrategy {
        RawStrategy::Weno {
            central_weight: self.central_weight,
        }
    }
}

/// Vertex-based (Kuzmin) limiter, hierarchical for quadratic data.
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexBased;

impl Limiter for VertexBased {
    fn apply(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        limit(ctx, RawStrategy::VertexBased, u, p)
    }

    #[cfg(feature = "parallel")]
    fn apply_parallel(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        limit_parallel(ctx, RawStrategy::VertexBased, u, p)
    }

    fn name(&self) -> &'static str {
        "vertex_based"
    }

    fn preserves_positivity(&self) -> bool {
        true
    }
}

/// Enum wrapper for built-in limiter types.
///
/// Provides static dispatch when the limiter is selected from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StandardLimiter {
    /// No limiting.
    #[default]
    None,
    /// Superbee on linear dofs.
    Superbee { beta: f64 },
    /// WENO on linear dofs.
    Weno { central_weight: f64 },
    /// Vertex-based.
    VertexBased,
}

impl StandardLimiter {
    /// Select the limiter named by `config`.
    pub fn from_config(config: &DiscretizationConfig) -> Self {
        match config.limiter {
            LimiterKind::NoLimiter => Self::None,
            LimiterKind::SuperbeeP1 => Self::Superbee {
                beta: config.superbee_beta,
            },
            LimiterKind::WenoP1 => Self::Weno {
                central_weight: config.weno_central_weight,
            },
            LimiterKind::VertexBased => Self::VertexBased,
        }
    }

    fn strategy(&self) -> Option<RawStrategy> {
        match *self {
            Self::None => None,
            Self::Superbee { beta } => Some(RawStrategy::Superbee { beta }),
            Self::Weno { central_weight } => Some(RawStrategy::Weno { central_weight }),
            Self::VertexBased => Some(RawStrategy::VertexBased),
        }
    }
}

impl Limiter for StandardLimiter {
    fn apply(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        match self.strategy() {
            Some(s) => limit(ctx, s, u, p),
            None => NoLimiter.apply(ctx, u, p),
        }
    }

    #[cfg(feature = "parallel")]
    fn apply_parallel(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        match self.strategy() {
            Some(s) => limit_parallel(ctx, s, u, p),
            None => NoLimiter.apply(ctx, u, p),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Superbee { .. } => "superbee_p1",
            Self::Weno { .. } => "weno_p1",
            Self::VertexBased => "vertex_based",
        }
    }

    fn preserves_positivity(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Create a boxed limiter from configuration.
pub fn create_limiter(config: &DiscretizationConfig) -> BoxedLimiter {
    match StandardLimiter::from_config(config) {
        StandardLimiter::None => Box::new(NoLimiter),
        StandardLimiter::Superbee { beta } => Box::new(SuperbeeP1::new(beta)),
        StandardLimiter::Weno { central_weight } => Box::new(WenoP1::new(central_weight)),
        StandardLimiter::VertexBased => Box::new(VertexBased),
    }
}
