//! Trait definitions for multi-material limiters.

use crate::config::DiscretizationConfig;
use crate::eos::Materials;
use crate::error::Result;
use crate::mesh::{NodalExtrema, TetMesh};
use crate::state::{Fields, VariableLayout};

/// Context provided to limiter computations.
#[derive(Clone, Copy)]
pub struct LimiterContext<'a> {
    /// The mesh.
    pub mesh: &'a TetMesh,
    /// Material closures.
    pub materials: &'a Materials,
    /// Variable layout.
    pub layout: VariableLayout,
    /// Discretization settings (scheme, thresholds, toggles).
    pub config: &'a DiscretizationConfig,
    /// Remote first-derivative extrema of the conserved variables.
    pub u_halo: Option<&'a NodalExtrema>,
    /// Remote first-derivative extrema of the primitive variables.
    pub p_halo: Option<&'a NodalExtrema>,
}

impl std::fmt::Debug for LimiterContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimiterContext")
            .field("n_elements", &self.mesh.n_elements())
            .field("nmat", &self.layout.nmat())
            .field("scheme", &self.config.scheme)
            .field("halo", &self.u_halo.is_some())
            .finish()
    }
}

impl<'a> LimiterContext<'a> {
    /// Create a limiter context without partition-halo data.
    pub fn new(
        mesh: &'a TetMesh,
        materials: &'a Materials,
        config: &'a DiscretizationConfig,
    ) -> Self {
        Self {
            mesh,
            materials,
            layout: VariableLayout::of(materials),
            config,
            u_halo: None,
            p_halo: None,
        }
    }

    /// Attach nodal extrema gathered from other partitions.
    pub fn with_halo(mut self, u_halo: &'a NodalExtrema, p_halo: &'a NodalExtrema) -> Self {
        self.u_halo = Some(u_halo);
        self.p_halo = Some(p_halo);
        self
    }
}

/// Outcome of one limiting pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LimiterReport {
    /// Shock marker per element.
    pub shocked: Vec<bool>,
    /// Number of elements with at least one coefficient below one.
    pub limited: usize,
}

impl LimiterReport {
    /// Number of elements marked as shocked.
    pub fn n_shocked(&self) -> usize {
        self.shocked.iter().filter(|&&s| s).count()
    }
}

/// Trait for slope limiters of the multi-material system.
///
/// A limiter modifies the high-order dofs of the conserved and primitive
/// arrays in place; cell averages are never changed.
///
/// # Extending
///
/// To add a new limiter:
/// 1. Create a struct with limiter parameters
/// 2. Implement `Limiter` for it
/// 3. Add a variant to [`super::StandardLimiter`] if it should be selectable
///    from configuration
pub trait Limiter: Send + Sync {
    /// Limit `u` (conserved) and `p` (primitive) in place.
    ///
    /// Both arrays must carry the reconstructed number of dofs.
    fn apply(&self, ctx: &LimiterContext, u: &mut Fields, p: &mut Fields)
        -> Result<LimiterReport>;

    /// Element-parallel variant of [`Limiter::apply`].
    #[cfg(feature = "parallel")]
    fn apply_parallel(
        &self,
        ctx: &LimiterContext,
        u: &mut Fields,
        p: &mut Fields,
    ) -> Result<LimiterReport> {
        self.apply(ctx, u, p)
    }

    /// Human-readable name for debugging and logging.
    fn name(&self) -> &'static str;

    /// Whether this limiter keeps densities, energies and pressures above
    /// their floors.
    fn preserves_positivity(&self) -> bool {
        false
    }

    /// Whether this limiter preserves cell averages exactly.
    fn preserves_cell_average(&self) -> bool {
        true
    }
}

/// Type alias for boxed limiter (runtime polymorphism).
pub type BoxedLimiter = Box<dyn Limiter>;
