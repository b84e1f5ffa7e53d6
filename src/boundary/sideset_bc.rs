//! Side-set dispatcher for boundary conditions.

use std::collections::HashMap;
use std::fmt;

use crate::config::{BoundaryKind, DiscretizationConfig};
use crate::error::{MultiMatError, Result};
use crate::mesh::TetMesh;
use crate::types::FaceIndex;

use super::{
    BCContext, Dirichlet, Extrapolation, Farfield, MultiMatBoundaryCondition, StateFn, Symmetry,
};

/// Routes boundary faces to the condition registered for their side set.
///
/// Faces without a side set (or with an unregistered one) fall back to the
/// default condition when one is set.
#[derive(Default)]
pub struct SidesetBoundaries {
    default_bc: Option<Box<dyn MultiMatBoundaryCondition>>,
    by_sideset: HashMap<usize, Box<dyn MultiMatBoundaryCondition>>,
}

impl SidesetBoundaries {
    /// Empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a condition for a side set, replacing any previous one.
    pub fn with(mut self, sideset: usize, bc: impl MultiMatBoundaryCondition + 'static) -> Self {
        self.by_sideset.insert(sideset, Box::new(bc));
        self
    }

    /// Set the fallback condition.
    pub fn with_default(mut self, bc: impl MultiMatBoundaryCondition + 'static) -> Self {
        self.default_bc = Some(Box::new(bc));
        self
    }

    /// Build from the configured side-set table. `dirichlet` supplies the
    /// conserved state for every `Dirichlet` side set.
    pub fn from_config(config: &DiscretizationConfig, dirichlet: Option<StateFn>) -> Result<Self> {
        let mut out = Self::new();
        for b in &config.boundaries {
            let bc: Box<dyn MultiMatBoundaryCondition> = match b.kind {
                BoundaryKind::Dirichlet => {
                    let state = dirichlet.clone().ok_or_else(|| {
                        MultiMatError::invalid_config(format!(
                            "side set {} is Dirichlet but no boundary state function was given",
                            b.sideset
                        ))
                    })?;
                    Box::new(Dirichlet::from_shared(state))
                }
                BoundaryKind::Symmetry => Box::new(Symmetry),
                BoundaryKind::Farfield { pressure } => Box::new(Farfield::new(pressure)),
                BoundaryKind::Extrapolate => Box::new(Extrapolation),
            };
            out.by_sideset.insert(b.sideset, bc);
        }
        Ok(out)
    }

    /// Condition for a side set.
    pub fn get(&self, sideset: Option<usize>) -> Option<&dyn MultiMatBoundaryCondition> {
        sideset
            .and_then(|s| self.by_sideset.get(&s))
            .or(self.default_bc.as_ref())
            .map(|b| b.as_ref())
    }

    /// Check that every boundary face of `mesh` resolves to a condition.
    pub fn check_mesh(&self, mesh: &TetMesh) -> Result<()> {
        for (f, face) in mesh.boundary_faces().iter().enumerate() {
            if self.get(face.sideset).is_none() {
                let f = FaceIndex::new(f);
                return Err(MultiMatError::invalid_config(match face.sideset {
                    Some(s) => format!("no boundary condition for side set {s} (face {f})"),
                    None => format!("boundary face {f} has no side set and no default condition"),
                }));
            }
        }
        Ok(())
    }

    /// Ghost state of a face on `sideset`.
    pub fn ghost_state(
        &self,
        sideset: Option<usize>,
        ctx: &BCContext,
        ghost: &mut [f64],
    ) -> Result<()> {
        match self.get(sideset) {
            Some(bc) => bc.ghost_state(ctx, ghost),
            None => Err(MultiMatError::invalid_config(format!(
                "no boundary condition for side set {sideset:?}"
            ))),
        }
    }
}

impl fmt::Debug for SidesetBoundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sets: Vec<_> = self
            .by_sideset
            .iter()
            .map(|(s, bc)| (*s, bc.name()))
            .collect();
        sets.sort_unstable();
        f.debug_struct("SidesetBoundaries")
            .field("default", &self.default_bc.as_ref().map(|b| b.name()))
            .field("sidesets", &sets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaterialConfig, Scheme};
    use crate::eos::StiffenedGas;
    use crate::mesh::BoxSide;

    fn config() -> DiscretizationConfig {
        DiscretizationConfig::new(Scheme::P0, vec![MaterialConfig::new("air", StiffenedGas::air())])
    }

    #[test]
    fn test_from_config_maps_kinds() {
        let mut cfg = config();
        for side in BoxSide::ALL {
            cfg = cfg.with_boundary(side.id(), BoundaryKind::Symmetry);
        }
        let cfg = cfg.with_boundary(99, BoundaryKind::Farfield { pressure: 1e5 });
        let bcs = SidesetBoundaries::from_config(&cfg, None).unwrap();
        assert_eq!(bcs.get(Some(1)).map(|b| b.name()), Some("symmetry"));
        assert_eq!(bcs.get(Some(99)).map(|b| b.name()), Some("farfield"));
        assert!(bcs.get(Some(7)).is_none());

        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        assert!(bcs.check_mesh(&mesh).is_ok());
    }

    #[test]
    fn test_dirichlet_requires_function() {
        let cfg = config().with_boundary(1, BoundaryKind::Dirichlet);
        assert!(matches!(
            SidesetBoundaries::from_config(&cfg, None),
            Err(MultiMatError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_sideset_detected_unless_default() {
        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        let bcs = SidesetBoundaries::new().with(BoxSide::XMin.id(), Symmetry);
        assert!(bcs.check_mesh(&mesh).is_err());
        let bcs = bcs.with_default(Extrapolation);
        assert!(bcs.check_mesh(&mesh).is_ok());
        assert_eq!(bcs.get(Some(3)).map(|b| b.name()), Some("extrapolate"));
    }
}
