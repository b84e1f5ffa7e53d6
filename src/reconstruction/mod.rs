//! Least-squares reconstruction of linear dofs from cell averages.
//!
//! In the P0P1 scheme every conserved and every primitive variable gets its
//! linear dofs from a least-squares fit over the stencil. In DG schemes the
//! volume fractions can optionally be re-fitted the same way, which gives a
//! smoother interface-normal estimate than the evolved linear modes.

mod least_squares;

pub use least_squares::{LeastSquares, StencilEntry, StencilPoint, gradient_to_dubiner};

use tracing::{debug, warn};

use crate::basis::inverse_jacobian;
use crate::boundary::{BCContext, SidesetBoundaries};
use crate::eos::Materials;
use crate::error::{MultiMatError, Result};
use crate::mesh::TetMesh;
use crate::state::{Fields, VariableLayout};

/// Which variables get their linear dofs reconstructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconstructedVariables {
    /// All conserved and all primitive variables (P0P1).
    All,
    /// Volume fractions only.
    VolumeFractions,
}

/// Everything the reconstruction reads besides the solution.
#[derive(Clone, Copy, Debug)]
pub struct ReconstructionContext<'a> {
    /// Mesh.
    pub mesh: &'a TetMesh,
    /// Material closures.
    pub materials: &'a Materials,
    /// Variable layout.
    pub layout: VariableLayout,
    /// Precomputed stencils.
    pub lsq: &'a LeastSquares,
    /// Boundary conditions for boundary stencil points.
    pub boundaries: &'a SidesetBoundaries,
    /// Physical time.
    pub time: f64,
}

/// Reconstruct the linear dofs of the selected variables of `u` (and, for
/// [`ReconstructedVariables::All`], of `p`) from the cell averages.
///
/// Elements with an empty or singular stencil get zero linear dofs. Returns
/// the number of such elements.
pub fn reconstruct(
    ctx: &ReconstructionContext,
    which: ReconstructedVariables,
    u: &mut Fields,
    p: &mut Fields,
) -> Result<usize> {
    let l = &ctx.layout;
    let mesh = ctx.mesh;
    let ncomp = l.ncomp();
    let nprim = l.nprim();
    if u.ndof() < 4 {
        return Err(MultiMatError::dimension_mismatch("reconstruction rdof", 4, u.ndof()));
    }
    if which == ReconstructedVariables::All && p.ndof() < 4 {
        return Err(MultiMatError::dimension_mismatch("primitive rdof", 4, p.ndof()));
    }

    // cell averages, conserved followed by primitive
    let nstate = ncomp + nprim;
    let mut avg = vec![0.0; mesh.n_elements() * nstate];
    for (e, a) in avg.chunks_exact_mut(nstate).enumerate() {
        for c in 0..ncomp {
            a[c] = u.get(e, c, 0);
        }
        for c in 0..nprim {
            a[ncomp + c] = p.get(e, c, 0);
        }
    }

    // ghost averages at boundary face centroids
    let mut ghost = vec![0.0; mesh.n_boundary_faces * nstate];
    for (f, g) in ghost.chunks_exact_mut(nstate).enumerate() {
        let face = &mesh.faces[f];
        let bc = BCContext {
            time: ctx.time,
            position: face.centroid,
            normal: face.normal,
            interior: &avg[face.left * nstate..(face.left + 1) * nstate],
            materials: ctx.materials,
            layout: ctx.layout,
        };
        ctx.boundaries.ghost_state(face.sideset, &bc, g)?;
    }

    let vars: Vec<usize> = match which {
        ReconstructedVariables::All => (0..nstate).collect(),
        ReconstructedVariables::VolumeFractions => (0..l.nmat()).map(|k| l.volfrac(k)).collect(),
    };

    let mut singular = 0;
    let mut jumps = Vec::new();
    for e in 0..mesh.n_elements() {
        let stencil = ctx.lsq.stencil(e);
        let jac_inv = inverse_jacobian(&mesh.element_vertices(e));
        let mut degenerate = jac_inv.is_none();

        for &var in &vars {
            let ue = avg[e * nstate + var];
            jumps.clear();
            jumps.extend(stencil.iter().map(|s| match s.point {
                StencilPoint::Element(j) => avg[j * nstate + var] - ue,
                StencilPoint::Boundary(f) => ghost[f * nstate + var] - ue,
            }));
            let dofs = jac_inv.as_ref().and_then(|ji| {
                ctx.lsq
                    .reconstruct_gradient(e, &jumps)
                    .and_then(|g| gradient_to_dubiner(ji, &g))
            });
            if dofs.is_none() {
                degenerate = true;
            }
            let dofs = dofs.unwrap_or([0.0; 3]);
            let modes = if var < ncomp {
                u.modes_mut(e, var)
            } else {
                p.modes_mut(e, var - ncomp)
            };
            modes[1..4].copy_from_slice(&dofs);
        }
        if degenerate {
            singular += 1;
        }
    }

    if singular > 0 {
        warn!(singular, "least-squares reconstruction: singular or empty stencils");
    }
    debug!(
        elements = mesh.n_elements(),
        variables = vars.len(),
        stencil = ?ctx.lsq.kind(),
        "reconstructed linear dofs"
    );
    Ok(singular)
}
