//! Stable time-step estimate for the explicit driver.
//!
//! For every face the characteristic flux `|A| (|u · n| + a)` of both
//! neighbors is evaluated on cell averages; the larger value is charged to
//! both elements (boundary faces charge the interior element only). The
//! element limit is `V / Σ`, and for polynomial order `p`
//!
//! ```text
//! dt = cfl / (2p + 1) · min_e V_e / Σ_f |A_f| (|u · n_f| + a)
//! ```

use tracing::debug;

use crate::basis::order_of;
use crate::eos::Materials;
use crate::error::{MultiMatError, Result};
use crate::mesh::{Face, TetMesh};
use crate::state::{Fields, VariableLayout, inverse_deformation};
use crate::types::{ElementIndex, Vec3, dot};

/// Materials below this volume fraction do not bound the sound speed.
const SOUND_SPEED_ALPHA_MIN: f64 = 1.0e-4;

/// Bulk velocity and fastest material sound speed of one element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaveSpeed {
    /// Cell-average velocity.
    pub velocity: Vec3,
    /// Largest sound speed over the materials present in the element.
    pub sound_speed: f64,
}

impl WaveSpeed {
    /// Characteristic flux through a face of `area` with unit `normal`.
    #[inline]
    pub fn face_flux(&self, area: f64, normal: &Vec3) -> f64 {
        area * (dot(&self.velocity, normal).abs() + self.sound_speed)
    }
}

fn element_wave_speed(
    mesh: &TetMesh,
    materials: &Materials,
    layout: &VariableLayout,
    u: &Fields,
    p: &Fields,
    e: usize,
    ugp: &mut [f64],
) -> Result<WaveSpeed> {
    for (c, v) in ugp.iter_mut().enumerate() {
        *v = u.get(e, c, 0);
    }
    let velocity = [
        p.get(e, layout.velocity(0), 0),
        p.get(e, layout.velocity(1), 0),
        p.get(e, layout.velocity(2), 0),
    ];
    let mut sound_speed: f64 = 0.0;
    for k in 0..layout.nmat() {
        let alpha = ugp[layout.volfrac(k)];
        if alpha <= SOUND_SPEED_ALPHA_MIN {
            continue;
        }
        let g = inverse_deformation(layout, materials, ugp, k);
        let a = materials
            .sound_speed(
                k,
                ugp[layout.density(k)],
                p.get(e, layout.pressure(k), 0),
                alpha,
                g.as_ref(),
            )
            .map_err(|err| err.at_element(ElementIndex::new(e), mesh.centroid[e]))?;
        sound_speed = sound_speed.max(a);
    }
    Ok(WaveSpeed {
        velocity,
        sound_speed,
    })
}

fn check_arrays(mesh: &TetMesh, layout: &VariableLayout, u: &Fields, p: &Fields) -> Result<()> {
    if u.nelem() != mesh.n_elements() || p.nelem() != mesh.n_elements() {
        return Err(MultiMatError::dimension_mismatch(
            "time_step: elements",
            mesh.n_elements(),
            u.nelem().min(p.nelem()),
        ));
    }
    if u.nvar() != layout.ncomp() || p.nvar() != layout.nprim() {
        return Err(MultiMatError::dimension_mismatch(
            "time_step: variables",
            layout.ncomp() + layout.nprim(),
            u.nvar() + p.nvar(),
        ));
    }
    Ok(())
}

/// Per-element wave speeds from the cell averages.
pub fn wave_speeds(
    mesh: &TetMesh,
    materials: &Materials,
    u: &Fields,
    p: &Fields,
) -> Result<Vec<WaveSpeed>> {
    let layout = VariableLayout::of(materials);
    check_arrays(mesh, &layout, u, p)?;
    let mut ugp = vec![0.0; layout.ncomp()];
    (0..mesh.n_elements())
        .map(|e| element_wave_speed(mesh, materials, &layout, u, p, e, &mut ugp))
        .collect()
}

/// Element-parallel [`wave_speeds`].
#[cfg(feature = "parallel")]
pub fn wave_speeds_parallel(
    mesh: &TetMesh,
    materials: &Materials,
    u: &Fields,
    p: &Fields,
) -> Result<Vec<WaveSpeed>> {
    use rayon::prelude::*;

    let layout = VariableLayout::of(materials);
    check_arrays(mesh, &layout, u, p)?;
    (0..mesh.n_elements())
        .into_par_iter()
        .map_init(
            || vec![0.0; layout.ncomp()],
            |ugp, e| element_wave_speed(mesh, materials, &layout, u, p, e, ugp),
        )
        .collect()
}

fn face_charge(face: &Face, speeds: &[WaveSpeed]) -> f64 {
    let left = speeds[face.left].face_flux(face.area, &face.normal);
    match face.right {
        Some(r) => left.max(speeds[r].face_flux(face.area, &face.normal)),
        None => left,
    }
}

/// Largest stable step `min_e V_e / Σ_f |A_f| (|u · n_f| + a)` before the
/// CFL and order scaling. Infinite when nothing moves.
pub fn characteristic_time(mesh: &TetMesh, speeds: &[WaveSpeed]) -> Result<f64> {
    if speeds.len() != mesh.n_elements() {
        return Err(MultiMatError::dimension_mismatch(
            "characteristic_time: wave speeds",
            mesh.n_elements(),
            speeds.len(),
        ));
    }
    let mut charge = vec![0.0; mesh.n_elements()];
    for face in &mesh.faces {
        let c = face_charge(face, speeds);
        charge[face.left] += c;
        if let Some(r) = face.right {
            charge[r] += c;
        }
    }
    Ok(mesh
        .volume
        .iter()
        .zip(&charge)
        .filter(|(_, c)| **c > 0.0)
        .map(|(v, c)| v / c)
        .fold(f64::INFINITY, f64::min))
}

/// Stable time step for a scheme storing `ndof` modes per variable.
///
/// # Arguments
/// * `mesh` - Tetrahedral mesh
/// * `materials` - Material closures
/// * `ndof` - Stored degrees of freedom (sets the order `p`)
/// * `cfl` - CFL number
/// * `u`, `p` - Conserved and primitive arrays (only cell averages are read)
pub fn time_step(
    mesh: &TetMesh,
    materials: &Materials,
    ndof: usize,
    cfl: f64,
    u: &Fields,
    p: &Fields,
) -> Result<f64> {
    let order = order_of(ndof)?;
    let speeds = wave_speeds(mesh, materials, u, p)?;
    let dt = characteristic_time(mesh, &speeds)? * cfl / (2 * order + 1) as f64;
    debug!(dt, cfl, order, "time step");
    Ok(dt)
}

/// [`time_step`] with element-parallel wave speeds.
#[cfg(feature = "parallel")]
pub fn time_step_parallel(
    mesh: &TetMesh,
    materials: &Materials,
    ndof: usize,
    cfl: f64,
    u: &Fields,
    p: &Fields,
) -> Result<f64> {
    let order = order_of(ndof)?;
    let speeds = wave_speeds_parallel(mesh, materials, u, p)?;
    let dt = characteristic_time(mesh, &speeds)? * cfl / (2 * order + 1) as f64;
    debug!(dt, cfl, order, "time step");
    Ok(dt)
}
