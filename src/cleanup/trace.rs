//! Trace-material cleanup on the cell averages.

use tracing::{debug, error, warn};

use super::CleanupReport;
use crate::config::CleanupThresholds;
use crate::eos::Materials;
use crate::error::{ElementLocation, MaterialState, MultiMatError, Result};
use crate::mesh::TetMesh;
use crate::state::{Fields, VariableLayout, inverse_deformation};
use crate::types::{ElementIndex, Tensor3, Vec3};

/// Volume-fraction sums further than this from one are logged.
const RENORMALIZATION_WARN: f64 = 1.0e-3;

/// Inverse deformation gradient of material `k` from the cell averages.
fn average_deformation(
    layout: &VariableLayout,
    materials: &Materials,
    ue: &[f64],
    rdof: usize,
    k: usize,
) -> Option<Tensor3> {
    let avg: Vec<f64> = (0..layout.ncomp()).map(|c| ue[c * rdof]).collect();
    inverse_deformation(layout, materials, &avg, k)
}

struct ElementCleanup<'a> {
    materials: &'a Materials,
    layout: VariableLayout,
    thresholds: CleanupThresholds,
    rdof: usize,
}

impl ElementCleanup<'_> {
    /// Clean one element. `ue` and `pe` are its conserved and primitive
    /// slices. Returns whether a material was reset and the volume-fraction
    /// sum before renormalization.
    fn run(
        &self,
        e: usize,
        centroid: Vec3,
        ue: &mut [f64],
        pe: &mut [f64],
    ) -> Result<(bool, f64)> {
        let l = &self.layout;
        let m = self.materials;
        let th = &self.thresholds;
        let rdof = self.rdof;
        let nmat = l.nmat();
        let at = |err: MultiMatError| err.at_element(ElementIndex::new(e), centroid);

        let vf = |k: usize| l.volfrac(k) * rdof;
        let de = |k: usize| l.density(k) * rdof;
        let en = |k: usize| l.energy(k) * rdof;
        let pr = |k: usize| l.pressure(k) * rdof;

        let mut kmax = 0;
        let mut almax = 0.0;
        for k in 0..nmat {
            if ue[vf(k)] > almax {
                almax = ue[vf(k)];
                kmax = k;
            }
        }
        let vel = [
            pe[l.velocity(0) * rdof],
            pe[l.velocity(1) * rdof],
            pe[l.velocity(2) * rdof],
        ];
        let gmax = average_deformation(l, m, ue, rdof, kmax);
        let tmax = m
            .temperature(kmax, ue[de(kmax)], &vel, ue[en(kmax)], almax, gmax.as_ref())
            .map_err(at)?;
        let p_target = (pe[pr(kmax)] / almax).max(th.pressure_floor);

        let mut touched = false;
        let mut d_al = 0.0;
        let mut d_are = 0.0;
        for k in 0..nmat {
            let alk = ue[vf(k)];
            let g = average_deformation(l, m, ue, rdof, k);
            if alk > th.alpha_floor {
                let pk = pe[pr(k)] / alk;
                if alk < th.al_eps || pk + m.stiffening_pressure(k) < 0.0 {
                    let rho_e = m
                        .total_energy(k, ue[de(k)] / alk, &vel, p_target, g.as_ref())
                        .map_err(at)?;
                    d_are += ue[en(k)] - alk * rho_e;
                    ue[en(k)] = alk * rho_e;
                    pe[pr(k)] = alk * p_target;
                    touched = true;
                }
            } else if alk <= 0.0 {
                let floor = th.alpha_floor;
                let rhok = m.density(k, p_target, tmax).map_err(at)?;
                let rho_e = m
                    .total_energy(k, rhok, &vel, p_target, g.as_ref())
                    .map_err(at)?;
                d_al += alk - floor;
                ue[vf(k)] = floor;
                ue[de(k)] = floor * rhok;
                ue[en(k)] = floor * rho_e;
                pe[pr(k)] = floor * p_target;
                for i in 1..rdof {
                    ue[vf(k) + i] = 0.0;
                    ue[de(k) + i] = 0.0;
                    ue[en(k) + i] = 0.0;
                    pe[pr(k) + i] = 0.0;
                }
                touched = true;
            } else {
                let rho_e = m
                    .total_energy(k, ue[de(k)] / alk, &vel, p_target, g.as_ref())
                    .map_err(at)?;
                ue[en(k)] = alk * rho_e;
                pe[pr(k)] = alk * p_target;
                for i in 1..rdof {
                    ue[en(k) + i] = 0.0;
                    pe[pr(k) + i] = 0.0;
                }
                touched = true;
            }
        }

        ue[vf(kmax)] += d_al;
        ue[en(kmax)] += d_are;
        pe[pr(kmax)] = m
            .pressure(kmax, ue[de(kmax)], &vel, ue[en(kmax)], ue[vf(kmax)], gmax.as_ref())
            .map_err(at)?;

        let alsum: f64 = (0..nmat).map(|k| ue[vf(k)]).sum();
        for k in 0..nmat {
            ue[vf(k)] /= alsum;
            ue[de(k)] /= alsum;
            ue[en(k)] /= alsum;
            pe[pr(k)] /= alsum;
        }
        if (alsum - 1.0).abs() > RENORMALIZATION_WARN {
            warn!(element = e, alsum, "strong volume-fraction renormalization");
        }

        let pmax = pe[pr(kmax)] / ue[vf(kmax)];
        for k in 0..nmat {
            let arho = ue[de(k)];
            if arho < 0.0 {
                let state = MaterialState {
                    alpha: ue[vf(k)],
                    partial_density: arho,
                    partial_energy_or_pressure: pe[pr(k)],
                    velocity: vel,
                };
                error!(
                    element = e,
                    material = k,
                    %state,
                    major_pressure = pmax,
                    major_temperature = tmax,
                    "negative partial density"
                );
                return Err(MultiMatError::negative_density(
                    k,
                    ElementLocation {
                        element: ElementIndex::new(e),
                        centroid,
                    },
                    state,
                    pmax,
                    tmax,
                ));
            }
        }
        Ok((touched, (alsum - 1.0).abs()))
    }
}

fn check_arrays(mesh: &TetMesh, layout: &VariableLayout, u: &Fields, p: &Fields) -> Result<()> {
    if u.nelem() != mesh.n_elements() || p.nelem() != mesh.n_elements() {
        return Err(MultiMatError::dimension_mismatch(
            "clean_trace: elements",
            mesh.n_elements(),
            u.nelem().min(p.nelem()),
        ));
    }
    if u.nvar() != layout.ncomp() {
        return Err(MultiMatError::dimension_mismatch(
            "clean_trace: conserved variables",
            layout.ncomp(),
            u.nvar(),
        ));
    }
    if p.nvar() != layout.nprim() || p.ndof() != u.ndof() {
        return Err(MultiMatError::dimension_mismatch(
            "clean_trace: primitive storage",
            layout.nprim() * u.ndof(),
            p.nvar() * p.ndof(),
        ));
    }
    Ok(())
}

/// Clean up trace materials in every element.
///
/// Per element, on the cell averages:
/// 1. the majority material (largest volume fraction) fixes the target
///    pressure;
/// 2. trace materials (`α < al_eps`) and materials with negative effective
///    pressure are reset to the target pressure, their energy change is
///    moved into the majority material;
/// 3. negative volume fractions are reset to `alpha_floor` with the density
///    at the majority temperature, the deficit is taken from the majority;
/// 4. volume fractions are renormalized to unit sum and the majority
///    pressure is recomputed from its closure.
///
/// A negative partial density afterwards is a realizability failure.
pub fn clean_trace(
    mesh: &TetMesh,
    materials: &Materials,
    thresholds: &CleanupThresholds,
    u: &mut Fields,
    p: &mut Fields,
) -> Result<CleanupReport> {
    let layout = VariableLayout::of(materials);
    check_arrays(mesh, &layout, u, p)?;
    let pass = ElementCleanup {
        materials,
        layout,
        thresholds: *thresholds,
        rdof: u.ndof(),
    };
    let mut report = CleanupReport::default();
    for (e, (ue, pe)) in u.elements_mut().zip(p.elements_mut()).enumerate() {
        let (touched, dev) = pass.run(e, mesh.centroid[e], ue, pe)?;
        report = report.merge(CleanupReport {
            cleaned: usize::from(touched),
            max_renormalization: dev,
        });
    }
    debug!(
        cleaned = report.cleaned,
        max_renormalization = report.max_renormalization,
        "cleaned trace materials"
    );
    Ok(report)
}

/// Element-parallel [`clean_trace`].
#[cfg(feature = "parallel")]
pub fn clean_trace_parallel(
    mesh: &TetMesh,
    materials: &Materials,
    thresholds: &CleanupThresholds,
    u: &mut Fields,
    p: &mut Fields,
) -> Result<CleanupReport> {
    use rayon::prelude::*;

    let layout = VariableLayout::of(materials);
    check_arrays(mesh, &layout, u, p)?;
    let pass = ElementCleanup {
        materials,
        layout,
        thresholds: *thresholds,
        rdof: u.ndof(),
    };
    let (ulen, plen) = (u.element_len(), p.element_len());
    let report = u
        .as_mut_slice()
        .par_chunks_exact_mut(ulen)
        .zip(p.as_mut_slice().par_chunks_exact_mut(plen))
        .enumerate()
        .map(|(e, (ue, pe))| {
            pass.run(e, mesh.centroid[e], ue, pe)
                .map(|(touched, dev)| CleanupReport {
                    cleaned: usize::from(touched),
                    max_renormalization: dev,
                })
        })
        .try_reduce(CleanupReport::default, |a, b| Ok(a.merge(b)))?;
    debug!(
        cleaned = report.cleaned,
        max_renormalization = report.max_renormalization,
        "cleaned trace materials"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::StiffenedGas;
    use crate::integrate::test_support::{two_fluids, uniform};

    const TOL: f64 = 1e-12;

    fn volfrac_sum(l: &VariableLayout, u: &Fields, e: usize) -> f64 {
        (0..l.nmat()).map(|k| u.get(e, l.volfrac(k), 0)).sum()
    }

    #[test]
    fn test_clean_state_is_unchanged() {
        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        let materials = two_fluids();
        let (mut u, mut p) = uniform(
            &mesh,
            &materials,
            4,
            &[0.3, 0.7],
            &[1.2, 1000.0],
            1.0e5,
            [1.0, 0.0, 0.0],
        );
        let (u0, p0) = (u.clone(), p.clone());
        let report =
            clean_trace(&mesh, &materials, &CleanupThresholds::default(), &mut u, &mut p)
                .unwrap();
        assert_eq!(report.cleaned, 0);
        for (a, b) in u.as_slice().iter().zip(u0.as_slice()) {
            assert!((a - b).abs() < TOL * b.abs().max(1.0));
        }
        for (a, b) in p.as_slice().iter().zip(p0.as_slice()) {
            assert!((a - b).abs() < 1e-9 * b.abs().max(1.0));
        }
    }

    #[test]
    fn test_trace_material_takes_majority_pressure() {
        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        let materials = two_fluids();
        let l = VariableLayout::of(&materials);
        let (mut u, mut p) = uniform(
            &mesh,
            &materials,
            1,
            &[1.0e-3, 1.0 - 1.0e-3],
            &[1.2, 1000.0],
            1.0e5,
            [0.0; 3],
        );
        // trace air at ten times the water pressure
        let a0 = 1.0e-3;
        let rho_e = materials.total_energy(0, 1.2, &[0.0; 3], 1.0e6, None).unwrap();
        for e in 0..mesh.n_elements() {
            u.set(e, l.energy(0), 0, a0 * rho_e);
            p.set(e, l.pressure(0), 0, a0 * 1.0e6);
        }
        let report =
            clean_trace(&mesh, &materials, &CleanupThresholds::default(), &mut u, &mut p)
                .unwrap();
        assert_eq!(report.cleaned, mesh.n_elements());
        for e in 0..mesh.n_elements() {
            let p_air = p.get(e, l.pressure(0), 0) / u.get(e, l.volfrac(0), 0);
            assert!((p_air - 1.0e5).abs() < 1e-6 * 1.0e5);
            assert!((volfrac_sum(&l, &u, e) - 1.0).abs() < TOL);
            // the air's excess energy moved into the water
            let e_water = materials
                .total_energy(1, 1000.0, &[0.0; 3], 1.0e5, None)
                .unwrap()
                * (1.0 - a0);
            assert!(u.get(e, l.energy(1), 0) > e_water);
        }
    }

    #[test]
    fn test_negative_volume_fraction_is_floored_and_closed() {
        for nmat in 1..=3 {
            let eos: Vec<_> = (0..nmat)
                .map(|k| {
                    if k % 2 == 0 {
                        StiffenedGas::air().into()
                    } else {
                        StiffenedGas::water().into()
                    }
                })
                .collect();
            let materials = Materials::new(eos).unwrap();
            let l = VariableLayout::of(&materials);
            let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
            let alpha: Vec<f64> = if nmat == 1 {
                vec![1.0]
            } else {
                let mut a = vec![0.0; nmat];
                a[0] = 1.05;
                a[1] = -0.05;
                a
            };
            let rho: Vec<f64> = (0..nmat).map(|k| if k % 2 == 0 { 1.2 } else { 1000.0 }).collect();
            let (mut u, mut p) = uniform(&mesh, &materials, 4, &alpha, &rho, 1.0e5, [0.0; 3]);
            clean_trace(&mesh, &materials, &CleanupThresholds::default(), &mut u, &mut p)
                .unwrap();
            for e in 0..mesh.n_elements() {
                assert!((volfrac_sum(&l, &u, e) - 1.0).abs() < TOL);
                for k in 0..nmat {
                    assert!(u.get(e, l.volfrac(k), 0) > 0.0);
                    assert!(u.get(e, l.density(k), 0) >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_negative_density_is_reported() {
        let mesh = TetMesh::unit_box([1, 1, 1]).unwrap();
        let materials = two_fluids();
        let l = VariableLayout::of(&materials);
        let (mut u, mut p) = uniform(
            &mesh,
            &materials,
            1,
            &[0.5, 0.5],
            &[1.2, 1000.0],
            1.0e5,
            [0.0; 3],
        );
        u.set(3, l.density(0), 0, -1.0e-3);
        let err = clean_trace(&mesh, &materials, &CleanupThresholds::default(), &mut u, &mut p)
            .unwrap_err();
        match err {
            MultiMatError::NegativeDensity {
                material, location, ..
            } => {
                assert_eq!(material, 0);
                assert_eq!(location.element.get(), 3);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_serial() {
        let mesh = TetMesh::unit_box([2, 1, 1]).unwrap();
        let materials = two_fluids();
        let l = VariableLayout::of(&materials);
        let (mut u, mut p) = uniform(
            &mesh,
            &materials,
            4,
            &[1.0e-3, 1.0 - 1.0e-3],
            &[1.2, 1000.0],
            1.0e5,
            [0.0; 3],
        );
        p.set(0, l.pressure(0), 0, 1.0e-3 * 2.0e5);
        let (mut u2, mut p2) = (u.clone(), p.clone());
        let th = CleanupThresholds::default();
        let a = clean_trace(&mesh, &materials, &th, &mut u, &mut p).unwrap();
        let b = clean_trace_parallel(&mesh, &materials, &th, &mut u2, &mut p2).unwrap();
        assert_eq!(a, b);
        assert_eq!(u, u2);
        assert_eq!(p, p2);
    }
}
