//! Unstructured tetrahedral mesh with the derived connectivity and geometry
//! the discretization consumes.

use std::collections::HashMap;

use crate::basis::jacobian_det;
use crate::error::{MultiMatError, Result};
use crate::types::Vec3;

/// Local faces of a tetrahedron, face `i` opposite vertex `i`, ordered so
/// that the right-hand normal points out of a positively oriented element.
pub const LOCAL_FACES: [[usize; 3]; 4] = [[1, 2, 3], [2, 0, 3], [3, 0, 1], [0, 2, 1]];

/// A triangular face between a left element and a right element (or the
/// outside of the domain).
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    /// Vertex ids, ordered so the normal points from left to right.
    pub vertices: [usize; 3],
    /// Element on the left (normal points away from it).
    pub left: usize,
    /// Element on the right, `None` on the domain boundary.
    pub right: Option<usize>,
    /// Side-set id of a boundary face.
    pub sideset: Option<usize>,
    /// Face area.
    pub area: f64,
    /// Unit normal pointing from left to right.
    pub normal: Vec3,
    /// Face centroid.
    pub centroid: Vec3,
}

impl Face {
    /// Whether this face lies on the domain boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.right.is_none()
    }
}

/// Tetrahedral mesh.
///
/// Faces are stored with all boundary faces first, so `faces[..n_boundary_faces]`
/// are boundary faces and the rest are interior.
#[derive(Clone, Debug)]
pub struct TetMesh {
    /// Vertex coordinates.
    pub coords: Vec<Vec3>,
    /// Element-to-vertex connectivity, positively oriented.
    pub inpoel: Vec<[usize; 4]>,
    /// Faces, boundary faces first.
    pub faces: Vec<Face>,
    /// Number of boundary faces.
    pub n_boundary_faces: usize,
    /// Neighbor across each local face (`None` on the boundary).
    pub esuel: Vec<[Option<usize>; 4]>,
    /// Global face id of each local face.
    pub element_faces: Vec<[usize; 4]>,
    /// Elements surrounding each point, sorted.
    pub esup: Vec<Vec<usize>>,
    /// Element volumes.
    pub volume: Vec<f64>,
    /// Element centroids.
    pub centroid: Vec<Vec3>,
    /// Inscribed-sphere diameter of each element.
    pub length: Vec<f64>,
}

fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn sorted(mut v: [usize; 3]) -> [usize; 3] {
    v.sort_unstable();
    v
}

impl TetMesh {
    /// Build a mesh from vertices, element connectivity and the side-set
    /// membership of boundary triangles.
    ///
    /// Negatively oriented elements are reoriented. Boundary faces not listed
    /// in `sidesets` get no side set.
    ///
    /// # Arguments
    /// * `coords` - Vertex coordinates
    /// * `inpoel` - Four vertex ids per element
    /// * `sidesets` - `(triangle, side-set id)` pairs, vertex order ignored
    pub fn new(
        coords: Vec<Vec3>,
        inpoel: Vec<[usize; 4]>,
        sidesets: &[([usize; 3], usize)],
    ) -> Result<Self> {
        let lookup: HashMap<[usize; 3], usize> =
            sidesets.iter().map(|(tri, id)| (sorted(*tri), *id)).collect();
        Self::build(coords, inpoel, |tri, _| lookup.get(&sorted(*tri)).copied())
    }

    /// Build a mesh, classifying boundary faces with `classify(vertices,
    /// centroid)`.
    pub(crate) fn build(
        coords: Vec<Vec3>,
        mut inpoel: Vec<[usize; 4]>,
        classify: impl Fn(&[usize; 3], &Vec3) -> Option<usize>,
    ) -> Result<Self> {
        let npoin = coords.len();
        let nelem = inpoel.len();
        if nelem == 0 {
            return Err(MultiMatError::invalid_config("mesh has no elements"));
        }

        let mut volume = Vec::with_capacity(nelem);
        let mut centroid = Vec::with_capacity(nelem);
        for (e, tet) in inpoel.iter_mut().enumerate() {
            if tet.iter().any(|&p| p >= npoin) {
                return Err(MultiMatError::invalid_config(format!(
                    "element {e} references a vertex out of range"
                )));
            }
            let [a, b, c, d] = tet.map(|p| coords[p]);
            let mut det = jacobian_det(&a, &b, &c, &d);
            if det.abs() < f64::MIN_POSITIVE {
                return Err(MultiMatError::invalid_config(format!(
                    "element {e} is degenerate"
                )));
            }
            if det < 0.0 {
                tet.swap(2, 3);
                det = -det;
            }
            volume.push(det / 6.0);
            let mut c = [0.0; 3];
            for p in tet.iter() {
                for d in 0..3 {
                    c[d] += 0.25 * coords[*p][d];
                }
            }
            centroid.push(c);
        }

        // Pair local faces through their sorted vertex triple
        let mut open: HashMap<[usize; 3], (usize, usize)> = HashMap::with_capacity(2 * nelem);
        let mut esuel = vec![[None; 4]; nelem];
        let mut pending: Vec<(usize, usize, Option<(usize, usize)>)> =
            Vec::with_capacity(2 * nelem);
        let mut slot_of: HashMap<(usize, usize), usize> = HashMap::with_capacity(2 * nelem);
        for (e, tet) in inpoel.iter().enumerate() {
            for (lf, lp) in LOCAL_FACES.iter().enumerate() {
                let key = sorted(lp.map(|i| tet[i]));
                match open.remove(&key) {
                    Some((other, olf)) => {
                        esuel[e][lf] = Some(other);
                        esuel[other][olf] = Some(e);
                        let slot = slot_of[&(other, olf)];
                        pending[slot].2 = Some((e, lf));
                    }
                    None => {
                        open.insert(key, (e, lf));
                        slot_of.insert((e, lf), pending.len());
                        pending.push((e, lf, None));
                    }
                }
            }
        }

        let (boundary, interior): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|(_, _, right)| right.is_none());
        let n_boundary_faces = boundary.len();

        let mut faces = Vec::with_capacity(n_boundary_faces + interior.len());
        let mut element_faces = vec![[0usize; 4]; nelem];
        for (e, lf, right) in boundary.into_iter().chain(interior) {
            let vertices = LOCAL_FACES[lf].map(|i| inpoel[e][i]);
            let [p0, p1, p2] = vertices.map(|p| coords[p]);
            let n = cross(&sub(&p1, &p0), &sub(&p2, &p0));
            let norm = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            let fcent = [
                (p0[0] + p1[0] + p2[0]) / 3.0,
                (p0[1] + p1[1] + p2[1]) / 3.0,
                (p0[2] + p1[2] + p2[2]) / 3.0,
            ];
            let id = faces.len();
            element_faces[e][lf] = id;
            if let Some((r, rlf)) = right {
                element_faces[r][rlf] = id;
            }
            faces.push(Face {
                vertices,
                left: e,
                right: right.map(|(r, _)| r),
                sideset: if right.is_none() {
                    classify(&vertices, &fcent)
                } else {
                    None
                },
                area: 0.5 * norm,
                normal: [n[0] / norm, n[1] / norm, n[2] / norm],
                centroid: fcent,
            });
        }

        let mut esup = vec![Vec::new(); npoin];
        for (e, tet) in inpoel.iter().enumerate() {
            for &p in tet {
                esup[p].push(e);
            }
        }

        let length = (0..nelem)
            .map(|e| {
                let total: f64 = element_faces[e].iter().map(|&f| faces[f].area).sum();
                6.0 * volume[e] / total
            })
            .collect();

        Ok(Self {
            coords,
            inpoel,
            faces,
            n_boundary_faces,
            esuel,
            element_faces,
            esup,
            volume,
            centroid,
            length,
        })
    }

    /// Number of elements.
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.inpoel.len()
    }

    /// Number of vertices.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.coords.len()
    }

    /// Number of faces.
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// Vertex coordinates of element `e`.
    #[inline]
    pub fn element_vertices(&self, e: usize) -> [Vec3; 4] {
        self.inpoel[e].map(|p| self.coords[p])
    }

    /// Vertex coordinates of face `f`.
    #[inline]
    pub fn face_vertices(&self, f: usize) -> [Vec3; 3] {
        self.faces[f].vertices.map(|p| self.coords[p])
    }

    /// Boundary faces.
    pub fn boundary_faces(&self) -> &[Face] {
        &self.faces[..self.n_boundary_faces]
    }

    /// Interior faces (ids start at `n_boundary_faces`).
    pub fn interior_faces(&self) -> &[Face] {
        &self.faces[self.n_boundary_faces..]
    }

    /// Side-set ids present on the boundary, sorted.
    pub fn sidesets(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.boundary_faces().iter().filter_map(|f| f.sideset).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Smallest inscribed diameter.
    pub fn h_min(&self) -> f64 {
        self.length.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Total mesh volume.
    pub fn total_volume(&self) -> f64 {
        self.volume.iter().sum()
    }
}
