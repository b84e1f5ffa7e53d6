//! Structured tetrahedral meshes of boxes, for tests and benchmarks.

use super::TetMesh;
use crate::error::{MultiMatError, Result};
use crate::types::{Bounds3D, Vec3};

/// Side sets of a box mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoxSide {
    XMin = 1,
    XMax = 2,
    YMin = 3,
    YMax = 4,
    ZMin = 5,
    ZMax = 6,
}

impl BoxSide {
    /// All six sides.
    pub const ALL: [BoxSide; 6] = [
        BoxSide::XMin,
        BoxSide::XMax,
        BoxSide::YMin,
        BoxSide::YMax,
        BoxSide::ZMin,
        BoxSide::ZMax,
    ];

    /// Side-set id.
    #[inline]
    pub fn id(self) -> usize {
        self as usize
    }
}

/// Axis orderings of the six Kuhn simplices of a cube.
const KUHN: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

impl TetMesh {
    /// Mesh of the unit cube with `n` hexahedra per direction.
    pub fn unit_box(n: [usize; 3]) -> Result<Self> {
        Self::structured_box(Bounds3D::unit_cube(), n)
    }

    /// Mesh of a box with `n[d]` hexahedra along direction `d`, each split
    /// into six tetrahedra sharing the main diagonal (a conforming Kuhn
    /// triangulation). Boundary faces carry [`BoxSide`] side sets.
    pub fn structured_box(bounds: Bounds3D, n: [usize; 3]) -> Result<Self> {
        if n.iter().any(|&c| c == 0) {
            return Err(MultiMatError::invalid_config(
                "need at least one cell in each direction",
            ));
        }
        let ext = bounds.extent();
        let h = [
            ext[0] / n[0] as f64,
            ext[1] / n[1] as f64,
            ext[2] / n[2] as f64,
        ];

        let idx = |i: usize, j: usize, k: usize| (k * (n[1] + 1) + j) * (n[0] + 1) + i;

        let mut coords = Vec::with_capacity((n[0] + 1) * (n[1] + 1) * (n[2] + 1));
        for k in 0..=n[2] {
            for j in 0..=n[1] {
                for i in 0..=n[0] {
                    coords.push([
                        bounds.min[0] + i as f64 * h[0],
                        bounds.min[1] + j as f64 * h[1],
                        bounds.min[2] + k as f64 * h[2],
                    ]);
                }
            }
        }

        let mut inpoel = Vec::with_capacity(6 * n[0] * n[1] * n[2]);
        for k in 0..n[2] {
            for j in 0..n[1] {
                for i in 0..n[0] {
                    for axes in &KUHN {
                        let mut c = [i, j, k];
                        let mut tet = [idx(c[0], c[1], c[2]); 4];
                        for (slot, &a) in axes.iter().enumerate() {
                            c[a] += 1;
                            tet[slot + 1] = idx(c[0], c[1], c[2]);
                        }
                        inpoel.push(tet);
                    }
                }
            }
        }

        let tol = 1e-9 * h.iter().copied().fold(f64::INFINITY, f64::min);
        let classify = |_: &[usize; 3], c: &Vec3| {
            let near = |a: f64, b: f64| (a - b).abs() < tol;
            let side = if near(c[0], bounds.min[0]) {
                BoxSide::XMin
            } else if near(c[0], bounds.max[0]) {
                BoxSide::XMax
            } else if near(c[1], bounds.min[1]) {
                BoxSide::YMin
            } else if near(c[1], bounds.max[1]) {
                BoxSide::YMax
            } else if near(c[2], bounds.min[2]) {
                BoxSide::ZMin
            } else if near(c[2], bounds.max[2]) {
                BoxSide::ZMax
            } else {
                return None;
            };
            Some(side.id())
        };

        Self::build(coords, inpoel, classify)
    }
}
