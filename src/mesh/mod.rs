//! Tetrahedral mesh representation.
//!
//! Provides the mesh data the discretization consumes:
//! - element connectivity, face connectivity with left/right elements and
//!   side sets, elements surrounding elements and points
//! - element and face geometry (volume, centroid, inscribed length, face
//!   area, unit normal and centroid)
//! - structured box generators for tests and benchmarks
//! - partition-halo nodal extrema for the quadratic vertex-based limiter

mod generators;
mod halo;
mod tet_mesh;

pub use generators::BoxSide;
pub use halo::NodalExtrema;
pub use tet_mesh::{Face, LOCAL_FACES, TetMesh};
