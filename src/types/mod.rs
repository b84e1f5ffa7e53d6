//! Strongly-typed domain types for safer APIs.
//!
//! Index newtypes keep element and face indices apart at compile time;
//! `Bounds3D` describes box domains for structured meshes.

mod bounds;
mod indices;

pub use bounds::Bounds3D;
pub use indices::{ElementIndex, FaceIndex};

/// 3-vector.
pub type Vec3 = [f64; 3];

/// Row-major 3x3 tensor.
pub type Tensor3 = [[f64; 3]; 3];

/// 3x3 identity tensor.
pub const IDENTITY: Tensor3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Dot product of two 3-vectors.
#[inline]
pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Tensor-vector product `m * v`.
#[inline]
pub fn matvec(m: &Tensor3, v: &Vec3) -> Vec3 {
    [dot(&m[0], v), dot(&m[1], v), dot(&m[2], v)]
}
