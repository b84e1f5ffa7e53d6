//! Axis-aligned box bounds for structured mesh generation.

use std::fmt;

/// Axis-aligned box `[x_min, x_max] x [y_min, y_max] x [z_min, z_max]`.
///
/// # Example
///
/// ```
/// use multimat_dg::types::Bounds3D;
///
/// let bounds = Bounds3D::new([0.0, 0.0, 0.0], [2.0, 1.0, 0.5]);
/// assert_eq!(bounds.extent(), [2.0, 1.0, 0.5]);
/// assert_eq!(bounds.volume(), 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds3D {
    /// Lower corner.
    pub min: [f64; 3],
    /// Upper corner.
    pub max: [f64; 3],
}

impl Bounds3D {
    /// Create new box bounds.
    ///
    /// # Panics
    ///
    /// Panics if any `max[i] <= min[i]`.
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        for i in 0..3 {
            assert!(
                max[i] > min[i],
                "max[{}] ({}) must be greater than min[{}] ({})",
                i,
                max[i],
                i,
                min[i]
            );
        }
        Self { min, max }
    }

    /// Unit cube [0, 1]^3.
    pub fn unit_cube() -> Self {
        Self::new([0.0; 3], [1.0; 3])
    }

    /// Edge lengths along x, y and z.
    #[inline]
    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Box volume.
    #[inline]
    pub fn volume(&self) -> f64 {
        let e = self.extent();
        e[0] * e[1] * e[2]
    }

    /// Check if a point is inside the box (inclusive).
    #[inline]
    pub fn contains(&self, x: [f64; 3]) -> bool {
        (0..3).all(|i| x[i] >= self.min[i] && x[i] <= self.max[i])
    }
}

impl fmt::Display for Bounds3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}] x [{}, {}]",
            self.min[0], self.max[0], self.min[1], self.max[1], self.min[2], self.max[2]
        )
    }
}
