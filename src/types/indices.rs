//! Strongly-typed index newtypes.
//!
//! These types prevent mixing up the different kinds of indices that flow
//! through the discretization (elements vs faces).

use std::fmt;

/// Macro to generate index newtypes with common functionality.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Create a new index.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// First index (0).
            pub const ZERO: Self = Self(0);

            /// Create an iterator over [0, n) indices.
            pub fn iter(n: usize) -> impl Iterator<Item = $name> + ExactSizeIterator {
                (0..n).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }

        impl<T> std::ops::Index<$name> for [T] {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }

        impl<T> std::ops::IndexMut<$name> for [T] {
            #[inline]
            fn index_mut(&mut self, idx: $name) -> &mut T {
                &mut self[idx.0]
            }
        }

        impl<T> std::ops::Index<$name> for Vec<T> {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }

        impl<T> std::ops::IndexMut<$name> for Vec<T> {
            #[inline]
            fn index_mut(&mut self, idx: $name) -> &mut T {
                &mut self[idx.0]
            }
        }
    };
}

define_index!(
    /// Tetrahedral element index.
    ///
    /// # Example
    ///
    /// ```
    /// use multimat_dg::types::ElementIndex;
    ///
    /// let elem = ElementIndex::new(42);
    /// assert_eq!(elem.get(), 42);
    /// ```
    ElementIndex,
    "E"
);

define_index!(
    /// Triangular face index.
    ///
    /// Boundary faces come first in [`crate::mesh::TetMesh`], followed by
    /// internal faces.
    FaceIndex,
    "F"
);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_index() {
        let idx = ElementIndex::new(42);
        assert_eq!(idx.get(), 42);
        assert_eq!(usize::from(idx), 42);
    }

    #[test]
    fn test_array_indexing() {
        let mut data = vec![10, 20, 30, 40, 50];
        let idx = ElementIndex::new(2);
        assert_eq!(data[idx], 30);
        data[idx] = 100;
        assert_eq!(data[2], 100);
    }

    #[test]
    fn test_iter() {
        let indices: Vec<_> = FaceIndex::iter(3).collect();
        assert_eq!(indices.len(), 3);
        assert_eq!(indices[2].get(), 2);
        assert_eq!(ElementIndex::iter(0).count(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ElementIndex::new(42)), "E42");
        assert_eq!(format!("{}", FaceIndex::new(10)), "F10");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&FaceIndex::new(2)).unwrap();
        assert_eq!(json, "2");
        let back: FaceIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(), 2);
    }
}
