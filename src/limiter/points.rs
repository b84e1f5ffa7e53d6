//! Reference-element evaluation points shared by all limiters.
//!
//! Elements are affine images of the reference tetrahedron, so basis values
//! at face quadrature points, volume quadrature points and vertices are the
//! same for every element and are tabulated once.

use crate::basis::{BasisValues, REF_VERTICES, eval_basis_at};
use crate::error::Result;
use crate::mesh::LOCAL_FACES;
use crate::quadrature::{face_point, face_rule, volume_rule};

/// Basis values at the points where limited solutions are checked.
#[derive(Clone, Debug)]
pub struct ReferencePoints {
    rdof: usize,
    face: Vec<BasisValues>,
    volume: Vec<BasisValues>,
    vertex: [BasisValues; 4],
}

impl ReferencePoints {
    /// Tabulate for `rdof` degrees of freedom.
    pub fn new(rdof: usize) -> Result<Self> {
        let tri = face_rule(rdof)?;
        let mut face = Vec::with_capacity(4 * tri.len());
        for lf in LOCAL_FACES {
            let verts = [REF_VERTICES[lf[0]], REF_VERTICES[lf[1]], REF_VERTICES[lf[2]]];
            for (xi, _) in tri.iter() {
                face.push(eval_basis_at(rdof, &face_point(&verts, xi)));
            }
        }
        let volume = if rdof > 4 {
            volume_rule(rdof)?
                .iter()
                .map(|(xi, _)| eval_basis_at(rdof, xi))
                .collect()
        } else {
            Vec::new()
        };
        let vertex = REF_VERTICES.map(|v| eval_basis_at(rdof, &v));
        Ok(Self {
            rdof,
            face,
            volume,
            vertex,
        })
    }

    /// Degrees of freedom the table was built for.
    #[inline]
    pub fn rdof(&self) -> usize {
        self.rdof
    }

    /// Basis values at the face quadrature points of all four faces.
    #[inline]
    pub fn face(&self) -> &[BasisValues] {
        &self.face
    }

    /// Face points followed, for quadratic data, by volume points.
    pub fn check_points(&self) -> impl Iterator<Item = &BasisValues> + '_ {
        self.face.iter().chain(self.volume.iter())
    }

    /// Basis values at local vertex `lv`.
    #[inline]
    pub fn vertex(&self, lv: usize) -> &BasisValues {
        &self.vertex[lv]
    }
}

/// Value of one variable at a point: `Σ modes[i] b[i]`.
#[inline]
pub(crate) fn eval_modes(modes: &[f64], b: &BasisValues) -> f64 {
    modes.iter().zip(b.iter()).map(|(m, bi)| m * bi).sum()
}
