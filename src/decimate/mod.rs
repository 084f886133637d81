//! Mesh decimation seam.
//!
//! The exporter only needs *some* way to cut a mesh down to a face budget;
//! the algorithm is pluggable through [`Decimator`]. [`VertexClusterDecimator`]
//! is the default.

mod cluster;

pub use cluster::VertexClusterDecimator;

use crate::errors::DecimationError;
use crate::mesh::Mesh;

/// Reduces a mesh to at most `target_faces` triangles.
///
/// Implementations must not touch the input and must be usable from several
/// threads at once when the `parallel` feature is on.
pub trait Decimator: Send + Sync {
    fn decimate(&self, mesh: &Mesh, target_faces: usize) -> Result<Mesh, DecimationError>;
}

impl<D: Decimator + ?Sized> Decimator for &D {
    fn decimate(&self, mesh: &Mesh, target_faces: usize) -> Result<Mesh, DecimationError> {
        (**self).decimate(mesh, target_faces)
    }
}
