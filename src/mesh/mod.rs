//! `Mesh`: an indexed triangle list with optional normals and texture coordinates.

use crate::aabb::Aabb;
use crate::errors::DecimationError;
use crate::float_types::Real;
use nalgebra::{Point3, Vector2, Vector3};
use std::sync::OnceLock;

pub mod material;
pub mod shapes;
pub mod vertex;

pub use material::Material;
pub use vertex::Vertex;

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// Optional label, used in log messages
    pub name: Option<String>,

    pub positions: Vec<Point3<Real>>,

    /// Per-vertex normals. Either empty or the same length as `positions`.
    pub normals: Vec<Vector3<Real>>,

    /// Per-vertex texture coordinates. Either empty or the same length as `positions`.
    pub uvs: Vec<Vector2<Real>>,

    /// Counter-clockwise triangles indexing into `positions`.
    pub triangles: Vec<[u32; 3]>,

    /// Index into the scene's material list
    pub material: Option<usize>,

    /// Lazily calculated AABB that spans `positions`.
    pub bounding_box: OnceLock<Aabb>,
}

impl Mesh {
    pub fn new(positions: Vec<Point3<Real>>, triangles: Vec<[u32; 3]>) -> Self {
        Mesh {
            positions,
            triangles,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vector3<Real>>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vector2<Real>>) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    #[inline]
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Gather the attributes of vertex `index`.
    pub fn vertex(&self, index: usize) -> Vertex {
        Vertex {
            pos: self.positions[index],
            normal: self.normals.get(index).copied(),
            uv: self.uvs.get(index).copied(),
        }
    }

    /// Bounding box of all positions, computed once.
    /// A mesh without positions has an empty box.
    pub fn bounding_box(&self) -> Aabb {
        *self
            .bounding_box
            .get_or_init(|| Aabb::from_points(self.positions.iter()))
    }

    /// Drop the cached bounding box after editing `positions`.
    pub fn invalidate_bounding_box(&mut self) {
        self.bounding_box = OnceLock::new();
    }

    /// Check that attribute arrays line up and every triangle index is in range.
    pub fn validate(&self) -> Result<(), DecimationError> {
        let n = self.positions.len();
        if self.has_normals() && self.normals.len() != n {
            return Err(DecimationError::InvalidMesh(format!(
                "{} normals for {} positions",
                self.normals.len(),
                n
            )));
        }
        if self.has_uvs() && self.uvs.len() != n {
            return Err(DecimationError::InvalidMesh(format!(
                "{} uvs for {} positions",
                self.uvs.len(),
                n
            )));
        }
        if let Some(tri) = self
            .triangles
            .iter()
            .find(|tri| tri.iter().any(|&i| i as usize >= n))
        {
            return Err(DecimationError::InvalidMesh(format!(
                "triangle {tri:?} indexes past {n} positions"
            )));
        }
        Ok(())
    }
}
