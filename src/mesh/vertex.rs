//! A single mesh vertex with its optional attributes.

use crate::float_types::Real;
use nalgebra::{Point3, Vector2, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Option<Vector3<Real>>,
    pub uv: Option<Vector2<Real>>,
}

impl Vertex {
    #[inline]
    pub const fn new(pos: Point3<Real>) -> Self {
        Vertex {
            pos,
            normal: None,
            uv: None,
        }
    }

    /// Average of `vertices`.
    ///
    /// Normals are summed and renormalized; a vertex set whose normals cancel
    /// out falls back to `+Z`. Attributes only survive if every input has them.
    pub fn average(vertices: &[Vertex]) -> Option<Vertex> {
        if vertices.is_empty() {
            return None;
        }
        let n = vertices.len() as Real;

        let pos = vertices
            .iter()
            .fold(Point3::origin(), |acc, v| acc + v.pos.coords)
            / n;

        let normal = if vertices.iter().all(|v| v.normal.is_some()) {
            let sum = vertices
                .iter()
                .filter_map(|v| v.normal)
                .fold(Vector3::zeros(), |acc, n| acc + n);
            Some(if sum.norm() > Real::EPSILON {
                sum.normalize()
            } else {
                Vector3::z()
            })
        } else {
            None
        };

        let uv = if vertices.iter().all(|v| v.uv.is_some()) {
            Some(
                vertices
                    .iter()
                    .filter_map(|v| v.uv)
                    .fold(Vector2::zeros(), |acc, uv| acc + uv)
                    / n,
            )
        } else {
            None
        };

        Some(Vertex { pos, normal, uv })
    }
}
