//! Procedural meshes used by the demo binary and the tests.

use crate::float_types::Real;
use crate::mesh::Mesh;
use nalgebra::{Point3, Vector2, Vector3};

impl Mesh {
    /// An axis-aligned box spanning `mins`..`maxs`.
    ///
    /// Each face gets its own four vertices so normals stay flat:
    /// 24 vertices, 12 triangles, wound counter-clockwise seen from outside.
    pub fn cuboid(mins: Point3<Real>, maxs: Point3<Real>) -> Mesh {
        let corner = |x: bool, y: bool, z: bool| {
            Point3::new(
                if x { maxs.x } else { mins.x },
                if y { maxs.y } else { mins.y },
                if z { maxs.z } else { mins.z },
            )
        };

        // (corners in CCW order from outside, normal)
        let faces = [
            ([(false, false, false), (false, true, false), (true, true, false), (true, false, false)], -Vector3::z()),
            ([(false, false, true), (true, false, true), (true, true, true), (false, true, true)], Vector3::z()),
            ([(false, false, false), (true, false, false), (true, false, true), (false, false, true)], -Vector3::y()),
            ([(false, true, false), (false, true, true), (true, true, true), (true, true, false)], Vector3::y()),
            ([(false, false, false), (false, false, true), (false, true, true), (false, true, false)], -Vector3::x()),
            ([(true, false, false), (true, true, false), (true, true, true), (true, false, true)], Vector3::x()),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);

        for (corners, normal) in faces {
            let base = positions.len() as u32;
            for (i, (x, y, z)) in corners.into_iter().enumerate() {
                positions.push(corner(x, y, z));
                normals.push(normal);
                uvs.push(Vector2::new(
                    if i == 1 || i == 2 { 1.0 } else { 0.0 },
                    if i >= 2 { 1.0 } else { 0.0 },
                ));
            }
            triangles.push([base, base + 1, base + 2]);
            triangles.push([base, base + 2, base + 3]);
        }

        Mesh::new(positions, triangles)
            .with_normals(normals)
            .with_uvs(uvs)
    }

    /// A flat `width` × `depth` sheet in the XY plane at height `origin.z`, cut into
    /// `divisions` × `divisions` quads (two triangles each).
    pub fn grid(origin: Point3<Real>, width: Real, depth: Real, divisions: u32) -> Mesh {
        let divisions = divisions.max(1);
        let stride = divisions + 1;
        let step_x = width / divisions as Real;
        let step_y = depth / divisions as Real;

        let mut positions = Vec::with_capacity((stride * stride) as usize);
        let mut uvs = Vec::with_capacity((stride * stride) as usize);
        for j in 0..stride {
            for i in 0..stride {
                positions.push(Point3::new(
                    origin.x + i as Real * step_x,
                    origin.y + j as Real * step_y,
                    origin.z,
                ));
                uvs.push(Vector2::new(
                    i as Real / divisions as Real,
                    j as Real / divisions as Real,
                ));
            }
        }
        let normals = vec![Vector3::z(); positions.len()];

        let mut triangles = Vec::with_capacity((divisions * divisions * 2) as usize);
        for j in 0..divisions {
            for i in 0..divisions {
                let a = j * stride + i;
                let b = a + 1;
                let c = a + stride + 1;
                let d = a + stride;
                triangles.push([a, b, c]);
                triangles.push([a, c, d]);
            }
        }

        Mesh::new(positions, triangles)
            .with_normals(normals)
            .with_uvs(uvs)
    }
}
