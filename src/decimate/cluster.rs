use crate::decimate::Decimator;
use crate::errors::DecimationError;
use crate::float_types::Real;
use crate::mesh::{Mesh, Vertex};
use hashbrown::HashMap;
use nalgebra::Point3;

/// **Vertex clustering simplification**
///
/// Overlays a uniform grid on the mesh's bounding box, collapses every
/// vertex in a cell onto the cell's average vertex and drops triangles
/// that collapse to a line or a point. The grid starts fine and is
/// coarsened (cell count halved per axis) until the face budget is met.
///
/// Clustering never produces *exactly* the target; it stops at the first
/// grid whose output fits. A grid so coarse that nothing survives counts as
/// failure.
#[derive(Debug, Clone, Copy)]
pub struct VertexClusterDecimator {
    /// Coarsening passes tried before giving up.
    pub max_passes: usize,
}

impl Default for VertexClusterDecimator {
    fn default() -> Self {
        Self { max_passes: 16 }
    }
}

impl Decimator for VertexClusterDecimator {
    fn decimate(&self, mesh: &Mesh, target_faces: usize) -> Result<Mesh, DecimationError> {
        mesh.validate()?;
        let faces = mesh.face_count();
        if faces <= target_faces {
            return Ok(mesh.clone());
        }
        let unreachable = DecimationError::TargetUnreachable {
            faces,
            target: target_faces,
        };
        if target_faces == 0 {
            return Err(unreachable);
        }

        let bounds = mesh.bounding_box();
        let extent = bounds.dim().max();
        if !(extent > 0.0) {
            return Err(unreachable);
        }

        // A grid of r³ cells holds roughly 2r² surface triangles.
        let mut resolution = ((target_faces as Real).sqrt().ceil() as usize).max(1) * 2;
        for _ in 0..self.max_passes {
            let simplified = cluster(mesh, &bounds.mins, extent / resolution as Real, resolution);
            if simplified.face_count() == 0 {
                break;
            }
            if simplified.face_count() <= target_faces {
                return Ok(simplified);
            }
            if resolution == 1 {
                break;
            }
            resolution /= 2;
        }
        Err(unreachable)
    }
}

/// Collapse `mesh` onto a grid of `resolution`³ cells of size `cell`.
fn cluster(mesh: &Mesh, origin: &Point3<Real>, cell: Real, resolution: usize) -> Mesh {
    let max_cell = resolution as i64 - 1;
    let cell_of = |p: &Point3<Real>| -> [i64; 3] {
        let q = (p - origin) / cell;
        [
            (q.x.floor() as i64).clamp(0, max_cell),
            (q.y.floor() as i64).clamp(0, max_cell),
            (q.z.floor() as i64).clamp(0, max_cell),
        ]
    };

    // cell → cluster slot, and each source vertex → cluster slot
    let mut slots: HashMap<[i64; 3], u32> = HashMap::new();
    let mut members: Vec<Vec<Vertex>> = Vec::new();
    let remap: Vec<u32> = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let slot = *slots.entry(cell_of(p)).or_insert_with(|| {
                members.push(Vec::new());
                (members.len() - 1) as u32
            });
            members[slot as usize].push(mesh.vertex(i));
            slot
        })
        .collect();

    let representatives: Vec<Vertex> = members
        .iter()
        .filter_map(|m| Vertex::average(m))
        .collect();

    let triangles = mesh
        .triangles
        .iter()
        .map(|tri| (*tri).map(|i| remap[i as usize]))
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    let mut out = Mesh::new(representatives.iter().map(|v| v.pos).collect(), triangles);
    out.name = mesh.name.clone();
    out.material = mesh.material;
    if mesh.has_normals() {
        out.normals = representatives.iter().filter_map(|v| v.normal).collect();
    }
    if mesh.has_uvs() {
        out.uvs = representatives.iter().filter_map(|v| v.uv).collect();
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reduces_a_dense_grid_below_target() {
        let mesh = Mesh::grid(Point3::origin(), 10.0, 10.0, 32);
        assert_eq!(mesh.face_count(), 2048);

        let out = VertexClusterDecimator::default().decimate(&mesh, 200).unwrap();
        assert!(out.face_count() > 0);
        assert!(out.face_count() <= 200, "got {} faces", out.face_count());
        assert!(out.validate().is_ok());
        assert_eq!(out.normals.len(), out.positions.len());
        assert_eq!(out.uvs.len(), out.positions.len());
    }

    #[test]
    fn mesh_within_budget_is_returned_unchanged() {
        let mesh = Mesh::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let out = VertexClusterDecimator::default().decimate(&mesh, 12).unwrap();
        assert_eq!(out.positions, mesh.positions);
        assert_eq!(out.triangles, mesh.triangles);
    }

    #[test]
    fn zero_target_is_unreachable() {
        let mesh = Mesh::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let err = VertexClusterDecimator::default().decimate(&mesh, 0).unwrap_err();
        assert_eq!(err, DecimationError::TargetUnreachable { faces: 12, target: 0 });
    }

    #[test]
    fn point_mesh_is_unreachable() {
        let p = Point3::new(2.0, 2.0, 2.0);
        let mesh = Mesh::new(vec![p; 6], vec![[0, 1, 2], [3, 4, 5]]);
        assert!(VertexClusterDecimator::default().decimate(&mesh, 1).is_err());
    }
}
