//! GPU-ready vertex, index and material buffers for one tile.

use crate::mesh::{Material, Mesh};
use crate::tree::MeshRef;
use hashbrown::HashMap;
use log::warn;
use std::borrow::Cow;

/// Tiles with at most this many unique vertices use 16-bit indices.
///
/// At exactly this count the largest index is 65 535, which glTF 2.0
/// reserves for primitive restart; strict validators flag such tiles.
pub const NARROW_INDEX_LIMIT: usize = 1 << 16;

/// glTF accessor component types
pub const UNSIGNED_SHORT: u32 = 5123;
pub const UNSIGNED_INT: u32 = 5125;

/// A tile's index buffer, narrowed to 16 bits when the vertex count allows.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    fn from_wide(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count <= NARROW_INDEX_LIMIT {
            IndexBuffer::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            IndexBuffer::U32(indices)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn is_wide(&self) -> bool {
        matches!(self, IndexBuffer::U32(_))
    }

    /// Bytes per index
    pub const fn stride(&self) -> usize {
        match self {
            IndexBuffer::U16(_) => 2,
            IndexBuffer::U32(_) => 4,
        }
    }

    pub const fn component_type(&self) -> u32 {
        match self {
            IndexBuffer::U16(_) => UNSIGNED_SHORT,
            IndexBuffer::U32(_) => UNSIGNED_INT,
        }
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexBuffer::U16(v) => v.get(i).map(|&x| x as u32),
            IndexBuffer::U32(v) => v.get(i).copied(),
        }
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            IndexBuffer::U16(v) => v.iter().flat_map(|i| i.to_le_bytes()).collect(),
            IndexBuffer::U32(v) => v.iter().flat_map(|i| i.to_le_bytes()).collect(),
        }
    }
}

/// A run of the index buffer drawn with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    /// Slot in [`TileBuffers::materials`]
    pub material: usize,
    pub first_index: usize,
    pub index_count: usize,
}

/// Everything a model writer needs for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileBuffers {
    pub positions: Vec<[f32; 3]>,
    /// Present only when every drawn mesh in the tile has normals
    pub normals: Option<Vec<[f32; 3]>>,
    /// Present only when every drawn mesh in the tile has texture coordinates
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Per vertex, the slot of the source mesh within this tile
    pub batch_ids: Vec<f32>,
    pub indices: IndexBuffer,
    pub primitives: Vec<Primitive>,
    /// Only the materials this tile references, in first-use order
    pub materials: Vec<Material>,
    pub position_min: [f32; 3],
    pub position_max: [f32; 3],
}

impl TileBuffers {
    /// Pack `meshes` into one vertex buffer and one index buffer.
    ///
    /// Every mesh must pass [`Mesh::validate`]; the exporter checks this
    /// before calling.
    ///
    /// Vertices are deduplicated by identity: each `(mesh slot, source
    /// vertex)` pair is emitted once, the first time a triangle uses it, and
    /// vertices no triangle uses are dropped. Materials are compacted
    /// through a cache keyed by source material; meshes without one (or
    /// with an index past `source_materials`) share a default material.
    /// Both caches live only for this call.
    #[allow(clippy::unnecessary_cast)]
    pub fn build(meshes: &[(Cow<'_, Mesh>, MeshRef)], source_materials: &[Material]) -> Self {
        let drawn = || meshes.iter().map(|(m, _)| m).filter(|m| !m.triangles.is_empty());
        let with_normals = drawn().next().is_some()
            && drawn().all(|m| m.has_normals() && m.normals.len() == m.vertex_count());
        let with_uvs = drawn().next().is_some()
            && drawn().all(|m| m.has_uvs() && m.uvs.len() == m.vertex_count());

        let mut vertex_cache: HashMap<(usize, u32), u32> = HashMap::new();
        let mut material_cache: HashMap<Option<usize>, usize> = HashMap::new();

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut batch_ids = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut primitives = Vec::new();
        let mut materials = Vec::new();
        let mut position_min = [f32::INFINITY; 3];
        let mut position_max = [f32::NEG_INFINITY; 3];

        for (slot, (mesh, mesh_ref)) in meshes.iter().enumerate() {
            if mesh.triangles.is_empty() {
                continue;
            }

            if let Some(m) = mesh_ref.material.filter(|&m| m >= source_materials.len()) {
                warn!(
                    "mesh {} uses material {m} but only {} were given, using the default",
                    mesh_ref.mesh,
                    source_materials.len()
                );
            }
            let resolved = mesh_ref
                .material
                .filter(|&m| m < source_materials.len());
            let material = *material_cache.entry(resolved).or_insert_with(|| {
                materials.push(
                    resolved
                        .map(|m| source_materials[m].clone())
                        .unwrap_or_default(),
                );
                materials.len() - 1
            });

            let first_index = indices.len();
            for tri in &mesh.triangles {
                for &src in tri {
                    let out = *vertex_cache.entry((slot, src)).or_insert_with(|| {
                        let i = src as usize;
                        let p = mesh.positions[i];
                        let p = [p.x as f32, p.y as f32, p.z as f32];
                        for axis in 0..3 {
                            position_min[axis] = position_min[axis].min(p[axis]);
                            position_max[axis] = position_max[axis].max(p[axis]);
                        }
                        positions.push(p);
                        if with_normals {
                            let n = mesh.normals[i];
                            normals.push([n.x as f32, n.y as f32, n.z as f32]);
                        }
                        if with_uvs {
                            let uv = mesh.uvs[i];
                            uvs.push([uv.x as f32, uv.y as f32]);
                        }
                        batch_ids.push(slot as f32);
                        (positions.len() - 1) as u32
                    });
                    indices.push(out);
                }
            }

            primitives.push(Primitive {
                material,
                first_index,
                index_count: indices.len() - first_index,
            });
        }

        let vertex_count = positions.len();
        TileBuffers {
            positions,
            normals: with_normals.then_some(normals),
            uvs: with_uvs.then_some(uvs),
            batch_ids,
            indices: IndexBuffer::from_wide(indices, vertex_count),
            primitives,
            materials,
            position_min,
            position_max,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// `true` when no triangle made it into the tile.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn entry(mesh: &Mesh, index: usize, material: Option<usize>) -> (Cow<'_, Mesh>, MeshRef) {
        (
            Cow::Borrowed(mesh),
            MeshRef {
                mesh: index,
                material,
                bounds: mesh.bounding_box(),
            },
        )
    }

    #[test]
    fn shared_vertices_are_emitted_once() {
        let quad = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let buffers = TileBuffers::build(&[entry(&quad, 0, None)], &[]);
        assert_eq!(buffers.vertex_count(), 4);
        assert_eq!(buffers.indices, IndexBuffer::U16(vec![0, 1, 2, 0, 2, 3]));
        assert_eq!(buffers.position_min, [0.0, 0.0, 0.0]);
        assert_eq!(buffers.position_max, [1.0, 1.0, 0.0]);
        assert!(buffers.normals.is_none());
    }

    #[test]
    fn unused_vertices_are_dropped() {
        let tri = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(9.0, 9.0, 9.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 2, 3]],
        );
        let buffers = TileBuffers::build(&[entry(&tri, 0, None)], &[]);
        assert_eq!(buffers.vertex_count(), 3);
        assert_eq!(buffers.position_max, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn materials_are_compacted_in_first_use_order() {
        let a = Mesh::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = Mesh::cuboid(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0));
        let c = Mesh::cuboid(Point3::new(4.0, 0.0, 0.0), Point3::new(5.0, 1.0, 1.0));
        let library = vec![
            Material::with_color(1.0, 0.0, 0.0, 1.0).named("red"),
            Material::with_color(0.0, 1.0, 0.0, 1.0).named("green"),
            Material::with_color(0.0, 0.0, 1.0, 1.0).named("blue"),
        ];

        let buffers = TileBuffers::build(
            &[entry(&a, 0, Some(2)), entry(&b, 1, Some(0)), entry(&c, 2, Some(2))],
            &library,
        );
        assert_eq!(buffers.materials.len(), 2);
        assert_eq!(buffers.materials[0].name.as_deref(), Some("blue"));
        assert_eq!(buffers.materials[1].name.as_deref(), Some("red"));
        let slots: Vec<usize> = buffers.primitives.iter().map(|p| p.material).collect();
        assert_eq!(slots, vec![0, 1, 0]);
    }

    #[test]
    fn missing_material_uses_default() {
        let a = Mesh::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let buffers = TileBuffers::build(&[entry(&a, 0, Some(5)), entry(&a, 1, None)], &[]);
        assert_eq!(buffers.materials, vec![Material::default()]);
        assert_eq!(buffers.primitives.len(), 2);
    }

    #[test]
    fn unknown_material_index_shares_the_default_slot() {
        let a = Mesh::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let red = Material::with_color(1.0, 0.0, 0.0, 1.0).named("red");
        let buffers = TileBuffers::build(
            &[entry(&a, 0, Some(0)), entry(&a, 1, Some(7)), entry(&a, 2, None)],
            std::slice::from_ref(&red),
        );
        assert_eq!(buffers.materials, vec![red, Material::default()]);
        let slots: Vec<usize> = buffers.primitives.iter().map(|p| p.material).collect();
        assert_eq!(slots, vec![0, 1, 1]);
    }

    #[test]
    fn same_mesh_twice_is_not_merged_across_slots() {
        let a = Mesh::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let buffers = TileBuffers::build(&[entry(&a, 0, None), entry(&a, 1, None)], &[]);
        assert_eq!(buffers.vertex_count(), 48);
        assert_eq!(buffers.batch_ids[0], 0.0);
        assert_eq!(buffers.batch_ids[47], 1.0);
        assert_eq!(buffers.primitives[1].first_index, 36);
        assert!(buffers.normals.is_some());
        assert!(buffers.uvs.is_some());
    }

    #[test]
    fn empty_input_is_empty() {
        let buffers = TileBuffers::build(&[], &[]);
        assert!(buffers.is_empty());
        assert_eq!(buffers.indices, IndexBuffer::U16(Vec::new()));
    }
}
