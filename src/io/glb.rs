#![doc = " Binary glTF 2.0 (`.glb`) tile writer"]
#![doc = ""]
#![doc = " Each tile becomes one self-contained file: a JSON chunk describing a"]
#![doc = " single mesh (one primitive per material run) and a BIN chunk holding"]
#![doc = " positions, optional normals and texture coordinates, per-vertex batch"]
#![doc = " ids and the index buffer."]

use crate::errors::TileError;
use crate::export::TileBuffers;
use crate::io::ModelWriter;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const FLOAT: u32 = 5126;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Writes tiles as binary glTF.
///
/// Output is a pure function of the tile buffers: identical geometry gives
/// byte-identical files.
///
/// A tile with exactly 65 536 vertices is written with 16-bit indices up to
/// 65 535, see [`NARROW_INDEX_LIMIT`](crate::export::NARROW_INDEX_LIMIT).
/// glTF 2.0 reserves that value for primitive restart, so such a file is
/// not strictly valid glTF and strict validators reject it.
#[derive(Debug, Clone)]
pub struct GlbWriter {
    /// `asset.generator` in the JSON chunk
    pub generator: String,
}

impl Default for GlbWriter {
    fn default() -> Self {
        GlbWriter {
            generator: concat!("lodtiler ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ModelWriter for GlbWriter {
    fn write_model(&self, tile: &TileBuffers, path: &Path) -> Result<(), TileError> {
        let bytes = self.to_glb(tile)?;
        fs::write(path, bytes).map_err(|e| TileError::write(path, e))
    }
}

/// Appends byte runs to the BIN chunk and records a buffer view for each.
struct BinBuilder {
    data: Vec<u8>,
    views: Vec<Value>,
}

impl BinBuilder {
    fn push_view(&mut self, bytes: &[u8], target: u32) -> usize {
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        align(&mut self.data, 4, 0);
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
            "target": target,
        }));
        self.views.len() - 1
    }
}

fn align(buffer: &mut Vec<u8>, alignment: usize, fill: u8) {
    let padding = (alignment - buffer.len() % alignment) % alignment;
    buffer.resize(buffer.len() + padding, fill);
}

fn float_bytes<const N: usize>(items: &[[f32; N]]) -> Vec<u8> {
    items
        .iter()
        .flat_map(|v| v.iter().flat_map(|c| c.to_le_bytes()))
        .collect()
}

impl GlbWriter {
    /// Build the complete `.glb` byte stream for `tile`.
    pub fn to_glb(&self, tile: &TileBuffers) -> Result<Vec<u8>, TileError> {
        let vertex_count = tile.vertex_count();
        let mut bin = BinBuilder {
            data: Vec::new(),
            views: Vec::new(),
        };
        let mut accessors = Vec::new();
        let mut attributes = serde_json::Map::new();

        let view = bin.push_view(&float_bytes(&tile.positions), ARRAY_BUFFER);
        accessors.push(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": vertex_count,
            "type": "VEC3",
            "min": tile.position_min,
            "max": tile.position_max,
        }));
        attributes.insert("POSITION".into(), json!(accessors.len() - 1));

        if let Some(normals) = &tile.normals {
            let view = bin.push_view(&float_bytes(normals), ARRAY_BUFFER);
            accessors.push(json!({
                "bufferView": view,
                "componentType": FLOAT,
                "count": vertex_count,
                "type": "VEC3",
            }));
            attributes.insert("NORMAL".into(), json!(accessors.len() - 1));
        }

        if let Some(uvs) = &tile.uvs {
            let view = bin.push_view(&float_bytes(uvs), ARRAY_BUFFER);
            accessors.push(json!({
                "bufferView": view,
                "componentType": FLOAT,
                "count": vertex_count,
                "type": "VEC2",
            }));
            attributes.insert("TEXCOORD_0".into(), json!(accessors.len() - 1));
        }

        let batch_bytes: Vec<u8> = tile.batch_ids.iter().flat_map(|b| b.to_le_bytes()).collect();
        let view = bin.push_view(&batch_bytes, ARRAY_BUFFER);
        accessors.push(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": vertex_count,
            "type": "SCALAR",
        }));
        attributes.insert("_BATCHID".into(), json!(accessors.len() - 1));

        let index_view = bin.push_view(&tile.indices.to_le_bytes(), ELEMENT_ARRAY_BUFFER);
        let stride = tile.indices.stride();
        let primitives: Vec<Value> = tile
            .primitives
            .iter()
            .map(|p| {
                accessors.push(json!({
                    "bufferView": index_view,
                    "byteOffset": p.first_index * stride,
                    "componentType": tile.indices.component_type(),
                    "count": p.index_count,
                    "type": "SCALAR",
                }));
                json!({
                    "attributes": attributes,
                    "indices": accessors.len() - 1,
                    "material": p.material,
                    "mode": 4,
                })
            })
            .collect();

        let materials: Vec<Value> = tile
            .materials
            .iter()
            .map(|m| {
                let mut value = json!({
                    "pbrMetallicRoughness": {
                        "baseColorFactor": m.base_color_factor,
                        "metallicFactor": m.metallic_factor,
                        "roughnessFactor": m.roughness_factor,
                    },
                    "doubleSided": m.double_sided,
                });
                if let Some(name) = &m.name {
                    value["name"] = json!(name);
                }
                value
            })
            .collect();

        let document = json!({
            "asset": { "version": "2.0", "generator": self.generator },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0 }],
            "meshes": [{ "primitives": primitives }],
            "materials": materials,
            "accessors": accessors,
            "bufferViews": bin.views,
            "buffers": [{ "byteLength": bin.data.len() }],
        });

        let mut json_bytes = serde_json::to_vec(&document)?;
        align(&mut json_bytes, 4, b' ');
        let mut bin_bytes = bin.data;
        align(&mut bin_bytes, 4, 0);

        let total = 12 + 8 + json_bytes.len() + 8 + bin_bytes.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(GLB_MAGIC);
        glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());

        glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        glb.extend_from_slice(&json_bytes);

        glb.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(&bin_bytes);

        Ok(glb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Material, Mesh};
    use crate::tree::MeshRef;
    use nalgebra::Point3;
    use std::borrow::Cow;

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn json_chunk(glb: &[u8]) -> Value {
        let len = read_u32(glb, 12) as usize;
        serde_json::from_slice(&glb[20..20 + len]).unwrap()
    }

    fn cube_tile() -> TileBuffers {
        let mesh = Mesh::cuboid(Point3::origin(), Point3::new(2.0, 1.0, 1.0));
        let mesh_ref = MeshRef {
            mesh: 0,
            material: Some(0),
            bounds: mesh.bounding_box(),
        };
        TileBuffers::build(
            &[(Cow::Borrowed(&mesh), mesh_ref)],
            &[Material::with_color(0.5, 0.5, 0.5, 1.0).named("grey")],
        )
    }

    #[test]
    fn header_and_chunks_are_well_formed() {
        let glb = GlbWriter::default().to_glb(&cube_tile()).unwrap();
        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(read_u32(&glb, 4), 2);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);

        let json_len = read_u32(&glb, 12) as usize;
        assert_eq!(json_len % 4, 0);
        assert_eq!(read_u32(&glb, 16), CHUNK_JSON);
        let bin_at = 20 + json_len;
        assert_eq!(read_u32(&glb, bin_at + 4), CHUNK_BIN);
        assert_eq!(bin_at + 8 + read_u32(&glb, bin_at) as usize, glb.len());
    }

    #[test]
    fn document_describes_the_tile() {
        let tile = cube_tile();
        let doc = json_chunk(&GlbWriter::default().to_glb(&tile).unwrap());

        let primitive = &doc["meshes"][0]["primitives"][0];
        for attribute in ["POSITION", "NORMAL", "TEXCOORD_0", "_BATCHID"] {
            assert!(primitive["attributes"].get(attribute).is_some(), "{attribute}");
        }
        let position = &doc["accessors"][primitive["attributes"]["POSITION"].as_u64().unwrap() as usize];
        assert_eq!(position["count"], 24);
        assert_eq!(position["max"], json!([2.0, 1.0, 1.0]));

        let indices = &doc["accessors"][primitive["indices"].as_u64().unwrap() as usize];
        assert_eq!(indices["componentType"], 5123);
        assert_eq!(indices["count"], 36);
        assert_eq!(doc["materials"][0]["name"], "grey");
    }

    #[test]
    fn output_is_deterministic() {
        let writer = GlbWriter::default();
        assert_eq!(writer.to_glb(&cube_tile()).unwrap(), writer.to_glb(&cube_tile()).unwrap());
    }
}
