//! The nested tileset descriptor a renderer walks to pick tiles.
//!
//! ```json
//! {
//!   "boundingVolume": { "min": [0, 0, 0], "max": [10, 10, 10] },
//!   "content": "tile_0_0.glb",
//!   "children": [ ... ]
//! }
//! ```

use crate::aabb::Aabb;
use crate::errors::TileError;
use crate::float_types::Real;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default descriptor file name inside the output directory.
pub const DESCRIPTOR_FILE_NAME: &str = "tileset.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: [Real; 3],
    pub max: [Real; 3],
}

impl From<&Aabb> for BoundingVolume {
    fn from(aabb: &Aabb) -> Self {
        BoundingVolume {
            min: aabb.min_array(),
            max: aabb.max_array(),
        }
    }
}

impl BoundingVolume {
    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(self.min.into(), self.max.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub bounding_volume: BoundingVolume,
    /// Tile file, relative to the descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub children: Vec<Descriptor>,
}

impl Descriptor {
    /// Depth of the deepest entry, root at 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Every `content` uri, pre-order.
    pub fn contents(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_contents(&mut out);
        out
    }

    fn collect_contents<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(uri) = &self.content {
            out.push(uri);
        }
        for child in &self.children {
            child.collect_contents(out);
        }
    }

    /// Entries at `depth`, left to right.
    pub fn entries_at(&self, depth: usize) -> Vec<&Descriptor> {
        if depth == 0 {
            return vec![self];
        }
        self.children
            .iter()
            .flat_map(|c| c.entries_at(depth - 1))
            .collect()
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, TileError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| TileError::write(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Serialize to `path` through a sibling temp file and a rename, so a
    /// reader never sees a half-written descriptor.
    pub fn write_atomic(&self, path: impl AsRef<Path>) -> Result<(), TileError> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| TileError::write(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            TileError::write(path, e)
        })
    }
}
