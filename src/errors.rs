//! Tiling errors

use crate::aabb::Aabb;
use std::path::PathBuf;

/// Everything that can go wrong while building or exporting a tile hierarchy.
///
/// Only some of these abort a run. `EmptyGeometry` and `Decimation` are
/// recovered inside the exporter (the tile is skipped, or exported
/// undecimated) and only show up in the log.
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    /// (EmptyScene) No meshes were given to the spatial tree
    #[error("(EmptyScene) cannot build a spatial tree from zero meshes")]
    EmptyScene,

    /// (EmptyGeometry) A tile has no faces at export time
    #[error("(EmptyGeometry) tile {index} at level {level} has no faces")]
    EmptyGeometry { level: usize, index: usize },

    /// (Decimation) The decimator could not simplify a mesh
    #[error("(Decimation) {0}")]
    Decimation(#[from] DecimationError),

    /// (Write) A tile or descriptor file could not be written
    #[error("(Write) failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// (InvalidBounds) A node's bounding volume does not contain what it should
    #[error("(InvalidBounds) node at depth {depth} with bounds {node:?} does not contain {inner:?}")]
    InvalidBounds { depth: usize, node: Aabb, inner: Aabb },

    /// (MissingMesh) A tree node refers to a mesh index the exporter was not given
    #[error("(MissingMesh) mesh {0} is not in the exported mesh list")]
    MissingMesh(usize),

    /// (InvalidMesh) A source mesh is malformed (attribute lengths, triangle indices)
    #[error("(InvalidMesh) mesh {mesh}: {reason}")]
    InvalidMesh { mesh: usize, reason: String },

    /// (InvalidConfig) The tiling configuration is unusable
    #[error("(InvalidConfig) {0}")]
    InvalidConfig(String),

    /// (Descriptor) The tileset descriptor could not be serialized
    #[error("(Descriptor) {0}")]
    Descriptor(#[from] serde_json::Error),
}

impl TileError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Failures reported by a [`Decimator`](crate::decimate::Decimator).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecimationError {
    /// The target face count could not be reached
    #[error("could not reduce {faces} faces to {target}")]
    TargetUnreachable { faces: usize, target: usize },

    /// The input mesh cannot be simplified (no faces, bad indices, ...)
    #[error("mesh cannot be decimated: {0}")]
    InvalidMesh(String),
}
