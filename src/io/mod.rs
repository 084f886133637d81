//! Tile model writers.

mod glb;

pub use glb::GlbWriter;

use crate::errors::TileError;
use crate::export::TileBuffers;
use std::path::Path;

/// Serializes one tile's buffers to a model file.
///
/// Writers are shared across export jobs, so they must be `Send + Sync`.
pub trait ModelWriter: Send + Sync {
    fn write_model(&self, tile: &TileBuffers, path: &Path) -> Result<(), TileError>;

    /// File extension of the written models, without the dot.
    fn extension(&self) -> &str {
        "glb"
    }
}

impl<W: ModelWriter + ?Sized> ModelWriter for &W {
    fn write_model(&self, tile: &TileBuffers, path: &Path) -> Result<(), TileError> {
        (**self).write_model(tile, path)
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }
}
