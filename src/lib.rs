//! Partition a mesh scene into a spatial tree and export it as a
//! **multi-resolution tile hierarchy**: one binary glTF file per tree node,
//! decimated for its level, plus a nested `tileset.json` descriptor a
//! streaming renderer walks to pick tiles by viewing distance.
//!
//! ```rust,no_run
//! use lodtiler::{SpatialTree, TileExporter, TilingConfig};
//! # let meshes: Vec<lodtiler::Mesh> = Vec::new();
//! let config = TilingConfig::default();
//! let tree = SpatialTree::from_meshes(&meshes, &config)?;
//! let summary = TileExporter::new(config)?.export_all(&tree, &meshes, &[], "out")?;
//! println!("{} tiles", summary.tiles_written);
//! # Ok::<(), lodtiler::TileError>(())
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon to export tiles concurrently

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::all)]

pub mod aabb;
pub mod config;
pub mod decimate;
pub mod errors;
pub mod export;
pub mod float_types;
pub mod io;
pub mod mesh;
pub mod tree;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use aabb::Aabb;
pub use config::{LevelMap, PaddingPolicy, TilingConfig};
pub use decimate::{Decimator, VertexClusterDecimator};
pub use errors::{DecimationError, TileError};
pub use export::{ExportSummary, TileExporter};
pub use io::{GlbWriter, ModelWriter};
pub use mesh::{Material, Mesh};
pub use tree::{SpatialTree, TileNode};
