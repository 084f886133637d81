//! LOD tile export.
//!
//! [`TileExporter::export_all`] walks a finalized [`SpatialTree`] and turns
//! every node into one tile:
//!
//! * a node at depth `d` is exported at level `d`, decimated to
//!   `LevelMap::ratio(d)` of its faces (terminal buckets keep full detail);
//! * the decimated meshes are packed into [`TileBuffers`] and handed to a
//!   [`ModelWriter`] as `tile_{level}_{index}.{ext}`;
//! * the node's bounds and tile uri become one [`Descriptor`] entry.
//!
//! The descriptor is written last, and only when every tile was written.

mod buffers;
mod descriptor;

pub use buffers::{IndexBuffer, NARROW_INDEX_LIMIT, Primitive, TileBuffers};
pub use descriptor::{BoundingVolume, DESCRIPTOR_FILE_NAME, Descriptor};

use crate::aabb::Aabb;
use crate::config::{LevelMap, PaddingPolicy, TilingConfig};
use crate::decimate::{Decimator, VertexClusterDecimator};
use crate::errors::TileError;
use crate::float_types::Real;
use crate::io::{GlbWriter, ModelWriter};
use crate::mesh::{Material, Mesh};
use crate::tree::{MeshRef, SpatialTree, TileNode};
use log::{debug, info, warn};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// File name of tile `index` at `level`.
pub fn tile_file_name(level: usize, index: usize, extension: &str) -> String {
    format!("tile_{level}_{index}.{extension}")
}

/// One tile to export, fixed before any geometry is touched.
#[derive(Debug, Clone)]
pub struct TileJob {
    /// Position in the planned job list
    pub id: usize,
    pub level: usize,
    /// Running counter within `level`, pre-order
    pub index: usize,
    pub ratio: Real,
    /// Every mesh reachable from the node
    pub mesh_refs: Vec<MeshRef>,
    pub padding: bool,
}

/// Descriptor skeleton mirroring the tree; `job` links to the tile that
/// provides the entry's content.
#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub bounds: Aabb,
    pub job: Option<usize>,
    pub children: Vec<PlannedEntry>,
}

/// What happened to one tile job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileOutcome {
    /// Uri relative to the output directory, `None` when skipped
    pub content: Option<String>,
    pub faces: usize,
    pub decimation_fallbacks: usize,
}

/// Per-run counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub tiles_written: usize,
    /// Tiles with no faces left; their entries carry no content
    pub tiles_skipped: usize,
    /// Meshes exported undecimated because the decimator failed
    pub decimation_fallbacks: usize,
    pub descriptor_path: PathBuf,
}

pub struct TileExporter<D: Decimator = VertexClusterDecimator, W: ModelWriter = GlbWriter> {
    config: TilingConfig,
    level_map: LevelMap,
    decimator: D,
    writer: W,
}

impl TileExporter {
    /// Exporter with the clustering decimator and the `.glb` writer.
    pub fn new(config: TilingConfig) -> Result<Self, TileError> {
        Self::with_parts(config, VertexClusterDecimator::default(), GlbWriter::default())
    }
}

impl<D: Decimator, W: ModelWriter> TileExporter<D, W> {
    pub fn with_parts(config: TilingConfig, decimator: D, writer: W) -> Result<Self, TileError> {
        config.validate()?;
        let level_map = config.level_map()?;
        Ok(TileExporter {
            config,
            level_map,
            decimator,
            writer,
        })
    }

    #[inline]
    pub fn config(&self) -> &TilingConfig {
        &self.config
    }

    #[inline]
    pub fn level_map(&self) -> &LevelMap {
        &self.level_map
    }

    /// Export every tile of `tree` into `output_dir`, then write
    /// `tileset.json` next to them.
    ///
    /// `meshes` must be the slice the tree was built from; `materials` is
    /// indexed by the tree's resolved material ids.
    pub fn export_all(
        &self,
        tree: &SpatialTree,
        meshes: &[Mesh],
        materials: &[Material],
        output_dir: impl AsRef<Path>,
    ) -> Result<ExportSummary, TileError> {
        let output_dir = output_dir.as_ref();
        tree.validate()?;
        fs::create_dir_all(output_dir).map_err(|e| TileError::write(output_dir, e))?;

        let (jobs, plan) = self.plan(tree);
        debug!("planned {} tiles over {} levels", jobs.len(), tree.depth() + 1);

        #[cfg(not(feature = "parallel"))]
        let outcomes = jobs
            .iter()
            .map(|job| self.export_tile(job, meshes, materials, output_dir))
            .collect::<Result<Vec<_>, _>>()?;

        #[cfg(feature = "parallel")]
        let outcomes = jobs
            .par_iter()
            .map(|job| self.export_tile(job, meshes, materials, output_dir))
            .collect::<Result<Vec<_>, _>>()?;

        let descriptor = resolve(&plan, &outcomes);
        let descriptor_path = output_dir.join(DESCRIPTOR_FILE_NAME);
        descriptor.write_atomic(&descriptor_path)?;

        let tiles_written = outcomes.iter().filter(|o| o.content.is_some()).count();
        let summary = ExportSummary {
            tiles_written,
            tiles_skipped: outcomes.len() - tiles_written,
            decimation_fallbacks: outcomes.iter().map(|o| o.decimation_fallbacks).sum(),
            descriptor_path,
        };
        info!(
            "exported {} tiles ({} skipped, {} decimation fallbacks) to {}",
            summary.tiles_written,
            summary.tiles_skipped,
            summary.decimation_fallbacks,
            output_dir.display()
        );
        Ok(summary)
    }

    /// Assign every exported node its level, index and decimation ratio.
    ///
    /// Jobs come out in pre-order, so job ids and per-level indices do not
    /// depend on the order jobs are later run in.
    pub fn plan(&self, tree: &SpatialTree) -> (Vec<TileJob>, PlannedEntry) {
        let mut jobs = Vec::new();
        let mut level_counters = vec![0usize; tree.depth() + 1];
        let entry = self.plan_node(tree.root(), 0, &mut jobs, &mut level_counters);
        (jobs, entry)
    }

    fn plan_node(
        &self,
        node: &TileNode,
        depth: usize,
        jobs: &mut Vec<TileJob>,
        level_counters: &mut [usize],
    ) -> PlannedEntry {
        let elided = node.padding && self.config.padding_policy == PaddingPolicy::Elide;
        let job = (!elided).then(|| {
            let index = level_counters[depth];
            level_counters[depth] += 1;
            let ratio = if node.is_leaf() {
                1.0
            } else {
                self.level_map.ratio(depth)
            };
            jobs.push(TileJob {
                id: jobs.len(),
                level: depth,
                index,
                ratio,
                mesh_refs: node.collect_mesh_refs(),
                padding: node.padding,
            });
            jobs.len() - 1
        });

        PlannedEntry {
            bounds: node.bounding_volume,
            job,
            children: node
                .children
                .iter()
                .map(|child| self.plan_node(child, depth + 1, jobs, level_counters))
                .collect(),
        }
    }

    /// Decimate, pack and write one tile.
    pub fn export_tile(
        &self,
        job: &TileJob,
        meshes: &[Mesh],
        materials: &[Material],
        output_dir: &Path,
    ) -> Result<TileOutcome, TileError> {
        let mut outcome = TileOutcome::default();
        let mut simplified = Vec::with_capacity(job.mesh_refs.len());
        for mesh_ref in &job.mesh_refs {
            let mesh = meshes
                .get(mesh_ref.mesh)
                .ok_or(TileError::MissingMesh(mesh_ref.mesh))?;
            mesh.validate().map_err(|e| TileError::InvalidMesh {
                mesh: mesh_ref.mesh,
                reason: e.to_string(),
            })?;
            let (mesh, fell_back) = self.simplify(mesh, job.ratio);
            outcome.decimation_fallbacks += usize::from(fell_back);
            simplified.push((mesh, *mesh_ref));
        }

        let buffers = TileBuffers::build(&simplified, materials);
        if buffers.is_empty() {
            debug!(
                "skipping tile: {}",
                TileError::EmptyGeometry {
                    level: job.level,
                    index: job.index
                }
            );
            return Ok(outcome);
        }

        let name = tile_file_name(job.level, job.index, self.writer.extension());
        self.writer.write_model(&buffers, &output_dir.join(&name))?;
        debug!(
            "tile {name}: {} meshes, {} faces, {} vertices, {}-bit indices",
            job.mesh_refs.len(),
            buffers.face_count(),
            buffers.vertex_count(),
            if buffers.indices.is_wide() { 32 } else { 16 }
        );
        outcome.faces = buffers.face_count();
        outcome.content = Some(name);
        Ok(outcome)
    }

    /// `mesh` cut to `ratio` of its faces, or borrowed unchanged. The flag is
    /// set when the decimator failed, or returned a malformed mesh, and the
    /// original was kept.
    fn simplify<'m>(&self, mesh: &'m Mesh, ratio: Real) -> (Cow<'m, Mesh>, bool) {
        let faces = mesh.face_count();
        if ratio >= 1.0 || faces < self.config.min_face_num_for_decimation {
            return (Cow::Borrowed(mesh), false);
        }
        let target = ((faces as Real * ratio).ceil() as usize).max(1);
        match self
            .decimator
            .decimate(mesh, target)
            .and_then(|decimated| decimated.validate().map(|()| decimated))
        {
            Ok(decimated) => (Cow::Owned(decimated), false),
            Err(e) => {
                warn!(
                    "keeping {} at full detail: {}",
                    mesh.name.as_deref().unwrap_or("unnamed mesh"),
                    TileError::from(e)
                );
                (Cow::Borrowed(mesh), true)
            }
        }
    }
}

fn resolve(entry: &PlannedEntry, outcomes: &[TileOutcome]) -> Descriptor {
    Descriptor {
        bounding_volume: BoundingVolume::from(&entry.bounds),
        content: entry.job.and_then(|id| outcomes[id].content.clone()),
        children: entry
            .children
            .iter()
            .map(|child| resolve(child, outcomes))
            .collect(),
    }
}
