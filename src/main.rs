// main.rs
//
// Builds a procedural city block (a ground grid with a field of boxes on it)
// and exports it as a tile hierarchy.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use lodtiler::float_types::Real;
use lodtiler::{Material, Mesh, PaddingPolicy, SpatialTree, TileExporter, TilingConfig};
use nalgebra::Point3;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug, Clone)]
#[command(name = "lodtiler", version)]
struct Args {
    /// Directory receiving the tiles and tileset.json
    #[arg(long, default_value = "tiles")]
    output_dir: PathBuf,

    /// JSON tiling config; fields left out keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Boxes per side of the demo scene
    #[arg(long, default_value_t = 8)]
    grid: usize,

    /// Overrides `tileLevelCount` from the config
    #[arg(long)]
    levels: Option<usize>,

    /// Give depth-padding tiles no content instead of re-exporting them
    #[arg(long, default_value_t = false)]
    elide_padding: bool,
}

const SPACING: Real = 4.0;

fn demo_scene(grid: usize) -> (Vec<Mesh>, Vec<Material>) {
    let materials = vec![
        Material::with_color(0.35, 0.45, 0.3, 1.0).named("ground"),
        Material::with_color(0.8, 0.78, 0.72, 1.0).named("stone"),
        Material::with_color(0.6, 0.3, 0.25, 1.0).named("brick"),
        Material::with_color(0.55, 0.65, 0.75, 1.0).named("glass"),
    ];

    let extent = grid as Real * SPACING;
    let mut meshes = vec![
        Mesh::grid(Point3::origin(), extent, extent, (grid.max(1) * 4) as u32)
            .with_material(0)
            .with_name("ground"),
    ];
    for i in 0..grid {
        for j in 0..grid {
            let x = i as Real * SPACING + 1.0;
            let y = j as Real * SPACING + 1.0;
            let height = 2.0 + ((i * 7 + j * 3) % 11) as Real;
            meshes.push(
                Mesh::cuboid(Point3::new(x, y, 0.0), Point3::new(x + 2.0, y + 2.0, height))
                    .with_material(1 + (i + j) % 3)
                    .with_name(format!("block_{i}_{j}")),
            );
        }
    }
    (meshes, materials)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TilingConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TilingConfig::default(),
    };
    if let Some(levels) = args.levels {
        config.tile_level_count = levels;
        // Ratios were sized for the old level count
        config.level_ratios = None;
    }
    if args.elide_padding {
        config.padding_policy = PaddingPolicy::Elide;
    }

    let start = Instant::now();
    let (meshes, materials) = demo_scene(args.grid);
    info!(
        "demo scene: {} meshes, {} faces",
        meshes.len(),
        meshes.iter().map(Mesh::face_count).sum::<usize>()
    );

    let tree = SpatialTree::from_meshes(&meshes, &config).context("building spatial tree")?;
    info!(
        "spatial tree: {} nodes, depth {} (natural {})",
        tree.node_count(),
        tree.depth(),
        tree.natural_depth()
    );

    let summary = TileExporter::new(config)?
        .export_all(&tree, &meshes, &materials, &args.output_dir)
        .with_context(|| format!("exporting tiles to {}", args.output_dir.display()))?;

    info!(
        "wrote {} tiles and {} in {:.2?}",
        summary.tiles_written,
        summary.descriptor_path.display(),
        start.elapsed()
    );
    Ok(())
}
