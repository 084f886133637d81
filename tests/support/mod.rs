//! Test support library
//! Provides scene builders, fake decimators and a recording model writer.
#![allow(dead_code)]

use lodtiler::{
    errors::{DecimationError, TileError},
    export::TileBuffers,
    float_types::Real,
    io::ModelWriter,
    mesh::Mesh,
    Decimator,
};
use nalgebra::Point3;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

pub fn unit_box_at(x: Real, y: Real, z: Real) -> Mesh {
    Mesh::cuboid(Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0))
}

/// Twelve boxes tiling the cube `[0, 10]³`: three slabs along X, two
/// along Y, two along Z.
pub fn cube_scene() -> Vec<Mesh> {
    let xs = [0.0, 10.0 / 3.0, 20.0 / 3.0, 10.0];
    let halves = [0.0, 5.0, 10.0];
    let mut meshes = Vec::with_capacity(12);
    for i in 0..3 {
        for j in 0..2 {
            for k in 0..2 {
                meshes.push(
                    Mesh::cuboid(
                        Point3::new(xs[i], halves[j], halves[k]),
                        Point3::new(xs[i + 1], halves[j + 1], halves[k + 1]),
                    )
                    .with_material((i + j + k) % 2)
                    .with_name(format!("cell_{i}_{j}_{k}")),
                );
            }
        }
    }
    meshes
}

/// `count` small boxes scattered through `[0, 100]³` by a fixed
/// multiplicative sequence, so runs are reproducible.
pub fn scattered_scene(count: usize) -> Vec<Mesh> {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as Real / 100.0
    };
    (0..count)
        .map(|_| {
            let (x, y, z) = (next(), next(), next());
            Mesh::cuboid(Point3::new(x, y, z), Point3::new(x + 0.5, y + 0.5, z + 0.5))
        })
        .collect()
}

/// A triangle soup in which every one of `unique` vertices is referenced.
pub fn soup_with_vertices(unique: usize) -> Mesh {
    assert!(unique >= 3);
    let positions: Vec<Point3<Real>> = (0..unique)
        .map(|i| Point3::new((i % 256) as Real, (i / 256) as Real, (i % 7) as Real))
        .collect();
    let n = unique as u32;
    let mut triangles: Vec<[u32; 3]> = (0..n / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2]).collect();
    match n % 3 {
        1 => triangles.push([n - 1, 0, 1]),
        2 => triangles.push([n - 2, n - 1, 0]),
        _ => {}
    }
    Mesh::new(positions, triangles)
}

/// A decimator that keeps the first `target` triangles.
#[derive(Debug, Default)]
pub struct TruncatingDecimator;

impl Decimator for TruncatingDecimator {
    fn decimate(&self, mesh: &Mesh, target_faces: usize) -> Result<Mesh, DecimationError> {
        let mut out = mesh.clone();
        out.triangles.truncate(target_faces);
        Ok(out)
    }
}

/// A decimator that always fails.
#[derive(Debug, Default)]
pub struct FailingDecimator;

impl Decimator for FailingDecimator {
    fn decimate(&self, mesh: &Mesh, target_faces: usize) -> Result<Mesh, DecimationError> {
        Err(DecimationError::TargetUnreachable {
            faces: mesh.face_count(),
            target: target_faces,
        })
    }
}

/// A decimator whose output points past its own vertex list.
#[derive(Debug, Default)]
pub struct CorruptingDecimator;

impl Decimator for CorruptingDecimator {
    fn decimate(&self, mesh: &Mesh, _target_faces: usize) -> Result<Mesh, DecimationError> {
        let mut out = mesh.clone();
        let past_end = out.positions.len() as u32 + 100;
        out.triangles = vec![[0, 1, past_end]];
        Ok(out)
    }
}

/// What a [`RecordingWriter`] saw for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTile {
    pub file_name: String,
    pub faces: usize,
    pub vertices: usize,
    pub wide_indices: bool,
    pub materials: usize,
}

/// Records tiles instead of writing them; optionally fails on one file name.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub fail_on: Option<String>,
    pub written: Mutex<Vec<WrittenTile>>,
}

impl RecordingWriter {
    pub fn failing_on(file_name: &str) -> Self {
        RecordingWriter {
            fail_on: Some(file_name.to_string()),
            ..Default::default()
        }
    }

    /// Recorded tiles sorted by file name.
    pub fn tiles(&self) -> Vec<WrittenTile> {
        let mut tiles = self.written.lock().unwrap().clone();
        tiles.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        tiles
    }

    pub fn tile(&self, file_name: &str) -> Option<WrittenTile> {
        self.tiles().into_iter().find(|t| t.file_name == file_name)
    }
}

impl ModelWriter for RecordingWriter {
    fn write_model(&self, tile: &TileBuffers, path: &Path) -> Result<(), TileError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_on.as_deref() == Some(file_name.as_str()) {
            return Err(TileError::Write {
                path: PathBuf::from(path),
                source: std::io::Error::other("disk full"),
            });
        }
        self.written.lock().unwrap().push(WrittenTile {
            file_name,
            faces: tile.face_count(),
            vertices: tile.vertex_count(),
            wide_indices: tile.indices.is_wide(),
            materials: tile.materials.len(),
        });
        Ok(())
    }
}
