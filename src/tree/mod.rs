//! Spatial tree: recursive bounding-volume bisection of a mesh list.
//!
//! Building happens in three passes:
//!
//! 1. **Bisection.** The root holds every mesh and the box around all of
//!    them. A node with at least `min_bucket_size` meshes, above the depth
//!    cap, is cut at the midpoint of its longest axis. Each mesh goes to
//!    the side that holds its bounding-box center; a center exactly on the
//!    plane goes to the lower side. Empty sides are dropped and every
//!    non-empty side is split again before it is attached.
//! 2. **Depth padding.** The root is wrapped in single-child parents until
//!    the tree is `tile_level_count - 1` deep.
//! 3. **Bounds recompute.** Post-order, every node's box becomes the union
//!    of its children's boxes and its own meshes' boxes.
//!
//! ```rust
//! # use lodtiler::{config::TilingConfig, mesh::Mesh, tree::SpatialTree};
//! # use nalgebra::Point3;
//! let meshes: Vec<Mesh> = (0..8)
//!     .map(|i| {
//!         let x = i as f64;
//!         Mesh::cuboid(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
//!     })
//!     .collect();
//! let config = TilingConfig { tile_level_count: 3, min_bucket_size: 2, ..Default::default() };
//! let tree = SpatialTree::from_meshes(&meshes, &config)?;
//! assert_eq!(tree.depth(), 2);
//! # Ok::<(), lodtiler::errors::TileError>(())
//! ```

pub mod node;
pub mod traits;

pub use node::{MeshRef, TileNode};
pub use traits::{LongestAxisMidpoint, SplitStrategy};

use crate::aabb::Aabb;
use crate::config::TilingConfig;
use crate::errors::TileError;
use crate::mesh::Mesh;
use log::debug;

/// The tile hierarchy over a mesh list.
///
/// The tree only stores [`MeshRef`] handles; the meshes themselves stay with
/// the caller and are passed again to the exporter.
#[derive(Debug, Clone)]
pub struct SpatialTree {
    root: TileNode,
    natural_depth: usize,
}

impl SpatialTree {
    /// Build with each mesh's own `material` index.
    pub fn from_meshes(meshes: &[Mesh], config: &TilingConfig) -> Result<Self, TileError> {
        Self::build(meshes, config, |_, mesh| mesh.material)
    }

    /// Build with [`LongestAxisMidpoint`] bisection.
    ///
    /// `resolve_material` maps `(mesh index, mesh)` to the material index the
    /// mesh is exported with.
    pub fn build<F>(
        meshes: &[Mesh],
        config: &TilingConfig,
        resolve_material: F,
    ) -> Result<Self, TileError>
    where
        F: Fn(usize, &Mesh) -> Option<usize>,
    {
        Self::build_with_strategy(meshes, config, &LongestAxisMidpoint, resolve_material)
    }

    pub fn build_with_strategy<S, F>(
        meshes: &[Mesh],
        config: &TilingConfig,
        strategy: &S,
        resolve_material: F,
    ) -> Result<Self, TileError>
    where
        S: SplitStrategy,
        F: Fn(usize, &Mesh) -> Option<usize>,
    {
        config.validate()?;
        if meshes.is_empty() {
            return Err(TileError::EmptyScene);
        }

        let mut scene_box = Aabb::empty();
        let mesh_refs: Vec<MeshRef> = meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                let bounds = mesh.bounding_box();
                scene_box.merge(&bounds);
                MeshRef {
                    mesh: i,
                    material: resolve_material(i, mesh),
                    bounds,
                }
            })
            .collect();

        let mut root = TileNode::new(scene_box, mesh_refs);
        let params = SplitParams {
            strategy,
            min_bucket_size: config.min_bucket_size,
            max_depth: config.effective_max_depth(),
        };
        let natural_depth = split_node(&mut root, 0, &params);

        let mut tree = SpatialTree {
            root,
            natural_depth,
        };
        tree.pad_depth(config.tile_level_count);
        tree.recompute_bounds();

        debug!(
            "spatial tree: {} meshes, {} nodes, natural depth {}, padded depth {}",
            meshes.len(),
            tree.node_count(),
            tree.natural_depth,
            tree.depth()
        );
        Ok(tree)
    }

    /// Wrap the root in padding parents until the tree is
    /// `level_count - 1` deep. Deeper trees are left alone.
    pub fn pad_depth(&mut self, level_count: usize) {
        let target = level_count.saturating_sub(1);
        let mut depth = self.depth();
        while depth < target {
            let inner = std::mem::take(&mut self.root);
            self.root = TileNode::wrap(inner);
            depth += 1;
        }
    }

    /// Reset and recompute every node's bounds from its children and meshes.
    pub fn recompute_bounds(&mut self) {
        self.root.recompute_bounds();
    }

    #[inline]
    pub fn root(&self) -> &TileNode {
        &self.root
    }

    /// Depth of the deepest node, root at 0.
    pub fn depth(&self) -> usize {
        self.root.height()
    }

    /// Depth bisection reached before padding.
    #[inline]
    pub fn natural_depth(&self) -> usize {
        self.natural_depth
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Mesh lists of every node where bisection stopped.
    pub fn leaf_buckets(&self) -> Vec<&[MeshRef]> {
        let mut buckets = Vec::new();
        collect_buckets(&self.root, &mut buckets);
        buckets
    }

    /// Check that every node's box contains its children's and its meshes' boxes.
    pub fn validate(&self) -> Result<(), TileError> {
        validate_node(&self.root, 0)
    }
}

struct SplitParams<'a, S: SplitStrategy> {
    strategy: &'a S,
    min_bucket_size: usize,
    max_depth: usize,
}

/// Bisect `node` (at `depth`) and its new children recursively.
/// Returns the deepest depth reached below it.
fn split_node<S: SplitStrategy>(node: &mut TileNode, depth: usize, params: &SplitParams<S>) -> usize {
    if node.mesh_refs.len() < params.min_bucket_size || depth >= params.max_depth {
        return depth;
    }

    let (axis, position) = params
        .strategy
        .pick_split(&node.bounding_volume, &node.mesh_refs);
    let (lower_box, upper_box) = node.bounding_volume.split_at(axis, position);

    // Centers lie inside the node box, so closed containment in the lower
    // half is `center[axis] <= position`: a center on the plane goes lower.
    let (lower, upper): (Vec<MeshRef>, Vec<MeshRef>) = node
        .mesh_refs
        .iter()
        .copied()
        .partition(|r| lower_box.contains_point(&r.bounds.center()));

    // One side took everything without the box shrinking: zero extent, no progress possible.
    if (upper.is_empty() && lower_box == node.bounding_volume)
        || (lower.is_empty() && upper_box == node.bounding_volume)
    {
        return depth;
    }

    node.mesh_refs.clear();
    let mut reached = depth;
    for (bounds, refs) in [(lower_box, lower), (upper_box, upper)] {
        if refs.is_empty() {
            continue;
        }
        let mut child = TileNode::new(bounds, refs);
        reached = reached.max(split_node(&mut child, depth + 1, params));
        node.children.push(child);
    }
    reached
}

fn collect_buckets<'a>(node: &'a TileNode, out: &mut Vec<&'a [MeshRef]>) {
    if !node.mesh_refs.is_empty() {
        out.push(&node.mesh_refs);
    }
    for child in &node.children {
        collect_buckets(child, out);
    }
}

fn validate_node(node: &TileNode, depth: usize) -> Result<(), TileError> {
    let inner = node
        .children
        .iter()
        .map(|c| c.bounding_volume)
        .chain(node.mesh_refs.iter().map(|r| r.bounds));
    for inner in inner {
        if !node.bounding_volume.contains(&inner) {
            return Err(TileError::InvalidBounds {
                depth,
                node: node.bounding_volume,
                inner,
            });
        }
    }
    for child in &node.children {
        validate_node(child, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::Real;
    use nalgebra::Point3;

    fn unit_box_at(x: Real, y: Real, z: Real) -> Mesh {
        Mesh::cuboid(Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    fn config(levels: usize, bucket: usize) -> TilingConfig {
        TilingConfig {
            tile_level_count: levels,
            min_bucket_size: bucket,
            ..Default::default()
        }
    }

    #[test]
    fn empty_scene_is_rejected() {
        let err = SpatialTree::from_meshes(&[], &config(3, 2)).unwrap_err();
        assert!(matches!(err, TileError::EmptyScene));
    }

    #[test]
    fn small_scene_stays_a_single_bucket() {
        let meshes = vec![unit_box_at(0.0, 0.0, 0.0), unit_box_at(5.0, 0.0, 0.0)];
        let tree = SpatialTree::from_meshes(&meshes, &config(1, 4)).unwrap();
        assert_eq!(tree.depth(), 0);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().mesh_refs.len(), 2);
    }

    #[test]
    fn two_far_apart_meshes_split_into_two_leaves() {
        let meshes = vec![unit_box_at(0.0, 0.0, 0.0), unit_box_at(9.0, 0.0, 0.0)];
        let tree = SpatialTree::from_meshes(&meshes, &config(2, 2)).unwrap();
        assert_eq!(tree.natural_depth(), 1);
        assert_eq!(tree.root().children.len(), 2);
        assert!(tree.root().mesh_refs.is_empty());
        assert_eq!(tree.root().children[0].mesh_refs[0].mesh, 0);
        assert_eq!(tree.root().children[1].mesh_refs[0].mesh, 1);
    }

    #[test]
    fn coincident_meshes_do_not_chain() {
        let meshes = vec![
            Mesh::cuboid(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 1.0)),
            Mesh::cuboid(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 1.0)),
            Mesh::cuboid(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 1.0)),
        ];
        let tree = SpatialTree::from_meshes(&meshes, &config(4, 2)).unwrap();
        assert_eq!(tree.natural_depth(), 0);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_buckets().len(), 1);
        assert_eq!(tree.leaf_buckets()[0].len(), 3);
    }

    #[test]
    fn resolver_sets_materials() {
        let meshes = vec![unit_box_at(0.0, 0.0, 0.0)];
        let tree = SpatialTree::build(&meshes, &config(1, 2), |i, _| Some(i + 7)).unwrap();
        assert_eq!(tree.root().mesh_refs[0].material, Some(7));
    }

    #[test]
    fn validate_flags_a_shrunken_node() {
        let meshes = vec![unit_box_at(0.0, 0.0, 0.0), unit_box_at(9.0, 0.0, 0.0)];
        let mut tree = SpatialTree::from_meshes(&meshes, &config(2, 2)).unwrap();
        assert!(tree.validate().is_ok());
        tree.root.bounding_volume.maxs.x = 5.0;
        assert!(matches!(tree.validate(), Err(TileError::InvalidBounds { depth: 0, .. })));
    }
}
