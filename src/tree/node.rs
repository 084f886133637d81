//! Spatial tree node data structure

use crate::aabb::Aabb;

/// A mesh as seen by the tree: its index in the caller's mesh slice, its
/// resolved material and a copy of its bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRef {
    pub mesh: usize,
    pub material: Option<usize>,
    pub bounds: Aabb,
}

/// A node of the spatial hierarchy.
///
/// Children are owned; a node never points back at its parent.
#[derive(Debug, Clone, Default)]
pub struct TileNode {
    /// Tight bounds of everything beneath this node, once
    /// [`TileNode::recompute_bounds`] has run. During bisection this is the
    /// clipped half of the parent's box.
    pub bounding_volume: Aabb,

    /// Meshes assigned here. Only nodes where bisection stopped hold any.
    pub mesh_refs: Vec<MeshRef>,

    /// Zero or two children after bisection (one when a split left a side
    /// empty), exactly one on depth-padding wrappers.
    pub children: Vec<TileNode>,

    /// `true` for wrappers added by depth padding.
    pub padding: bool,
}

impl TileNode {
    pub const fn new(bounding_volume: Aabb, mesh_refs: Vec<MeshRef>) -> Self {
        Self {
            bounding_volume,
            mesh_refs,
            children: Vec::new(),
            padding: false,
        }
    }

    /// A padding parent with the same bounds as `child`.
    pub fn wrap(child: TileNode) -> Self {
        Self {
            bounding_volume: child.bounding_volume,
            mesh_refs: Vec::new(),
            children: vec![child],
            padding: true,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Longest path to a leaf, 0 for a leaf.
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TileNode::node_count).sum::<usize>()
    }

    /// Every mesh reference at or beneath this node, in pre-order.
    pub fn collect_mesh_refs(&self) -> Vec<MeshRef> {
        let mut out = Vec::new();
        self.collect_mesh_refs_into(&mut out);
        out
    }

    fn collect_mesh_refs_into(&self, out: &mut Vec<MeshRef>) {
        out.extend_from_slice(&self.mesh_refs);
        for child in &self.children {
            child.collect_mesh_refs_into(out);
        }
    }

    /// Recompute bounds post-order: children first, then this node's own
    /// meshes. Returns the new bounds.
    pub fn recompute_bounds(&mut self) -> Aabb {
        let mut bounds = Aabb::empty();
        for child in &mut self.children {
            bounds.merge(&child.recompute_bounds());
        }
        for mesh_ref in &self.mesh_refs {
            bounds.merge(&mesh_ref.bounds);
        }
        self.bounding_volume = bounds;
        bounds
    }

    /// Pre-order walk, handing each node its depth.
    pub fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(&TileNode, usize),
    {
        self.visit_at(0, f);
    }

    fn visit_at<F>(&self, depth: usize, f: &mut F)
    where
        F: FnMut(&TileNode, usize),
    {
        f(self, depth);
        for child in &self.children {
            child.visit_at(depth + 1, f);
        }
    }
}
