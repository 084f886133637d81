//! Traits defining how a node picks its bisection plane

use crate::aabb::Aabb;
use crate::float_types::Real;
use crate::tree::node::MeshRef;

/// Picks the axis and position at which a node is bisected.
pub trait SplitStrategy {
    /// Returns `(axis, position)` with `axis` in `0..3`.
    fn pick_split(&self, bounds: &Aabb, mesh_refs: &[MeshRef]) -> (usize, Real);
}

/// Split the longest axis at its midpoint.
///
/// Ties between equally long axes go to X, then Y, then Z. A zero-extent
/// box still yields a (zero-width) midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestAxisMidpoint;

impl SplitStrategy for LongestAxisMidpoint {
    fn pick_split(&self, bounds: &Aabb, _mesh_refs: &[MeshRef]) -> (usize, Real) {
        let axis = bounds.longest_axis();
        let mid = (bounds.mins[axis] + bounds.maxs[axis]) * 0.5;
        (axis, mid)
    }
}
