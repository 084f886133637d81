//! Axis-aligned bounding volumes.

use crate::float_types::{Real, tolerance};
use nalgebra::{Point3, Vector3};

/// An axis-aligned box.
///
/// The empty box is `mins = +∞`, `maxs = −∞` on every axis, so that adding
/// the first point or merging the first box yields exactly that geometry.
/// [`Aabb::center`] and [`Aabb::dim`] are meaningless on an empty box; check
/// [`Aabb::is_empty`] first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// The empty-volume sentinel.
    #[inline]
    pub fn empty() -> Self {
        Self {
            mins: Point3::new(Real::INFINITY, Real::INFINITY, Real::INFINITY),
            maxs: Point3::new(Real::NEG_INFINITY, Real::NEG_INFINITY, Real::NEG_INFINITY),
        }
    }

    /// Smallest box holding every point, or the empty box.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<Real>>,
    {
        let mut aabb = Self::empty();
        for p in points {
            aabb.add_point(p);
        }
        aabb
    }

    /// `true` until at least one point or non-empty box has been merged in.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y || self.mins.z > self.maxs.z
    }

    pub fn add_point(&mut self, p: &Point3<Real>) {
        self.mins = self.mins.inf(p);
        self.maxs = self.maxs.sup(p);
    }

    /// Grow `self` to contain `other`. Merging an empty box is a no-op.
    pub fn merge(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.mins = self.mins.inf(&other.mins);
        self.maxs = self.maxs.sup(&other.maxs);
    }

    pub fn merged(&self, other: &Aabb) -> Aabb {
        let mut out = *self;
        out.merge(other);
        out
    }

    #[inline]
    pub fn center(&self) -> Point3<Real> {
        nalgebra::center(&self.mins, &self.maxs)
    }

    /// Extent along each axis.
    #[inline]
    pub fn dim(&self) -> Vector3<Real> {
        self.maxs - self.mins
    }

    /// The axis of greatest extent. Ties go to the earlier axis (X, then Y, then Z).
    pub fn longest_axis(&self) -> usize {
        let d = self.dim();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Closed containment test, `mins <= p <= maxs` on every axis.
    pub fn contains_point(&self, p: &Point3<Real>) -> bool {
        (0..3).all(|i| self.mins[i] <= p[i] && p[i] <= self.maxs[i])
    }

    /// `true` if `other` lies inside `self`, widened by `tolerance()`.
    /// An empty `other` is contained by anything.
    pub fn contains(&self, other: &Aabb) -> bool {
        if other.is_empty() {
            return true;
        }
        let eps = tolerance();
        (0..3).all(|i| {
            self.mins[i] - eps <= other.mins[i] && other.maxs[i] <= self.maxs[i] + eps
        })
    }

    /// Split at `position` on `axis` into (lower, upper) halves.
    pub fn split_at(&self, axis: usize, position: Real) -> (Aabb, Aabb) {
        let mut lower = *self;
        let mut upper = *self;
        lower.maxs[axis] = position;
        upper.mins[axis] = position;
        (lower, upper)
    }

    /// `[x, y, z]` corners, for serialization.
    pub fn min_array(&self) -> [Real; 3] {
        [self.mins.x, self.mins.y, self.mins.z]
    }

    pub fn max_array(&self) -> [Real; 3] {
        [self.maxs.x, self.maxs.y, self.maxs.z]
    }
}
