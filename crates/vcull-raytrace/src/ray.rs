//! Rays and the slab test used to walk the BVH.

use vcull_math::{Aabb3, Dir3, Point3, Vec3};

/// A half-line from `origin` along a unit `direction`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Start point.
    pub origin: Point3,
    /// Unit direction.
    pub direction: Dir3,
    /// Component-wise reciprocal of `direction`; infinite on axes the
    /// ray is parallel to.
    inv_dir: Vec3,
}

impl Ray {
    /// Ray from `origin` along `direction` (normalized here).
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let direction = Dir3::new_normalize(direction);
        let inv_dir = direction.map(|c| 1.0 / c);
        Self {
            origin,
            direction,
            inv_dir,
        }
    }

    /// Ray from `origin` through `target`, plus the distance between them.
    ///
    /// Returns `None` when the two points coincide.
    pub fn towards(origin: Point3, target: Point3) -> Option<(Self, f64)> {
        let delta = target - origin;
        let distance = delta.norm();
        if distance <= f64::EPSILON {
            return None;
        }
        Some((Self::new(origin, delta), distance))
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction.into_inner() * t
    }

    /// Parameter interval `(enter, exit)` over which the ray is inside
    /// `aabb`, clipped to `t >= 0`.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let mut enter = 0.0f64;
        let mut exit = f64::INFINITY;
        for axis in 0..3 {
            let near = (aabb.min[axis] - self.origin[axis]) * self.inv_dir[axis];
            let far = (aabb.max[axis] - self.origin[axis]) * self.inv_dir[axis];
            // NaN (0 * inf on a slab boundary) is dropped by min/max.
            enter = enter.max(near.min(far));
            exit = exit.min(near.max(far));
        }
        (exit >= enter).then_some((enter, exit))
    }
}

/// Closest intersection found by a trace.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Ray parameter of the hit.
    pub t: f64,
    /// Hit position.
    pub point: Point3,
    /// Face that was hit.
    pub face: usize,
}

impl RayHit {
    /// Bundle a hit.
    pub fn new(t: f64, point: Point3, face: usize) -> Self {
        Self { t, point, face }
    }
}
