#![warn(missing_docs)]

//! Math types for vcull.
//!
//! Thin wrappers around nalgebra providing the handful of domain types
//! the visibility pipeline shares: points, vectors, directions, bounding
//! volumes and tolerance helpers. [`planar`] holds the 2D polygon work
//! on face planes.

use nalgebra::{Unit, Vector3};

pub mod planar;

pub use planar::{PlaneFrame, Point2};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Squared-length threshold below which a vector counts as zero.
    pub degenerate: f64,
}

impl Tolerance {
    /// Default tolerance (1e-24 squared length).
    pub const DEFAULT: Self = Self { degenerate: 1e-24 };

    /// Normalize `v`, or `None` when it is too short to carry a direction.
    pub fn normalize(&self, v: &Vec3) -> Option<Dir3> {
        if v.norm_squared() <= self.degenerate {
            None
        } else {
            Some(Dir3::new_normalize(*v))
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Box from its two corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any included point replaces.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Build the tightest box around a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// True if no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Expand this AABB to include another box.
    pub fn include_aabb(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths along x, y and z.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the main diagonal.
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    /// Surface area, used by the SAH cost model.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Coordinate of `p` along `axis` (0 = x, 1 = y, 2 = z).
    pub fn axis_value(p: &Point3, axis: usize) -> f64 {
        match axis {
            0 => p.x,
            1 => p.y,
            _ => p.z,
        }
    }
}

/// A sphere enclosing a mesh.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// Sphere center (the bounding-box center).
    pub center: Point3,
    /// Sphere radius (half the bounding-box diagonal).
    pub radius: f64,
}

impl BoundingSphere {
    /// Sphere circumscribing an axis-aligned box.
    ///
    /// Returns `None` for an empty box.
    pub fn from_aabb(aabb: &Aabb3) -> Option<Self> {
        if aabb.is_empty() {
            return None;
        }
        Some(Self {
            center: aabb.center(),
            radius: aabb.diagonal() / 2.0,
        })
    }

    /// True if `p` lies inside or on the sphere (with tolerance `tol`).
    pub fn contains(&self, p: &Point3, tol: f64) -> bool {
        (p - self.center).norm() <= self.radius + tol
    }
}

/// Angle in degrees between two unit directions.
///
/// The dot product is clamped so that nearly parallel directions never
/// produce NaN from `acos`.
pub fn angle_between_deg(a: &Dir3, b: &Dir3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Polygon normal by Newell's method; robust for concave and mildly
/// non-planar loops. `None` if the loop encloses no area.
pub fn polygon_normal(points: &[Point3]) -> Option<Dir3> {
    let mut n = Vec3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    Tolerance::DEFAULT.normalize(&n)
}

/// Unit vector for a latitude/longitude pair given in radians.
///
/// Latitude is measured from the XY plane towards +Z, longitude from +X
/// towards +Y.
pub fn spherical_direction(latitude: f64, longitude: f64) -> Vec3 {
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let (sin_lon, cos_lon) = longitude.sin_cos();
    Vec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_normalize_degenerate() {
        let tol = Tolerance::DEFAULT;
        assert!(tol.normalize(&Vec3::zeros()).is_none());
        let d = tol.normalize(&Vec3::new(0.0, 3.0, 0.0)).unwrap();
        assert!((d.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_aabb_from_points() {
        let pts = [
            Point3::new(-1.0, 0.0, 2.0),
            Point3::new(3.0, -2.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let aabb = Aabb3::from_points(&pts);
        assert!((aabb.min.x + 1.0).abs() < 1e-12);
        assert!((aabb.max.x - 3.0).abs() < 1e-12);
        assert!((aabb.min.y + 2.0).abs() < 1e-12);
        assert!((aabb.max.z - 2.0).abs() < 1e-12);
        let c = aabb.center();
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!((c.y + 0.5).abs() < 1e-12);
        assert!((c.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_aabb() {
        let aabb = Aabb3::empty();
        assert!(aabb.is_empty());
        assert_eq!(aabb.surface_area(), 0.0);
        assert!(BoundingSphere::from_aabb(&aabb).is_none());
    }

    #[test]
    fn test_surface_area_unit_cube() {
        let aabb = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!((aabb.surface_area() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_sphere_contains_corners() {
        let aabb = Aabb3::new(Point3::new(-1.0, -2.0, -3.0), Point3::new(1.0, 2.0, 3.0));
        let sphere = BoundingSphere::from_aabb(&aabb).unwrap();
        assert!(sphere.center.coords.norm() < 1e-12);
        assert!(sphere.contains(&aabb.min, 1e-9));
        assert!(sphere.contains(&aabb.max, 1e-9));
        assert!(!sphere.contains(&Point3::new(4.0, 0.0, 0.0), 1e-9));
    }

    #[test]
    fn test_angle_between() {
        let x = Dir3::new_normalize(Vec3::x());
        let y = Dir3::new_normalize(Vec3::y());
        assert!((angle_between_deg(&x, &y) - 90.0).abs() < 1e-9);
        assert!(angle_between_deg(&x, &x).abs() < 1e-6);
        let neg_x = Dir3::new_normalize(-Vec3::x());
        assert!((angle_between_deg(&x, &neg_x) - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_polygon_normal_concave() {
        // L-shape in the XY plane, counter-clockwise seen from +Z.
        let l = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let n = polygon_normal(&l).unwrap();
        assert!((n.z - 1.0).abs() < 1e-12);

        let line = [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        assert!(polygon_normal(&line).is_none());
    }

    #[test]
    fn test_spherical_direction() {
        let d = spherical_direction(0.0, PI / 2.0);
        assert!(d.x.abs() < 1e-12);
        assert!((d.y - 1.0).abs() < 1e-12);
        let up = spherical_direction(PI / 2.0, 0.3);
        assert!((up.z - 1.0).abs() < 1e-12);
        assert!((d.norm() - 1.0).abs() < 1e-12);
    }
}
