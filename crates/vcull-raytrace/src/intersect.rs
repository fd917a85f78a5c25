//! Ray-triangle and ray-polygon intersection.

use vcull_math::planar::{distance_to_outline, point_in_polygon};
use vcull_math::{polygon_normal, Aabb3, PlaneFrame, Point2, Point3, Vec3};

use crate::Ray;

/// Relative threshold below which a ray counts as parallel to a triangle.
const PARALLEL_EPS: f64 = 1e-12;

/// Edge slack (barycentric, or relative to face size for n-gons) so rays
/// through shared edges and vertices still hit.
const EDGE_SLACK: f64 = 1e-9;

/// Möller-Trumbore ray-triangle intersection, two-sided.
///
/// Returns the ray parameter of the hit if it lies strictly in front of
/// the origin. Zero-area triangles never hit.
pub fn ray_triangle(ray: &Ray, v0: &Point3, v1: &Point3, v2: &Point3) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);

    let scale = edge1.norm() * edge2.norm();
    if a.abs() <= PARALLEL_EPS * scale || scale == 0.0 {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);
    if !(-EDGE_SLACK..=1.0 + EDGE_SLACK).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);
    if v < -EDGE_SLACK || u + v > 1.0 + EDGE_SLACK {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > 0.0).then_some(t)
}

/// A face loop prepared for repeated ray tests.
///
/// Triangles go straight to [`ray_triangle`]. Larger loops are hit-tested
/// against their plane, then a winding-number test in plane coordinates
/// decides containment, so concave faces never report hits in their
/// notches.
#[derive(Debug, Clone)]
pub struct Polygon {
    points: Vec<Point3>,
    plane: Option<Plane>,
}

#[derive(Debug, Clone)]
struct Plane {
    frame: PlaneFrame,
    outline: Vec<Point2>,
    slack: f64,
}

impl Polygon {
    /// Prepare a loop of at least three points.
    pub fn new(points: Vec<Point3>) -> Self {
        let plane = if points.len() > 3 {
            polygon_normal(&points).map(|normal| {
                let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
                let frame = PlaneFrame::new(Point3::from(sum / points.len() as f64), normal);
                let outline = points.iter().map(|p| frame.project(p)).collect();
                let slack = EDGE_SLACK * Aabb3::from_points(&points).diagonal();
                Plane {
                    frame,
                    outline,
                    slack,
                }
            })
        } else {
            None
        };
        Self { points, plane }
    }

    /// Loop vertices.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Ray parameter of the hit, if the ray crosses the face in front of
    /// its origin. Points on the boundary count as hits.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        if let [v0, v1, v2] = self.points.as_slice() {
            return ray_triangle(ray, v0, v1, v2);
        }
        let plane = self.plane.as_ref()?;

        let normal = plane.frame.normal;
        let denom = normal.dot(&ray.direction);
        if denom.abs() <= PARALLEL_EPS {
            return None;
        }
        let t = normal.dot(&(plane.frame.origin - ray.origin)) / denom;
        if t <= 0.0 {
            return None;
        }

        let uv = plane.frame.project(&ray.at(t));
        let inside = point_in_polygon(&uv, &plane.outline)
            || distance_to_outline(&uv, &plane.outline) <= plane.slack;
        inside.then_some(t)
    }
}
