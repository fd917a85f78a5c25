//! 2D work on polygon faces: projection into the face plane,
//! containment, interior points and ear clipping.
//!
//! Mesh faces may be concave n-gons, so nothing here assumes a convex
//! loop. Loops may wind either way.

use crate::{Dir3, Point3, Vec3};

/// A point in a face's plane coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// Orthonormal frame spanning a face plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneFrame {
    /// Plane origin.
    pub origin: Point3,
    /// Unit normal.
    pub normal: Dir3,
    u_axis: Vec3,
    v_axis: Vec3,
}

impl PlaneFrame {
    /// Frame through `origin` with the given normal.
    pub fn new(origin: Point3, normal: Dir3) -> Self {
        // Seed the in-plane axis from the world axis least aligned with
        // the normal.
        let n = normal.into_inner();
        let seed = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
            Vec3::x()
        } else if n.y.abs() <= n.z.abs() {
            Vec3::y()
        } else {
            Vec3::z()
        };
        let u_axis = n.cross(&seed).normalize();
        let v_axis = n.cross(&u_axis);
        Self {
            origin,
            normal,
            u_axis,
            v_axis,
        }
    }

    /// Plane coordinates of `p`; the out-of-plane offset is dropped.
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u_axis), d.dot(&self.v_axis))
    }

    /// The 3D point on the plane at `uv`.
    pub fn unproject(&self, uv: &Point2) -> Point3 {
        self.origin + uv.x * self.u_axis + uv.y * self.v_axis
    }
}

/// Point-in-polygon test using the winding number algorithm.
///
/// Works for convex and concave loops. Points exactly on the boundary
/// may land either way; pair with [`distance_to_outline`] when the
/// boundary must count as inside.
pub fn point_in_polygon(point: &Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut winding = 0i32;
    for (i, p1) in polygon.iter().enumerate() {
        let p2 = &polygon[(i + 1) % polygon.len()];
        if p1.y <= point.y {
            if p2.y > point.y && is_left(p1, p2, point) > 0.0 {
                winding += 1;
            }
        } else if p2.y <= point.y && is_left(p1, p2, point) < 0.0 {
            winding -= 1;
        }
    }

    winding != 0
}

/// Shortest distance from `point` to any edge of the closed loop.
pub fn distance_to_outline(point: &Point2, polygon: &[Point2]) -> f64 {
    polygon
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let b = &polygon[(i + 1) % polygon.len()];
            let ab = b - a;
            let len2 = ab.norm_squared();
            let t = if len2 > 0.0 {
                ((point - a).dot(&ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (point - (a + ab * t)).norm()
        })
        .fold(f64::INFINITY, f64::min)
}

/// A point strictly inside the loop, on the horizontal line through
/// `hint`: the middle of the widest span the line cuts.
///
/// Returns `None` if the line misses the loop.
pub fn interior_point(polygon: &[Point2], hint: &Point2) -> Option<Point2> {
    let y = hint.y;
    let mut crossings: Vec<f64> = polygon
        .iter()
        .enumerate()
        .filter_map(|(i, a)| {
            let b = &polygon[(i + 1) % polygon.len()];
            ((a.y <= y) != (b.y <= y)).then(|| a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y))
        })
        .collect();
    crossings.sort_by(f64::total_cmp);

    crossings
        .chunks_exact(2)
        .max_by(|a, b| (a[1] - a[0]).total_cmp(&(b[1] - b[0])))
        .map(|span| Point2::new((span[0] + span[1]) / 2.0, y))
}

/// Twice the signed area; positive for counter-clockwise loops.
pub fn signed_area2(polygon: &[Point2]) -> f64 {
    polygon
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let b = &polygon[(i + 1) % polygon.len()];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Ear-clipping triangulation of a simple loop.
///
/// Triangles index into `polygon` and keep its winding. Falls back to a
/// fan over whatever is left if no ear can be found (self-intersecting
/// or degenerate input).
pub fn ear_clip(polygon: &[Point2]) -> Vec<[usize; 3]> {
    let n = polygon.len();
    if n < 3 {
        return Vec::new();
    }
    let orientation = signed_area2(polygon).signum();
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let [a, b, c] = [remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]];
            let (pa, pb, pc) = (&polygon[a], &polygon[b], &polygon[c]);
            if is_left(pa, pb, pc) * orientation <= 0.0 {
                return false;
            }
            !remaining
                .iter()
                .filter(|&&j| j != a && j != b && j != c)
                .any(|&j| point_in_triangle(&polygon[j], pa, pb, pc))
        });

        match ear {
            Some(i) => {
                let m = remaining.len();
                triangles.push([remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]]);
                remaining.remove(i);
            }
            None => break,
        }
    }

    for i in 1..remaining.len() - 1 {
        triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
    }
    triangles
}

/// Signed area of the triangle (p0, p1, p2), doubled.
/// Positive if p2 is to the left of the line p0->p1.
#[inline]
fn is_left(p0: &Point2, p1: &Point2, p2: &Point2) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Closed-triangle containment, either winding.
fn point_in_triangle(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let d1 = is_left(a, b, p);
    let d2 = is_left(b, c, p);
    let d3 = is_left(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
