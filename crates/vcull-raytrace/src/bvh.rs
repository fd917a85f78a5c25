//! SAH bounding volume hierarchy over mesh faces.
//!
//! The hierarchy owns a prepared snapshot of every face polygon, so it can be
//! shared read-only across threads while the source mesh stays borrowed
//! elsewhere.

use vcull_math::{Aabb3, Point3};
use vcull_mesh::MeshAccess;

use crate::intersect::Polygon;
use crate::{Ray, RayHit};

/// Faces per leaf before a node is split.
const MAX_LEAF_FACES: usize = 4;

/// Centroid buckets evaluated per axis.
const SAH_BUCKETS: usize = 12;

/// Cost of visiting a node relative to one polygon test.
const TRAVERSAL_COST: f64 = 0.125;

/// Hierarchy node.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Faces tested directly.
    Leaf {
        /// Bounds of the leaf's faces.
        aabb: Aabb3,
        /// Face indices.
        faces: Vec<usize>,
    },
    /// Split into two children.
    Internal {
        /// Bounds of both children.
        aabb: Aabb3,
        /// First child.
        left: Box<BvhNode>,
        /// Second child.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Build-time record of one face.
#[derive(Debug, Clone, Copy)]
struct FaceBox {
    face: usize,
    aabb: Aabb3,
    center: Point3,
}

/// Closest-hit acceleration structure over a mesh snapshot.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    polygons: Vec<Polygon>,
}

impl Bvh {
    /// Snapshot every face of `mesh` and build the hierarchy.
    pub fn build<M: MeshAccess + ?Sized>(mesh: &M) -> Self {
        let polygons: Vec<Polygon> = (0..mesh.face_count())
            .map(|f| Polygon::new(mesh.face_positions(f)))
            .collect();

        let mut boxes: Vec<FaceBox> = polygons
            .iter()
            .enumerate()
            .map(|(face, poly)| {
                let aabb = Aabb3::from_points(poly.points());
                FaceBox {
                    face,
                    aabb,
                    center: aabb.center(),
                }
            })
            .collect();

        let root = (!boxes.is_empty()).then(|| build_node(&mut boxes));
        Self { root, polygons }
    }

    /// Number of faces in the snapshot.
    pub fn face_count(&self) -> usize {
        self.polygons.len()
    }

    /// Root node; `None` for an empty mesh.
    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// Closest hit with `t < max_t`, if any.
    pub fn trace_closest(&self, ray: &Ray, max_t: f64) -> Option<RayHit> {
        let mut best: Option<(usize, f64)> = None;
        let mut limit = max_t;
        let mut stack: Vec<&BvhNode> = self.root.iter().collect();

        while let Some(node) = stack.pop() {
            match ray.intersect_aabb(node.aabb()) {
                Some((enter, _)) if enter < limit => {}
                _ => continue,
            }
            match node {
                BvhNode::Leaf { faces, .. } => {
                    for &face in faces {
                        if let Some(t) = self.polygons[face].intersect(ray) {
                            if t < limit {
                                limit = t;
                                best = Some((face, t));
                            }
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    let (left, right) = (left.as_ref(), right.as_ref());
                    // Push the farther child first so the nearer one is
                    // popped next and tightens `limit` sooner.
                    let entry = |n: &BvhNode| {
                        ray.intersect_aabb(n.aabb())
                            .map_or(f64::INFINITY, |(t, _)| t)
                    };
                    if entry(left) <= entry(right) {
                        stack.push(right);
                        stack.push(left);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }

        best.map(|(face, t)| RayHit::new(t, ray.at(t), face))
    }
}

fn build_node(boxes: &mut [FaceBox]) -> BvhNode {
    let aabb = boxes.iter().fold(Aabb3::empty(), |mut acc, b| {
        acc.include_aabb(&b.aabb);
        acc
    });

    if boxes.len() <= MAX_LEAF_FACES {
        return BvhNode::Leaf {
            aabb,
            faces: boxes.iter().map(|b| b.face).collect(),
        };
    }

    let mut mid = match sah_split(boxes, &aabb) {
        Some((axis, pos)) => partition(boxes, axis, pos),
        None => 0,
    };
    if mid == 0 || mid == boxes.len() {
        // All centers coincide along every axis; split by count.
        mid = boxes.len() / 2;
    }

    let (lo, hi) = boxes.split_at_mut(mid);
    BvhNode::Internal {
        aabb,
        left: Box::new(build_node(lo)),
        right: Box::new(build_node(hi)),
    }
}

/// Cheapest (axis, position) split by the surface area heuristic.
fn sah_split(boxes: &[FaceBox], bounds: &Aabb3) -> Option<(usize, f64)> {
    let extent = bounds.extent();
    let parent_area = bounds.surface_area();
    let mut best: Option<(f64, usize, f64)> = None;

    for axis in 0..3 {
        let width = extent[axis];
        if width < 1e-10 {
            continue;
        }
        let start = Aabb3::axis_value(&bounds.min, axis);

        let mut counts = [0usize; SAH_BUCKETS];
        let mut extents = [Aabb3::empty(); SAH_BUCKETS];
        for b in boxes {
            let rel = (Aabb3::axis_value(&b.center, axis) - start) / width;
            let k = ((rel * SAH_BUCKETS as f64) as usize).min(SAH_BUCKETS - 1);
            counts[k] += 1;
            extents[k].include_aabb(&b.aabb);
        }

        // Suffix sweep, then a prefix sweep that prices each boundary.
        let mut right_area = [0.0f64; SAH_BUCKETS];
        let mut right_count = [0usize; SAH_BUCKETS];
        let mut acc = Aabb3::empty();
        let mut n = 0;
        for k in (1..SAH_BUCKETS).rev() {
            acc.include_aabb(&extents[k]);
            n += counts[k];
            right_area[k] = acc.surface_area();
            right_count[k] = n;
        }

        let mut acc = Aabb3::empty();
        let mut n = 0;
        for k in 1..SAH_BUCKETS {
            acc.include_aabb(&extents[k - 1]);
            n += counts[k - 1];
            if n == 0 || right_count[k] == 0 {
                continue;
            }
            let cost = TRAVERSAL_COST
                + (acc.surface_area() * n as f64 + right_area[k] * right_count[k] as f64)
                    / parent_area;
            if best.map_or(true, |(c, _, _)| cost < c) {
                let pos = start + width * k as f64 / SAH_BUCKETS as f64;
                best = Some((cost, axis, pos));
            }
        }
    }

    best.map(|(_, axis, pos)| (axis, pos))
}

/// Move faces whose center lies below `pos` to the front; returns their count.
fn partition(boxes: &mut [FaceBox], axis: usize, pos: f64) -> usize {
    let mut front = 0;
    for i in 0..boxes.len() {
        if Aabb3::axis_value(&boxes[i].center, axis) < pos {
            boxes.swap(front, i);
            front += 1;
        }
    }
    front
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcull_math::Vec3;
    use vcull_mesh::PolyMesh;

    /// A 4x4x4 grid of small cubes: enough faces to force internal nodes.
    fn cube_grid() -> PolyMesh {
        let mut mesh = PolyMesh::default();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    let c = Point3::new(x as f64 * 3.0, y as f64 * 3.0, z as f64 * 3.0);
                    mesh.append(&PolyMesh::cube(c, 1.0));
                }
            }
        }
        mesh
    }

    fn leaf_face_count(node: &BvhNode) -> usize {
        match node {
            BvhNode::Leaf { faces, .. } => faces.len(),
            BvhNode::Internal { left, right, .. } => leaf_face_count(left) + leaf_face_count(right),
        }
    }

    #[test]
    fn test_bvh_build() {
        let cube = PolyMesh::cube(Point3::origin(), 10.0);
        let bvh = Bvh::build(&cube);
        assert!(bvh.root().is_some());
        assert_eq!(bvh.face_count(), 6);
    }

    #[test]
    fn test_bvh_empty_mesh() {
        let bvh = Bvh::build(&PolyMesh::default());
        assert!(bvh.root().is_none());
        let ray = Ray::new(Point3::origin(), Vec3::x());
        assert!(bvh.trace_closest(&ray, f64::INFINITY).is_none());
    }

    #[test]
    fn test_every_face_lands_in_one_leaf() {
        let grid = cube_grid();
        let bvh = Bvh::build(&grid);
        assert!(matches!(bvh.root(), Some(BvhNode::Internal { .. })));
        assert_eq!(leaf_face_count(bvh.root().unwrap()), grid.faces().len());
    }

    #[test]
    fn test_bvh_trace_closest_cube() {
        let cube = PolyMesh::cube(Point3::new(5.0, 5.0, 5.0), 10.0);
        let bvh = Bvh::build(&cube);

        let ray = Ray::new(Point3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = bvh.trace_closest(&ray, f64::INFINITY).unwrap();
        assert!(hit.point.z.abs() < 1e-8);
        // Face 0 is the -Z side of the cube.
        assert_eq!(hit.face, 0);
    }

    #[test]
    fn test_bvh_trace_respects_max_t() {
        let cube = PolyMesh::cube(Point3::new(5.0, 5.0, 5.0), 10.0);
        let bvh = Bvh::build(&cube);
        let ray = Ray::new(Point3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(bvh.trace_closest(&ray, 4.0).is_none());
        let hit = bvh.trace_closest(&ray, 6.0).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_bvh_trace_miss() {
        let cube = PolyMesh::cube(Point3::new(5.0, 5.0, 5.0), 10.0);
        let bvh = Bvh::build(&cube);
        let ray = Ray::new(Point3::new(50.0, 50.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(bvh.trace_closest(&ray, f64::INFINITY).is_none());
    }

    #[test]
    fn test_bvh_matches_brute_force() {
        let grid = cube_grid();
        let bvh = Bvh::build(&grid);
        let origin = Point3::new(-7.0, -5.0, -6.0);

        for target in [
            Point3::new(0.2, 0.1, 0.3),
            Point3::new(9.0, 6.1, 3.2),
            Point3::new(4.4, 9.3, 8.9),
            Point3::new(1.5, 1.5, 1.5),
        ] {
            let ray = Ray::new(origin, target - origin);
            let brute = (0..grid.faces().len())
                .filter_map(|f| Polygon::new(grid.face_positions(f)).intersect(&ray).map(|t| (f, t)))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            let fast = bvh.trace_closest(&ray, f64::INFINITY);
            match (brute, fast) {
                (Some((_, bt)), Some(hit)) => assert!((bt - hit.t).abs() < 1e-9),
                (None, None) => {}
                other => panic!("BVH disagrees with brute force: {other:?}"),
            }
        }
    }
}
