//! Single (viewpoint, sample point) occlusion test.

use vcull_math::{angle_between_deg, BoundingSphere};
use vcull_raytrace::{Bvh, Ray};

use crate::sample::SamplePoint;
use crate::viewpoint::Viewpoint;

/// Smallest absolute hit tolerance, for very small meshes.
const MIN_EPSILON: f64 = 1e-12;

/// Result of one occlusion test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayOutcome {
    /// Nothing lies between the viewpoint and the sample point.
    Unoccluded,
    /// Face `by` is hit first.
    Occluded {
        /// The blocking face.
        by: usize,
    },
    /// The point is outside the viewpoint's field of view; no ray was cast.
    OutOfView,
}

/// Casts rays against a shared, read-only BVH.
#[derive(Debug)]
pub struct VisibilityTester<'a> {
    bvh: &'a Bvh,
    epsilon: f64,
    half_fov: Option<f64>,
}

impl<'a> VisibilityTester<'a> {
    /// Create a tester. `hit_tolerance` is relative to the sphere radius;
    /// `field_of_view` is the full cone angle in degrees.
    pub fn new(
        bvh: &'a Bvh,
        sphere: &BoundingSphere,
        hit_tolerance: f64,
        field_of_view: Option<f64>,
    ) -> Self {
        Self {
            bvh,
            epsilon: (hit_tolerance * sphere.radius).max(MIN_EPSILON),
            half_fov: field_of_view.map(|fov| fov / 2.0),
        }
    }

    /// Absolute distance tolerance used for near-tie hits.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Test whether `point` can be seen from `viewpoint`.
    ///
    /// Any hit closer than `distance - epsilon` occludes the point. Hits on
    /// the owning face, on neighbours sharing the point, and coplanar
    /// surfaces within epsilon all count as ties and leave it unoccluded.
    pub fn test(&self, viewpoint: &Viewpoint, point: &SamplePoint) -> RayOutcome {
        let Some((ray, distance)) = Ray::towards(viewpoint.position, point.position) else {
            return RayOutcome::Unoccluded;
        };

        if let Some(half) = self.half_fov {
            if angle_between_deg(&viewpoint.look, &ray.direction) > half {
                return RayOutcome::OutOfView;
            }
        }

        match self.bvh.trace_closest(&ray, distance - self.epsilon) {
            Some(hit) => RayOutcome::Occluded { by: hit.face },
            None => RayOutcome::Unoccluded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleKind;
    use vcull_math::{Dir3, Point3, Vec3};
    use vcull_mesh::{MeshAccess, PolyMesh};

    fn viewpoint_at(position: Point3) -> Viewpoint {
        Viewpoint {
            position,
            look: Dir3::new_normalize(Point3::origin() - position),
            row: 0,
            column: 0,
        }
    }

    fn nested() -> PolyMesh {
        let mut mesh = PolyMesh::cube(Point3::origin(), 4.0);
        mesh.append(&PolyMesh::cube(Point3::origin(), 1.0));
        mesh
    }

    fn centroid_sample(mesh: &PolyMesh, face: usize) -> SamplePoint {
        SamplePoint {
            face,
            position: mesh.face_centroid(face),
            kind: SampleKind::Centroid,
        }
    }

    fn sphere(mesh: &PolyMesh) -> BoundingSphere {
        BoundingSphere::from_aabb(&mesh.bounds()).unwrap()
    }

    #[test]
    fn test_outer_face_unoccluded() {
        let mesh = nested();
        let bvh = Bvh::build(&mesh);
        let tester = VisibilityTester::new(&bvh, &sphere(&mesh), 1e-6, None);
        // Face 1 of the outer cube is +Z.
        let vp = viewpoint_at(Point3::new(0.0, 0.0, 10.0));
        assert_eq!(tester.test(&vp, &centroid_sample(&mesh, 1)), RayOutcome::Unoccluded);
    }

    #[test]
    fn test_inner_face_occluded_by_outer() {
        let mesh = nested();
        let bvh = Bvh::build(&mesh);
        let tester = VisibilityTester::new(&bvh, &sphere(&mesh), 1e-6, None);
        let vp = viewpoint_at(Point3::new(0.0, 0.0, 10.0));
        // Face 7 is the inner cube's +Z face.
        assert_eq!(
            tester.test(&vp, &centroid_sample(&mesh, 7)),
            RayOutcome::Occluded { by: 1 }
        );
    }

    #[test]
    fn test_back_face_occluded_by_front() {
        let mesh = PolyMesh::cube(Point3::origin(), 2.0);
        let bvh = Bvh::build(&mesh);
        let tester = VisibilityTester::new(&bvh, &sphere(&mesh), 1e-6, None);
        let vp = viewpoint_at(Point3::new(0.0, 0.0, 10.0));
        // -Z face seen through the +Z face.
        assert_eq!(
            tester.test(&vp, &centroid_sample(&mesh, 0)),
            RayOutcome::Occluded { by: 1 }
        );
    }

    #[test]
    fn test_shared_corner_is_a_tie() {
        let mesh = PolyMesh::cube(Point3::origin(), 2.0);
        let bvh = Bvh::build(&mesh);
        let tester = VisibilityTester::new(&bvh, &sphere(&mesh), 1e-6, None);
        let corner = Point3::new(1.0, 1.0, 1.0);
        let vp = viewpoint_at(Point3::new(5.0, 5.0, 5.0));
        let point = SamplePoint {
            face: 5,
            position: corner,
            kind: SampleKind::Vertex(0),
        };
        assert_eq!(tester.test(&vp, &point), RayOutcome::Unoccluded);
    }

    #[test]
    fn test_point_under_concave_notch_is_seen() {
        // Face 0: L-shaped hexagon at z = 0 with the notch at x, y in (1, 2).
        // Face 1: small quad at z = -0.5 under the notch.
        let mesh = PolyMesh::new(
            vec![
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.1, 1.1, -0.5),
                Point3::new(1.4, 1.1, -0.5),
                Point3::new(1.4, 1.5, -0.5),
                Point3::new(1.1, 1.5, -0.5),
            ],
            vec![(0..6).collect(), vec![6, 7, 8, 9]],
        )
        .unwrap();
        let bvh = Bvh::build(&mesh);
        let tester = VisibilityTester::new(&bvh, &sphere(&mesh), 1e-6, None);

        let above = viewpoint_at(Point3::new(1.25, 1.3, 10.0));
        assert_eq!(tester.test(&above, &centroid_sample(&mesh, 1)), RayOutcome::Unoccluded);

        // The same quad moved under the L's solid arm is blocked.
        let blocked = SamplePoint {
            face: 1,
            position: Point3::new(0.5, 1.5, -0.5),
            kind: SampleKind::Centroid,
        };
        let above_arm = viewpoint_at(Point3::new(0.5, 1.5, 10.0));
        assert_eq!(tester.test(&above_arm, &blocked), RayOutcome::Occluded { by: 0 });
    }

    #[test]
    fn test_field_of_view() {
        let mesh = PolyMesh::cube(Point3::origin(), 2.0);
        let bvh = Bvh::build(&mesh);
        let tester = VisibilityTester::new(&bvh, &sphere(&mesh), 1e-6, Some(10.0));
        let vp = Viewpoint {
            position: Point3::new(0.0, 0.0, 10.0),
            look: Dir3::new_normalize(Vec3::new(1.0, 0.0, 0.0)),
            row: 0,
            column: 0,
        };
        assert_eq!(tester.test(&vp, &centroid_sample(&mesh, 1)), RayOutcome::OutOfView);
    }

    #[test]
    fn test_epsilon_floor() {
        let mesh = PolyMesh::cube(Point3::origin(), 2.0);
        let bvh = Bvh::build(&mesh);
        let tiny = BoundingSphere {
            center: Point3::origin(),
            radius: 1e-9,
        };
        let tester = VisibilityTester::new(&bvh, &tiny, 1e-6, None);
        assert_eq!(tester.epsilon(), MIN_EPSILON);
    }
}
