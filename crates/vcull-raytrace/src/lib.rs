#![warn(missing_docs)]

//! Ray casting against polygon meshes for vcull.
//!
//! The visibility tester casts millions of rays against a mesh that does
//! not change during a run, so the mesh is snapshotted once into a
//! bounding volume hierarchy and every ray is answered from that.
//!
//! # Architecture
//!
//! - [`Ray`] - Ray representation with origin and direction
//! - [`RayHit`] - Closest intersection with the face that was hit
//! - [`intersect`] - Ray-triangle and concave-safe ray-polygon intersection
//! - [`bvh`] - Bounding volume hierarchy for acceleration
//!
//! # Example
//!
//! ```
//! use vcull_math::{Point3, Vec3};
//! use vcull_mesh::PolyMesh;
//! use vcull_raytrace::{Bvh, Ray};
//!
//! let cube = PolyMesh::cube(Point3::origin(), 2.0);
//! let bvh = Bvh::build(&cube);
//!
//! let ray = Ray::new(Point3::new(-5.0, 0.2, 0.1), Vec3::new(1.0, 0.0, 0.0));
//! let hit = bvh.trace_closest(&ray, f64::INFINITY).unwrap();
//! assert!((hit.t - 4.0).abs() < 1e-9);
//! ```

mod ray;
pub mod intersect;
pub mod bvh;

pub use ray::{Ray, RayHit};
pub use bvh::Bvh;
