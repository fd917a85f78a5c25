#![warn(missing_docs)]

//! Hidden geometry removal.
//!
//! Rays are cast from a ring of viewpoints on a sphere around the mesh
//! towards sample points on every face. A face that no viewpoint can see
//! at any of its sample points is hidden and is either deleted or left
//! out of the selection.
//!
//! The pipeline:
//!
//! 1. [`RemovalSettings::validate`] rejects bad configurations before the
//!    mesh is read.
//! 2. [`generate_viewpoints`] places `rows * cameras_per_row` cameras.
//! 3. [`FaceGroups`] picks which faces are ray-tested (all of them, or a
//!    random subset in experimental mode).
//! 4. [`classify_face`] tests each sampled face's [`sample_points`] with a
//!    [`VisibilityTester`] backed by a shared BVH, stopping at the first
//!    unoccluded ray.
//! 5. Verdicts are propagated to group members and applied to the mesh in
//!    one delete or select call.
//!
//! # Example
//!
//! ```
//! use vcull_math::Point3;
//! use vcull_mesh::{MeshAccess, PolyMesh};
//! use vcull_visibility::{remove_hidden_geometry, RemovalSettings};
//!
//! let mut mesh = PolyMesh::cube(Point3::origin(), 4.0);
//! mesh.append(&PolyMesh::cube(Point3::origin(), 1.0));
//!
//! let report = remove_hidden_geometry(&mut mesh, &RemovalSettings::default()).unwrap();
//! assert_eq!(report.faces_removed, 6);
//! assert_eq!(mesh.face_count(), 6);
//! ```

mod cancel;
pub mod classify;
pub mod error;
pub mod grouping;
mod pipeline;
mod report;
pub mod sample;
pub mod settings;
pub mod tester;
pub mod viewpoint;

pub use cancel::CancelToken;
pub use classify::{classify_face, FaceVerdict, Visibility};
pub use error::{Result, VisibilityError};
pub use grouping::FaceGroups;
pub use pipeline::{
    analyze_visibility, remove_hidden_geometry, remove_hidden_geometry_with_cancel,
    VisibilityAnalysis,
};
pub use report::RemovalReport;
pub use sample::{sample_points, SampleKind, SamplePoint};
pub use settings::{Precision, RemovalMode, RemovalSettings};
pub use tester::{RayOutcome, VisibilityTester};
pub use viewpoint::{generate_viewpoints, CameraMarker, Viewpoint};
