//! Per-face verdicts.

use serde::{Deserialize, Serialize};
use vcull_mesh::MeshAccess;

use crate::sample::sample_points;
use crate::settings::Precision;
use crate::tester::{RayOutcome, VisibilityTester};
use crate::viewpoint::Viewpoint;

/// Final visibility state of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Could not be classified (degenerate face, or no ray was cast).
    /// Never deleted.
    Unknown,
    /// At least one sample point is unoccluded from some viewpoint.
    Visible,
    /// Every tested ray was occluded.
    Hidden,
}

/// Verdict for one face plus the work it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVerdict {
    /// Classification.
    pub visibility: Visibility,
    /// Rays cast before the verdict was reached.
    pub rays_cast: u64,
}

/// Classify one face against every viewpoint.
///
/// Stops at the first unoccluded (viewpoint, point) pair. A face without
/// a normal is `Unknown` without casting anything, as is a face whose
/// points all fell outside every viewpoint's field of view.
pub fn classify_face<M: MeshAccess + ?Sized>(
    mesh: &M,
    face: usize,
    viewpoints: &[Viewpoint],
    tester: &VisibilityTester<'_>,
    precision: Precision,
) -> FaceVerdict {
    if mesh.face_normal(face).is_none() {
        return FaceVerdict {
            visibility: Visibility::Unknown,
            rays_cast: 0,
        };
    }

    let mut rays_cast = 0u64;
    for point in sample_points(mesh, face, precision) {
        for vp in viewpoints {
            match tester.test(vp, &point) {
                RayOutcome::OutOfView => {}
                RayOutcome::Unoccluded => {
                    return FaceVerdict {
                        visibility: Visibility::Visible,
                        rays_cast: rays_cast + 1,
                    };
                }
                RayOutcome::Occluded { .. } => rays_cast += 1,
            }
        }
    }

    let visibility = if rays_cast == 0 {
        Visibility::Unknown
    } else {
        Visibility::Hidden
    };
    FaceVerdict {
        visibility,
        rays_cast,
    }
}
