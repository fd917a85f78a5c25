//! Run summary returned to callers.

use serde::{Deserialize, Serialize};

use crate::classify::Visibility;
use crate::settings::RemovalMode;
use crate::viewpoint::CameraMarker;

/// What a removal run found and did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalReport {
    /// Action applied to the mesh.
    pub mode: RemovalMode,
    /// Faces in the mesh before the run.
    pub faces_total: usize,
    /// Faces classified visible.
    pub visible: usize,
    /// Faces classified hidden.
    pub hidden: usize,
    /// Faces left unclassified.
    pub unknown: usize,
    /// Viewpoints rays were cast from.
    pub viewpoint_count: usize,
    /// Faces ray-tested directly (group seeds in experimental mode).
    pub sampled_faces: usize,
    /// Total rays cast.
    pub rays_cast: u64,
    /// Faces deleted (delete mode).
    pub faces_removed: usize,
    /// Vertices compacted away with the deleted faces (delete mode).
    pub vertices_removed: usize,
    /// Per-face classification, indexed by the pre-run face order.
    pub classification: Vec<Visibility>,
    /// Indices of hidden faces in the pre-run face order.
    pub hidden_faces: Vec<usize>,
    /// Faces selected (select mode).
    pub selected_faces: Vec<usize>,
    /// Viewpoint markers, filled when cameras are kept.
    pub cameras: Vec<CameraMarker>,
}

impl RemovalReport {
    /// Report for a run over a mesh with no faces.
    pub fn empty(mode: RemovalMode) -> Self {
        Self {
            mode,
            faces_total: 0,
            visible: 0,
            hidden: 0,
            unknown: 0,
            viewpoint_count: 0,
            sampled_faces: 0,
            rays_cast: 0,
            faces_removed: 0,
            vertices_removed: 0,
            classification: Vec::new(),
            hidden_faces: Vec::new(),
            selected_faces: Vec::new(),
            cameras: Vec::new(),
        }
    }
}
