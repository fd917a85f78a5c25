//! Entry points: analyze a mesh, then delete or select.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use vcull_math::BoundingSphere;
use vcull_mesh::MeshAccess;
use vcull_raytrace::Bvh;

use crate::cancel::CancelToken;
use crate::classify::{classify_face, FaceVerdict, Visibility};
use crate::error::{Result, VisibilityError};
use crate::grouping::FaceGroups;
use crate::report::RemovalReport;
use crate::settings::{RemovalMode, RemovalSettings};
use crate::tester::VisibilityTester;
use crate::viewpoint::{generate_viewpoints, CameraMarker, Viewpoint};

/// Verdicts for every face of a mesh, before any mutation.
#[derive(Debug, Clone)]
pub struct VisibilityAnalysis {
    /// Per-face classification.
    pub classification: Vec<Visibility>,
    /// Viewpoints used.
    pub viewpoints: Vec<Viewpoint>,
    /// Faces ray-tested directly.
    pub sampled_faces: usize,
    /// Total rays cast.
    pub rays_cast: u64,
}

impl VisibilityAnalysis {
    fn empty() -> Self {
        Self {
            classification: Vec::new(),
            viewpoints: Vec::new(),
            sampled_faces: 0,
            rays_cast: 0,
        }
    }

    /// Faces classified hidden.
    pub fn hidden_faces(&self) -> BTreeSet<usize> {
        self.faces_where(|v| v == Visibility::Hidden)
    }

    /// Faces not classified hidden (visible or unknown).
    pub fn kept_faces(&self) -> BTreeSet<usize> {
        self.faces_where(|v| v != Visibility::Hidden)
    }

    /// Number of faces with the given classification.
    pub fn count(&self, visibility: Visibility) -> usize {
        self.classification
            .iter()
            .filter(|&&v| v == visibility)
            .count()
    }

    fn faces_where(&self, pred: impl Fn(Visibility) -> bool) -> BTreeSet<usize> {
        self.classification
            .iter()
            .enumerate()
            .filter(|&(_, &v)| pred(v))
            .map(|(f, _)| f)
            .collect()
    }
}

/// Classify every face of `mesh` without modifying it.
///
/// Settings are validated before the mesh is read. The token is checked
/// once per sampled face; a cancelled run returns
/// [`VisibilityError::Cancelled`].
pub fn analyze_visibility<M: MeshAccess + Sync + ?Sized>(
    mesh: &M,
    settings: &RemovalSettings,
    cancel: &CancelToken,
) -> Result<VisibilityAnalysis> {
    settings.validate()?;

    let face_count = mesh.face_count();
    let Some(sphere) = BoundingSphere::from_aabb(&mesh.bounds()) else {
        debug!("mesh has no faces, nothing to analyze");
        return Ok(VisibilityAnalysis::empty());
    };
    if settings.camera_distance_factor <= 1.0 {
        warn!(
            factor = settings.camera_distance_factor,
            "cameras are inside the bounding sphere; some faces may be missed"
        );
    }

    let viewpoints = generate_viewpoints(
        &sphere,
        settings.rows,
        settings.cameras_per_row,
        settings.camera_distance_factor,
    )?;
    let groups = if settings.experimental {
        FaceGroups::build(
            mesh,
            settings.face_sampling_ratio,
            settings.flatness_angle,
            settings.seed,
        )
    } else {
        FaceGroups::identity(face_count)
    };
    let bvh = Bvh::build(mesh);
    let tester = VisibilityTester::new(
        &bvh,
        &sphere,
        settings.hit_tolerance,
        settings.field_of_view,
    );
    debug!(
        faces = face_count,
        viewpoints = viewpoints.len(),
        seeds = groups.seeds().len(),
        radius = sphere.radius,
        epsilon = tester.epsilon(),
        "sampling visibility"
    );

    let classify = |&face: &usize| -> Result<(usize, FaceVerdict)> {
        if cancel.is_cancelled() {
            return Err(VisibilityError::Cancelled);
        }
        let verdict = classify_face(mesh, face, &viewpoints, &tester, settings.precision);
        Ok((face, verdict))
    };
    let verdicts: Result<Vec<(usize, FaceVerdict)>> = if settings.parallel {
        groups.seeds().par_iter().map(classify).collect()
    } else {
        groups.seeds().iter().map(classify).collect()
    };
    let verdicts = match verdicts {
        Ok(v) => v,
        Err(e) => {
            if matches!(e, VisibilityError::Cancelled) {
                warn!("visibility analysis cancelled, mesh left untouched");
            }
            return Err(e);
        }
    };

    let mut seed_verdict = vec![Visibility::Unknown; face_count];
    let mut rays_cast = 0u64;
    for (face, verdict) in &verdicts {
        seed_verdict[*face] = verdict.visibility;
        rays_cast += verdict.rays_cast;
    }
    let classification: Vec<Visibility> = (0..face_count)
        .map(|f| seed_verdict[groups.seed_of(f)])
        .collect();

    let degenerate = (0..face_count)
        .filter(|&f| mesh.face_normal(f).is_none())
        .count();
    if degenerate > 0 {
        warn!(degenerate, "skipped faces without a normal");
    }

    Ok(VisibilityAnalysis {
        classification,
        viewpoints,
        sampled_faces: verdicts.len(),
        rays_cast,
    })
}

/// Remove (or select) faces that no exterior viewpoint can see.
pub fn remove_hidden_geometry<M: MeshAccess + Sync + ?Sized>(
    mesh: &mut M,
    settings: &RemovalSettings,
) -> Result<RemovalReport> {
    remove_hidden_geometry_with_cancel(mesh, settings, &CancelToken::new())
}

/// [`remove_hidden_geometry`] with a cancellation token.
///
/// The mesh is only mutated after every face has been classified, in a
/// single delete or select call. Cancellation leaves it untouched.
pub fn remove_hidden_geometry_with_cancel<M: MeshAccess + Sync + ?Sized>(
    mesh: &mut M,
    settings: &RemovalSettings,
    cancel: &CancelToken,
) -> Result<RemovalReport> {
    let analysis = analyze_visibility(&*mesh, settings, cancel)?;
    let faces_total = analysis.classification.len();
    if faces_total == 0 {
        return Ok(RemovalReport::empty(settings.mode));
    }

    let hidden = analysis.hidden_faces();
    let mut report = RemovalReport {
        mode: settings.mode,
        faces_total,
        visible: analysis.count(Visibility::Visible),
        hidden: hidden.len(),
        unknown: analysis.count(Visibility::Unknown),
        viewpoint_count: analysis.viewpoints.len(),
        sampled_faces: analysis.sampled_faces,
        rays_cast: analysis.rays_cast,
        faces_removed: 0,
        vertices_removed: 0,
        classification: analysis.classification.clone(),
        hidden_faces: hidden.iter().copied().collect(),
        selected_faces: Vec::new(),
        cameras: Vec::new(),
    };
    if settings.keep_cameras {
        report.cameras = analysis.viewpoints.iter().map(CameraMarker::from).collect();
    }

    match settings.mode {
        RemovalMode::Delete => {
            let summary = mesh.delete_faces(&hidden);
            report.faces_removed = summary.faces_removed;
            report.vertices_removed = summary.vertices_removed;
        }
        RemovalMode::Select => {
            let kept = analysis.kept_faces();
            mesh.select_faces(&kept);
            report.selected_faces = kept.into_iter().collect();
        }
    }

    info!(
        cameras = report.viewpoint_count,
        faces = faces_total,
        hidden = report.hidden,
        unknown = report.unknown,
        removed = report.faces_removed,
        selected = report.selected_faces.len(),
        "processed geometry"
    );
    Ok(report)
}
