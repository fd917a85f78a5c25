//! Run configuration.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisibilityError};

/// Allowed latitude band count.
pub const ROWS_RANGE: RangeInclusive<u32> = 2..=12;
/// Allowed cameras per band (must also be even).
pub const CAMERAS_PER_ROW_RANGE: RangeInclusive<u32> = 2..=12;
/// Allowed experimental sampling ratio, in percent.
pub const SAMPLING_RATIO_RANGE: RangeInclusive<f64> = 1.0..=100.0;
/// Allowed flatness angle, in degrees.
pub const FLATNESS_ANGLE_RANGE: RangeInclusive<f64> = 10.0..=90.0;

/// Which points of a face are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Centroid, every vertex and every edge midpoint (2n + 1 points).
    High,
    /// Centroid only.
    Low,
}

/// What to do with the verdicts once sampling is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalMode {
    /// Delete hidden faces and the vertices they orphan.
    Delete,
    /// Select every face that is not hidden and leave geometry untouched.
    Select,
}

/// Hidden geometry removal parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalSettings {
    /// Number of latitude bands of viewpoints.
    pub rows: u32,
    /// Viewpoints per latitude band (even).
    pub cameras_per_row: u32,
    /// Camera sphere radius as a multiple of the bounding-sphere radius.
    pub camera_distance_factor: f64,
    /// Sample points tested per face.
    pub precision: Precision,
    /// Delete hidden faces or select visible ones.
    pub mode: RemovalMode,
    /// Return viewpoint markers in the report.
    pub keep_cameras: bool,
    /// Sample only a random subset of faces and propagate verdicts by flatness.
    pub experimental: bool,
    /// Percentage of faces sampled directly in experimental mode.
    pub face_sampling_ratio: f64,
    /// Maximum normal angle (degrees) for a face to borrow a seed's verdict.
    pub flatness_angle: f64,
    /// Seed for the experimental face subset.
    pub seed: u64,
    /// Hit tolerance relative to the bounding-sphere radius.
    pub hit_tolerance: f64,
    /// Optional full camera cone angle in degrees.
    pub field_of_view: Option<f64>,
    /// Classify faces on the rayon thread pool.
    pub parallel: bool,
}

impl Default for RemovalSettings {
    fn default() -> Self {
        Self {
            rows: 4,
            cameras_per_row: 8,
            camera_distance_factor: 2.0,
            precision: Precision::High,
            mode: RemovalMode::Delete,
            keep_cameras: false,
            experimental: false,
            face_sampling_ratio: 25.0,
            flatness_angle: 15.0,
            seed: 0,
            hit_tolerance: 1e-6,
            field_of_view: None,
            parallel: true,
        }
    }
}

impl RemovalSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        validate_camera_grid(self.rows, self.cameras_per_row)?;
        if !(self.camera_distance_factor.is_finite() && self.camera_distance_factor > 0.0) {
            return Err(VisibilityError::InvalidSettings(format!(
                "camera_distance_factor must be positive, got {}",
                self.camera_distance_factor
            )));
        }
        if !SAMPLING_RATIO_RANGE.contains(&self.face_sampling_ratio) {
            return Err(VisibilityError::InvalidSettings(format!(
                "face_sampling_ratio must be between 1 and 100%, got {}",
                self.face_sampling_ratio
            )));
        }
        if !FLATNESS_ANGLE_RANGE.contains(&self.flatness_angle) {
            return Err(VisibilityError::InvalidSettings(format!(
                "flatness_angle must be between 10 and 90 degrees, got {}",
                self.flatness_angle
            )));
        }
        if !(self.hit_tolerance > 0.0 && self.hit_tolerance < 1.0) {
            return Err(VisibilityError::InvalidSettings(format!(
                "hit_tolerance must be in (0, 1), got {}",
                self.hit_tolerance
            )));
        }
        if let Some(fov) = self.field_of_view {
            if !(fov > 0.0 && fov <= 180.0) {
                return Err(VisibilityError::InvalidSettings(format!(
                    "field_of_view must be in (0, 180] degrees, got {fov}"
                )));
            }
        }
        Ok(())
    }
}

/// Check the viewpoint grid dimensions.
pub(crate) fn validate_camera_grid(rows: u32, cameras_per_row: u32) -> Result<()> {
    if !ROWS_RANGE.contains(&rows) {
        return Err(VisibilityError::InvalidSettings(format!(
            "rows must be between 2 and 12, got {rows}"
        )));
    }
    if !CAMERAS_PER_ROW_RANGE.contains(&cameras_per_row) {
        return Err(VisibilityError::InvalidSettings(format!(
            "cameras_per_row must be between 2 and 12, got {cameras_per_row}"
        )));
    }
    if cameras_per_row % 2 != 0 {
        return Err(VisibilityError::InvalidSettings(format!(
            "cameras_per_row must be even, got {cameras_per_row}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(settings: RemovalSettings) -> String {
        match settings.validate() {
            Err(VisibilityError::InvalidSettings(msg)) => msg,
            other => panic!("expected InvalidSettings, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        RemovalSettings::default().validate().unwrap();
    }

    #[test]
    fn test_odd_cameras_rejected() {
        let msg = invalid(RemovalSettings {
            cameras_per_row: 5,
            ..Default::default()
        });
        assert!(msg.contains("even"));
    }

    #[test]
    fn test_grid_bounds() {
        invalid(RemovalSettings {
            rows: 1,
            ..Default::default()
        });
        invalid(RemovalSettings {
            rows: 13,
            ..Default::default()
        });
        invalid(RemovalSettings {
            cameras_per_row: 14,
            ..Default::default()
        });
        RemovalSettings {
            rows: 12,
            cameras_per_row: 12,
            ..Default::default()
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn test_distance_factor() {
        invalid(RemovalSettings {
            camera_distance_factor: 0.0,
            ..Default::default()
        });
        invalid(RemovalSettings {
            camera_distance_factor: f64::NAN,
            ..Default::default()
        });
    }

    #[test]
    fn test_experimental_ranges() {
        invalid(RemovalSettings {
            face_sampling_ratio: 0.5,
            ..Default::default()
        });
        invalid(RemovalSettings {
            flatness_angle: 95.0,
            ..Default::default()
        });
        invalid(RemovalSettings {
            field_of_view: Some(0.0),
            ..Default::default()
        });
    }

    #[test]
    fn test_serde_partial_document() {
        let json = r#"{ "rows": 6, "precision": "low", "mode": "select" }"#;
        let settings: RemovalSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.rows, 6);
        assert_eq!(settings.precision, Precision::Low);
        assert_eq!(settings.mode, RemovalMode::Select);
        assert_eq!(settings.cameras_per_row, 8);
    }
}
