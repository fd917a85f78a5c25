//! Camera placement on a sphere around the mesh.
//!
//! Viewpoints are laid out in `rows` latitude bands of `cameras_per_row`
//! positions each. Band `i` sits at latitude `-90° + 180° (i + ½) / rows`,
//! so no camera lands on a pole and two bands give the ±45° rings. Odd
//! bands are rotated by half a longitude step so that adjacent bands do
//! not line up vertically.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use vcull_math::{spherical_direction, BoundingSphere, Dir3, Point3};

use crate::error::{Result, VisibilityError};
use crate::settings::validate_camera_grid;

/// A position rays are cast from, looking at the sphere center.
#[derive(Debug, Clone, Copy)]
pub struct Viewpoint {
    /// Camera position.
    pub position: Point3,
    /// Unit direction from the camera towards the sphere center.
    pub look: Dir3,
    /// Latitude band index, 0 = southernmost.
    pub row: u32,
    /// Index within the band.
    pub column: u32,
}

/// Serializable camera marker kept for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraMarker {
    /// Camera position.
    pub position: [f64; 3],
    /// Look direction.
    pub look: [f64; 3],
}

impl From<&Viewpoint> for CameraMarker {
    fn from(vp: &Viewpoint) -> Self {
        Self {
            position: [vp.position.x, vp.position.y, vp.position.z],
            look: [vp.look.x, vp.look.y, vp.look.z],
        }
    }
}

/// Generate `rows * cameras_per_row` viewpoints around `sphere`.
///
/// Cameras sit at `sphere.radius * distance_factor` from the center.
/// Rejects out-of-range or odd grid sizes and non-positive factors.
pub fn generate_viewpoints(
    sphere: &BoundingSphere,
    rows: u32,
    cameras_per_row: u32,
    distance_factor: f64,
) -> Result<Vec<Viewpoint>> {
    validate_camera_grid(rows, cameras_per_row)?;
    if !(distance_factor.is_finite() && distance_factor > 0.0) {
        return Err(VisibilityError::InvalidSettings(format!(
            "camera_distance_factor must be positive, got {distance_factor}"
        )));
    }

    let radius = sphere.radius * distance_factor;
    let lon_step = 2.0 * PI / cameras_per_row as f64;
    let mut viewpoints = Vec::with_capacity((rows * cameras_per_row) as usize);

    for row in 0..rows {
        let latitude = -PI / 2.0 + PI * (row as f64 + 0.5) / rows as f64;
        let stagger = if row % 2 == 1 { lon_step / 2.0 } else { 0.0 };

        for column in 0..cameras_per_row {
            let longitude = column as f64 * lon_step + stagger;
            let dir = spherical_direction(latitude, longitude);
            viewpoints.push(Viewpoint {
                position: sphere.center + dir * radius,
                look: Dir3::new_normalize(-dir),
                row,
                column,
            });
        }
    }

    Ok(viewpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sphere() -> BoundingSphere {
        BoundingSphere {
            center: Point3::new(1.0, -2.0, 0.5),
            radius: 3.0,
        }
    }

    #[test]
    fn test_count_matches_grid() {
        for rows in [2, 3, 7, 12] {
            for cams in [2, 4, 10, 12] {
                let vps = generate_viewpoints(&sphere(), rows, cams, 1.5).unwrap();
                assert_eq!(vps.len(), (rows * cams) as usize);
            }
        }
    }

    #[test]
    fn test_on_sphere_and_looking_at_center() {
        let s = sphere();
        for vp in generate_viewpoints(&s, 4, 6, 2.0).unwrap() {
            let offset = vp.position - s.center;
            assert_relative_eq!(offset.norm(), 6.0, epsilon = 1e-9);
            assert!(!s.contains(&vp.position, 0.0));
            let towards = Dir3::new_normalize(-offset);
            assert_relative_eq!(vp.look.dot(&towards), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_two_rows_are_the_45_degree_rings() {
        let s = BoundingSphere {
            center: Point3::origin(),
            radius: 1.0,
        };
        let vps = generate_viewpoints(&s, 2, 4, 1.0).unwrap();
        let h = (PI / 4.0).sin();
        assert!(vps[..4].iter().all(|vp| (vp.position.z + h).abs() < 1e-12));
        assert!(vps[4..].iter().all(|vp| (vp.position.z - h).abs() < 1e-12));
    }

    #[test]
    fn test_odd_rows_are_staggered() {
        let s = BoundingSphere {
            center: Point3::origin(),
            radius: 1.0,
        };
        let vps = generate_viewpoints(&s, 2, 4, 1.0).unwrap();
        let lon = |vp: &Viewpoint| vp.position.y.atan2(vp.position.x);
        assert_relative_eq!(lon(&vps[0]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(lon(&vps[4]), PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let a = generate_viewpoints(&sphere(), 5, 8, 2.0).unwrap();
        let b = generate_viewpoints(&sphere(), 5, 8, 2.0).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position);
        }
    }

    #[test]
    fn test_rejects_invalid_grid() {
        assert!(generate_viewpoints(&sphere(), 4, 5, 2.0).is_err());
        assert!(generate_viewpoints(&sphere(), 1, 4, 2.0).is_err());
        assert!(generate_viewpoints(&sphere(), 4, 4, -1.0).is_err());
    }

    #[test]
    fn test_marker_conversion() {
        let vps = generate_viewpoints(&sphere(), 2, 2, 1.0).unwrap();
        let marker = CameraMarker::from(&vps[0]);
        assert_eq!(marker.position[0], vps[0].position.x);
        assert_eq!(marker.look[2], vps[0].look.z);
    }
}
