//! Error types for visibility analysis.

use thiserror::Error;

/// Errors that can stop a hidden geometry removal run.
///
/// Mesh loading and saving report [`vcull_mesh::MeshError`]; once a mesh
/// is in memory only these two can occur.
///
/// Everything else (degenerate faces, near-parallel rays, coincident
/// surfaces) is resolved locally and never surfaces as an error.
#[derive(Error, Debug)]
pub enum VisibilityError {
    /// Settings out of range; raised before the mesh is touched.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The run was cancelled; the mesh was left unmodified.
    #[error("visibility analysis cancelled")]
    Cancelled,
}

/// Result type for visibility operations.
pub type Result<T> = std::result::Result<T, VisibilityError>;
