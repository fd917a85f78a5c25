//! Error types for mesh construction and I/O.

use thiserror::Error;

/// Errors that can occur while building, loading or saving a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Underlying file or stream error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed record in a text format.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A face violates the polygon invariant.
    #[error("face {face} is invalid: {reason}")]
    InvalidFace {
        /// Face index.
        face: usize,
        /// Why the face was rejected.
        reason: String,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {count} vertices")]
    VertexOutOfRange {
        /// Face index.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        count: usize,
    },

    /// File format or feature not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
