#![warn(missing_docs)]

//! Polygon mesh storage and editing for vcull.
//!
//! The visibility pipeline never talks to a concrete mesh type directly;
//! it goes through [`MeshAccess`], a read view of the face list plus the
//! two mutations a run may apply at the end (delete or select). Hosts
//! with their own scene representation implement the trait; the crate
//! ships [`PolyMesh`], an indexed polygon mesh with OBJ and STL I/O.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use vcull_math::Point3;
//! use vcull_mesh::{MeshAccess, PolyMesh};
//!
//! let mut cube = PolyMesh::cube(Point3::origin(), 2.0);
//! assert_eq!(cube.face_count(), 6);
//!
//! let summary = cube.delete_faces(&BTreeSet::from([0, 1]));
//! assert_eq!(summary.faces_removed, 2);
//! assert_eq!(cube.face_count(), 4);
//! ```

pub mod error;
pub mod obj;
mod poly_mesh;
pub mod stl;

pub use error::{MeshError, Result};
pub use poly_mesh::{PolyFace, PolyMesh};

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;
use vcull_math::{Aabb3, Dir3, Point3};

/// Counts reported by [`MeshAccess::delete_faces`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Faces removed from the mesh.
    pub faces_removed: usize,
    /// Vertices removed because no remaining face referenced them.
    pub vertices_removed: usize,
}

/// Read access to a polygon mesh plus the final delete/select mutations.
///
/// Face indices are positions in the face list and stay stable until a
/// call to [`delete_faces`](MeshAccess::delete_faces).
pub trait MeshAccess {
    /// Number of faces.
    fn face_count(&self) -> usize;

    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Position of a vertex.
    fn vertex(&self, index: u32) -> Point3;

    /// Vertex indices of a face, in winding order.
    fn face_vertices(&self, face: usize) -> &[u32];

    /// A point on the face: the vertex mean, or an interior point of the
    /// face plane when a concave loop puts the mean outside.
    fn face_centroid(&self, face: usize) -> Point3;

    /// Outward unit normal, or `None` for a zero-area face.
    fn face_normal(&self, face: usize) -> Option<Dir3>;

    /// Remove the given faces and any vertex no remaining face uses.
    ///
    /// The change is applied in one step: the mesh is either untouched
    /// or fully rebuilt. Indices outside the face range are ignored.
    fn delete_faces(&mut self, faces: &BTreeSet<usize>) -> DeleteSummary;

    /// Replace the face selection with exactly `faces`.
    fn select_faces(&mut self, faces: &BTreeSet<usize>);

    /// Vertex positions of a face, in winding order.
    fn face_positions(&self, face: usize) -> Vec<Point3> {
        self.face_vertices(face)
            .iter()
            .map(|&v| self.vertex(v))
            .collect()
    }

    /// Unique undirected edges, each as `[low, high]` vertex indices.
    fn edges(&self) -> Vec<[u32; 2]> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for face in 0..self.face_count() {
            let verts = self.face_vertices(face);
            for (i, &a) in verts.iter().enumerate() {
                let b = verts[(i + 1) % verts.len()];
                let key = if a < b { [a, b] } else { [b, a] };
                if seen.insert(key) {
                    edges.push(key);
                }
            }
        }
        edges
    }

    /// Bounding box of every vertex referenced by a face.
    fn bounds(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for face in 0..self.face_count() {
            for &v in self.face_vertices(face) {
                aabb.include_point(&self.vertex(v));
            }
        }
        aabb
    }
}

/// Load a mesh, choosing the format from the file extension (`.obj`, `.stl`).
pub fn load_mesh(path: impl AsRef<Path>) -> Result<PolyMesh> {
    let path = path.as_ref();
    let mesh = match extension(path).as_str() {
        "obj" => obj::read_obj(BufReader::new(File::open(path)?))?,
        "stl" => stl::read_stl(&std::fs::read(path)?)?,
        other => {
            return Err(MeshError::Unsupported(format!(
                "unknown mesh format '{other}' for {}",
                path.display()
            )))
        }
    };
    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "loaded mesh"
    );
    Ok(mesh)
}

/// Save a mesh, choosing the format from the file extension (`.obj`, `.stl`).
pub fn save_mesh(mesh: &PolyMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = extension(path);
    if format != "obj" && format != "stl" {
        return Err(MeshError::Unsupported(format!(
            "unknown mesh format '{format}' for {}",
            path.display()
        )));
    }

    let mut writer = BufWriter::new(File::create(path)?);
    if format == "obj" {
        obj::write_obj(mesh, &mut writer)?;
    } else {
        stl::write_stl(mesh, &mut writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
