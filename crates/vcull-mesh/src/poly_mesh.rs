//! Indexed polygon mesh with cached face centroids and normals.

use std::collections::BTreeSet;

use tracing::debug;
use vcull_math::planar::{interior_point, point_in_polygon};
use vcull_math::{polygon_normal, Dir3, PlaneFrame, Point3, Vec3};

use crate::error::{MeshError, Result};
use crate::{DeleteSummary, MeshAccess};

/// A polygon face with cached derived data.
#[derive(Debug, Clone)]
pub struct PolyFace {
    /// Vertex indices in winding order (at least three).
    pub indices: Vec<u32>,
    /// Mean of the face vertices, moved onto the face when a concave
    /// loop puts the mean outside it.
    pub centroid: Point3,
    /// Unit normal from Newell's method, `None` if the face has no area.
    pub normal: Option<Dir3>,
}

/// An indexed polygon mesh.
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    vertices: Vec<Point3>,
    faces: Vec<PolyFace>,
    selected: Vec<bool>,
}

impl PolyMesh {
    /// Build a mesh from vertex positions and face index loops.
    ///
    /// Every face must have at least three vertices and every index must
    /// be in range. Zero-area faces are accepted; their normal is `None`.
    pub fn new(vertices: Vec<Point3>, faces: Vec<Vec<u32>>) -> Result<Self> {
        let count = vertices.len();
        let mut built = Vec::with_capacity(faces.len());

        for (face, indices) in faces.into_iter().enumerate() {
            if indices.len() < 3 {
                return Err(MeshError::InvalidFace {
                    face,
                    reason: format!("{} vertices, need at least 3", indices.len()),
                });
            }
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= count) {
                return Err(MeshError::VertexOutOfRange { face, index, count });
            }
            built.push(make_face(&vertices, indices));
        }

        let selected = vec![false; built.len()];
        Ok(Self {
            vertices,
            faces: built,
            selected,
        })
    }

    /// Axis-aligned cube with outward-facing quads.
    pub fn cube(center: Point3, size: f64) -> Self {
        let h = size / 2.0;
        let corner = |x: f64, y: f64, z: f64| center + Vec3::new(x * h, y * h, z * h);
        let vertices = vec![
            corner(-1.0, -1.0, -1.0),
            corner(1.0, -1.0, -1.0),
            corner(1.0, 1.0, -1.0),
            corner(-1.0, 1.0, -1.0),
            corner(-1.0, -1.0, 1.0),
            corner(1.0, -1.0, 1.0),
            corner(1.0, 1.0, 1.0),
            corner(-1.0, 1.0, 1.0),
        ];
        let faces: [[u32; 4]; 6] = [
            [0, 3, 2, 1], // -Z
            [4, 5, 6, 7], // +Z
            [0, 1, 5, 4], // -Y
            [3, 7, 6, 2], // +Y
            [0, 4, 7, 3], // -X
            [1, 2, 6, 5], // +X
        ];

        let faces = faces
            .iter()
            .map(|f| make_face(&vertices, f.to_vec()))
            .collect::<Vec<_>>();
        let selected = vec![false; faces.len()];
        Self {
            vertices,
            faces,
            selected,
        }
    }

    /// Append another mesh's vertices and faces to this one.
    ///
    /// No vertices are merged; the result is a single mesh containing
    /// both shells.
    pub fn append(&mut self, other: &PolyMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        for face in &other.faces {
            let indices = face.indices.iter().map(|i| i + base).collect();
            self.faces.push(PolyFace {
                indices,
                centroid: face.centroid,
                normal: face.normal,
            });
        }
        self.selected.extend_from_slice(&other.selected);
    }

    /// All vertex positions.
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// All faces.
    pub fn faces(&self) -> &[PolyFace] {
        &self.faces
    }

    /// Indices of the currently selected faces, ascending.
    pub fn selected_faces(&self) -> Vec<usize> {
        self.selected
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
            .collect()
    }

    /// Indices of faces with no usable normal.
    pub fn degenerate_faces(&self) -> Vec<usize> {
        self.faces
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.normal.is_none().then_some(i))
            .collect()
    }
}

impl MeshAccess for PolyMesh {
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn vertex(&self, index: u32) -> Point3 {
        self.vertices[index as usize]
    }

    fn face_vertices(&self, face: usize) -> &[u32] {
        &self.faces[face].indices
    }

    fn face_centroid(&self, face: usize) -> Point3 {
        self.faces[face].centroid
    }

    fn face_normal(&self, face: usize) -> Option<Dir3> {
        self.faces[face].normal
    }

    fn delete_faces(&mut self, faces: &BTreeSet<usize>) -> DeleteSummary {
        let removed = faces.iter().filter(|&&f| f < self.faces.len()).count();
        if removed == 0 {
            return DeleteSummary::default();
        }

        let mut kept_faces = Vec::with_capacity(self.faces.len() - removed);
        let mut kept_selected = Vec::with_capacity(self.faces.len() - removed);
        for (i, face) in self.faces.iter().enumerate() {
            if !faces.contains(&i) {
                kept_faces.push(face.clone());
                kept_selected.push(self.selected[i]);
            }
        }

        // Compact vertices no surviving face references.
        let mut referenced = vec![false; self.vertices.len()];
        for face in &kept_faces {
            for &v in &face.indices {
                referenced[v as usize] = true;
            }
        }

        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut kept_vertices = Vec::with_capacity(self.vertices.len());
        for (old, vertex) in self.vertices.iter().enumerate() {
            if referenced[old] {
                remap[old] = kept_vertices.len() as u32;
                kept_vertices.push(*vertex);
            }
        }

        for face in &mut kept_faces {
            for v in &mut face.indices {
                *v = remap[*v as usize];
            }
        }

        let vertices_removed = self.vertices.len() - kept_vertices.len();
        self.vertices = kept_vertices;
        self.faces = kept_faces;
        self.selected = kept_selected;

        debug!(
            faces_removed = removed,
            vertices_removed, "deleted faces and orphaned vertices"
        );

        DeleteSummary {
            faces_removed: removed,
            vertices_removed,
        }
    }

    fn select_faces(&mut self, faces: &BTreeSet<usize>) {
        for (i, selected) in self.selected.iter_mut().enumerate() {
            *selected = faces.contains(&i);
        }
    }
}

fn make_face(vertices: &[Point3], indices: Vec<u32>) -> PolyFace {
    let points: Vec<Point3> = indices.iter().map(|&i| vertices[i as usize]).collect();
    let normal = polygon_normal(&points);
    PolyFace {
        centroid: face_center(&points, normal),
        normal,
        indices,
    }
}

/// Vertex mean, or an interior point of the face plane when the mean
/// falls outside the loop.
fn face_center(points: &[Point3], normal: Option<Dir3>) -> Point3 {
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    let mean = Point3::from(sum / points.len() as f64);
    let Some(normal) = normal else {
        return mean;
    };

    let frame = PlaneFrame::new(mean, normal);
    let outline: Vec<_> = points.iter().map(|p| frame.project(p)).collect();
    let hint = frame.project(&mean);
    if point_in_polygon(&hint, &outline) {
        return mean;
    }
    interior_point(&outline, &hint).map_or(mean, |uv| frame.unproject(&uv))
}
