//! Points on a face that are tested for visibility.

use vcull_math::Point3;
use vcull_mesh::MeshAccess;

use crate::settings::Precision;

/// Where on its face a sample point lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// The face centroid.
    Centroid,
    /// A face corner, by vertex index.
    Vertex(u32),
    /// Midpoint of the edge between two consecutive face vertices.
    EdgeMidpoint(u32, u32),
}

/// A point tested for occlusion, tagged with its owning face.
#[derive(Debug, Clone, Copy)]
pub struct SamplePoint {
    /// Face the point belongs to.
    pub face: usize,
    /// World position.
    pub position: Point3,
    /// Kind of point.
    pub kind: SampleKind,
}

/// Sample points for `face`, centroid first.
///
/// `Low` yields only the centroid. `High` yields the centroid, then each
/// vertex in winding order, then each edge midpoint, `2n + 1` points for
/// an n-gon. The sequence is lazy so classification can stop at the first
/// unoccluded point without computing the rest.
pub fn sample_points<M: MeshAccess + ?Sized>(
    mesh: &M,
    face: usize,
    precision: Precision,
) -> impl Iterator<Item = SamplePoint> + '_ {
    let verts = mesh.face_vertices(face);
    let n = match precision {
        Precision::High => verts.len(),
        Precision::Low => 0,
    };

    let centroid = std::iter::once(SamplePoint {
        face,
        position: mesh.face_centroid(face),
        kind: SampleKind::Centroid,
    });
    let corners = verts[..n].iter().map(move |&v| SamplePoint {
        face,
        position: mesh.vertex(v),
        kind: SampleKind::Vertex(v),
    });
    let midpoints = (0..n).map(move |i| {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        SamplePoint {
            face,
            position: midpoint(&mesh.vertex(a), &mesh.vertex(b)),
            kind: SampleKind::EdgeMidpoint(a, b),
        }
    });

    centroid.chain(corners).chain(midpoints)
}

fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    a + (b - a) * 0.5
}
