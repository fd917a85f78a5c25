//! STL reading (binary and ASCII) and binary writing.
//!
//! STL stores unshared triangles, so a loaded mesh has three vertices
//! per face. Welding coincident vertices is left to the caller.

use std::io::Write;

use vcull_math::planar::ear_clip;
use vcull_math::{Dir3, PlaneFrame, Point3, Vec3};

use crate::error::{MeshError, Result};
use crate::{MeshAccess, PolyMesh};

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// Parse STL bytes, detecting binary or ASCII encoding.
pub fn read_stl(data: &[u8]) -> Result<PolyMesh> {
    if is_binary(data) {
        read_binary(data)
    } else {
        let text = std::str::from_utf8(data)
            .map_err(|_| MeshError::Unsupported("STL is neither binary nor UTF-8 text".into()))?;
        read_ascii(text)
    }
}

/// Write a mesh as binary STL. Polygons are ear-clipped in their own
/// plane, so concave faces export without covering their notches.
pub fn write_stl<W: Write>(mesh: &PolyMesh, mut writer: W) -> Result<()> {
    let triangles: Vec<[Point3; 3]> = (0..mesh.face_count())
        .flat_map(|f| face_triangles(&mesh.face_positions(f), mesh.face_normal(f)))
        .collect();

    let mut header = [b' '; HEADER_LEN];
    let tag = b"vcull STL export";
    header[..tag.len()].copy_from_slice(tag);
    writer.write_all(&header)?;
    writer.write_all(&(triangles.len() as u32).to_le_bytes())?;

    for [v0, v1, v2] in &triangles {
        let n = (v1 - v0).cross(&(v2 - v0));
        let len = n.norm();
        let n = if len > 1e-12 { n / len } else { Vec3::zeros() };

        for c in [n.x, n.y, n.z] {
            writer.write_all(&(c as f32).to_le_bytes())?;
        }
        for v in [v0, v1, v2] {
            for c in [v.x, v.y, v.z] {
                writer.write_all(&(c as f32).to_le_bytes())?;
            }
        }
        // Attribute byte count
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

fn face_triangles(points: &[Point3], normal: Option<Dir3>) -> Vec<[Point3; 3]> {
    let corners = |tris: Vec<[usize; 3]>| {
        tris.into_iter()
            .map(|[a, b, c]| [points[a], points[b], points[c]])
            .collect()
    };
    match normal {
        Some(normal) if points.len() > 3 => {
            let frame = PlaneFrame::new(points[0], normal);
            let outline: Vec<_> = points.iter().map(|p| frame.project(p)).collect();
            corners(ear_clip(&outline))
        }
        _ => corners((1..points.len() - 1).map(|i| [0, i, i + 1]).collect()),
    }
}

/// A binary file's size is fully determined by its triangle count; use
/// that rather than the `solid` prefix, which binary exporters also emit.
fn is_binary(data: &[u8]) -> bool {
    if data.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    data.len() == HEADER_LEN + 4 + count * TRIANGLE_LEN
}

fn read_binary(data: &[u8]) -> Result<PolyMesh> {
    let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let mut vertices = Vec::with_capacity(count * 3);
    let mut faces = Vec::with_capacity(count);

    for tri in data[HEADER_LEN + 4..].chunks_exact(TRIANGLE_LEN) {
        // Skip the 12-byte facet normal; it is recomputed from winding.
        let base = vertices.len() as u32;
        for v in 0..3 {
            let offset = 12 + v * 12;
            let read = |i: usize| {
                let at = offset + i * 4;
                f32::from_le_bytes([tri[at], tri[at + 1], tri[at + 2], tri[at + 3]]) as f64
            };
            vertices.push(Point3::new(read(0), read(1), read(2)));
        }
        faces.push(vec![base, base + 1, base + 2]);
    }

    PolyMesh::new(vertices, faces)
}

fn read_ascii(text: &str) -> Result<PolyMesh> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    let mut pending: Vec<u32> = Vec::with_capacity(3);

    for (line_idx, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("vertex") => {
                let mut coords = [0.0f64; 3];
                for c in &mut coords {
                    *c = tokens
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| MeshError::Parse {
                            line: line_idx + 1,
                            message: "vertex needs three numeric coordinates".into(),
                        })?;
                }
                pending.push(vertices.len() as u32);
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("endloop") => {
                faces.push(std::mem::take(&mut pending));
            }
            _ => {}
        }
    }

    PolyMesh::new(vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_round_trip_cube() {
        let cube = PolyMesh::cube(Point3::origin(), 2.0);
        let mut buf = Vec::new();
        write_stl(&cube, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 4 + 12 * TRIANGLE_LEN);

        let back = read_stl(&buf).unwrap();
        assert_eq!(back.face_count(), 12);
        assert_eq!(back.vertex_count(), 36);
        for f in 0..back.face_count() {
            let n = back.face_normal(f).unwrap();
            let out = back.face_centroid(f).coords;
            assert!(n.dot(&out) > 0.0);
        }
    }

    #[test]
    fn test_concave_face_export_skips_notch() {
        let l = [(2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0), (0.0, 0.0)];
        let vertices = l.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect();
        let mesh = PolyMesh::new(vertices, vec![(0..6).collect()]).unwrap();

        let mut buf = Vec::new();
        write_stl(&mesh, &mut buf).unwrap();
        let back = read_stl(&buf).unwrap();
        assert_eq!(back.face_count(), 4);
        for f in 0..back.face_count() {
            let c = back.face_centroid(f);
            assert!(!(c.x > 1.0 && c.y > 1.0), "triangle {f} covers the notch");
            assert!(back.face_normal(f).unwrap().z > 0.99);
        }
    }

    #[test]
    fn test_ascii() {
        let text = "solid t
facet normal 0 0 1
 outer loop
  vertex 0 0 0
  vertex 1 0 0
  vertex 0 1 0
 endloop
endfacet
endsolid t
";
        let mesh = read_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert!((mesh.face_normal(0).unwrap().z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ascii_bad_vertex() {
        let text = "solid t\nouter loop\nvertex 0 zero 0\n";
        let err = read_stl(text.as_bytes()).unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 3, .. }));
    }
}
