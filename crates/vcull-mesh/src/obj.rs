//! Wavefront OBJ reading and writing.
//!
//! Only geometry is kept: `v` positions and `f` polygon loops. Texture
//! and normal references in `f a/b/c` records are dropped, and every
//! other record type is skipped.

use std::io::{BufRead, Write};

use vcull_math::Point3;

use crate::error::{MeshError, Result};
use crate::PolyMesh;

/// Parse an OBJ stream into a polygon mesh.
pub fn read_obj<R: BufRead>(reader: R) -> Result<PolyMesh> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_idx + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0f64; 3];
                for c in &mut coords {
                    let token = tokens.next().ok_or_else(|| MeshError::Parse {
                        line: line_no,
                        message: "vertex needs three coordinates".into(),
                    })?;
                    *c = token.parse().map_err(|_| MeshError::Parse {
                        line: line_no,
                        message: format!("invalid coordinate '{token}'"),
                    })?;
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let face = tokens
                    .map(|t| resolve_index(t, vertices.len(), line_no))
                    .collect::<Result<Vec<u32>>>()?;
                faces.push(face);
            }
            _ => {}
        }
    }

    PolyMesh::new(vertices, faces)
}

/// Parse OBJ text held in memory.
pub fn read_obj_str(text: &str) -> Result<PolyMesh> {
    read_obj(text.as_bytes())
}

/// Write a mesh as OBJ (`v` and `f` records only).
pub fn write_obj<W: Write>(mesh: &PolyMesh, mut writer: W) -> Result<()> {
    writeln!(writer, "# vcull")?;
    for v in mesh.vertices() {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for face in mesh.faces() {
        write!(writer, "f")?;
        for i in &face.indices {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write bare points as an OBJ point cloud (`v` records plus one `p`).
pub fn write_obj_points<W: Write>(points: &[Point3], mut writer: W) -> Result<()> {
    writeln!(writer, "# vcull points")?;
    for p in points {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    if !points.is_empty() {
        write!(writer, "p")?;
        for i in 1..=points.len() {
            write!(writer, " {i}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Turn a 1-based (or negative, relative) OBJ index into a 0-based one.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> Result<u32> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = head.parse().map_err(|_| MeshError::Parse {
        line,
        message: format!("invalid face index '{token}'"),
    })?;

    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(vertex_count as i64 + r),
    };

    match resolved {
        Some(i) if i >= 0 && i <= u32::MAX as i64 => Ok(i as u32),
        _ => Err(MeshError::Parse {
            line,
            message: format!("face index '{token}' out of range"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeshAccess;

    #[test]
    fn test_read_quad_and_triangle() {
        let text = "\
# comment
o thing
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
f 1/1 2/2 -1/3
";
        let mesh = read_obj_str(text).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.face_vertices(0), &[0, 1, 2, 3]);
        assert_eq!(mesh.face_vertices(1), &[0, 1, 3]);
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let err = read_obj_str("v 0 0 0\nv 1 x 0\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_zero_index_rejected() {
        let err = read_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_write_then_read_cube() {
        let cube = PolyMesh::cube(Point3::origin(), 2.0);
        let mut buf = Vec::new();
        write_obj(&cube, &mut buf).unwrap();
        let back = read_obj(buf.as_slice()).unwrap();
        assert_eq!(back.face_count(), 6);
        assert_eq!(back.vertex_count(), 8);
        assert_eq!(back.face_vertices(3), cube.face_vertices(3));
    }

    #[test]
    fn test_write_points() {
        let mut buf = Vec::new();
        write_obj_points(&[Point3::new(1.0, 2.0, 3.0), Point3::origin()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("v 1 2 3"));
        assert!(text.trim_end().ends_with("p 1 2"));
    }
}
