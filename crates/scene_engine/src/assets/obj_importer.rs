//! Wavefront OBJ importer
//!
//! Reads `v`, `vt`, `vn` and `f` statements; everything else is skipped.
//! Face corners that repeat the same position/uv/normal triple share one
//! vertex, and polygons are fan-triangulated.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use super::mesh::{MeshRecord, Vertex};
use super::{AssetImporter, ImportError};

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// Importer for `.obj` files
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjImporter;

/// Zero-based indices of one face corner
type Corner = (usize, Option<usize>, Option<usize>);

#[derive(Default)]
struct ObjState {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    mesh: MeshRecord,
    seen: HashMap<Corner, u32>,
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize, what: &str) -> Result<[f32; N], ImportError> {
    let mut values = [0.0; N];
    if parts.len() < N {
        return Err(ImportError::Parse {
            line,
            message: format!("{what} needs {N} components"),
        });
    }
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part.parse().map_err(|_| ImportError::Parse {
            line,
            message: format!("invalid {what} component `{part}`"),
        })?;
    }
    Ok(values)
}

/// Convert a 1-based (or negative, relative) OBJ index into a 0-based one
fn resolve_index(token: &str, count: usize, line: usize) -> Result<usize, ImportError> {
    let raw: i64 = token.parse().map_err(|_| ImportError::Parse {
        line,
        message: format!("invalid index `{token}`"),
    })?;
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    let index = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(count + r),
    };
    index
        .filter(|i| (0..count).contains(i))
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| ImportError::InvalidFormat(format!("index {raw} out of bounds on line {line}")))
}

impl ObjState {
    fn corner(&self, token: &str, line: usize) -> Result<Corner, ImportError> {
        let mut fields = token.split('/');
        let position = fields.next().unwrap_or_default();
        let position = resolve_index(position, self.positions.len(), line)?;
        let uv = match fields.next() {
            Some(t) if !t.is_empty() => Some(resolve_index(t, self.uvs.len(), line)?),
            _ => None,
        };
        let normal = match fields.next() {
            Some(t) if !t.is_empty() => Some(resolve_index(t, self.normals.len(), line)?),
            _ => None,
        };
        Ok((position, uv, normal))
    }

    fn vertex_index(&mut self, corner: Corner) -> Result<u32, ImportError> {
        if let Some(index) = self.seen.get(&corner) {
            return Ok(*index);
        }
        let (position, uv, normal) = corner;
        let vertex = Vertex {
            position: self.positions[position],
            normal: normal.map_or(DEFAULT_NORMAL, |i| self.normals[i]),
            uv: uv.map_or(DEFAULT_UV, |i| self.uvs[i]),
        };
        let index = u32::try_from(self.mesh.vertices.len())
            .map_err(|_| ImportError::InvalidFormat("too many vertices".to_string()))?;
        self.mesh.vertices.push(vertex);
        self.seen.insert(corner, index);
        Ok(index)
    }

    fn face(&mut self, tokens: &[&str], line: usize) -> Result<(), ImportError> {
        if tokens.len() < 3 {
            return Err(ImportError::Parse {
                line,
                message: format!("face needs at least 3 corners, found {}", tokens.len()),
            });
        }
        let mut corners = Vec::with_capacity(tokens.len());
        for token in tokens {
            let corner = self.corner(token, line)?;
            corners.push(self.vertex_index(corner)?);
        }
        for i in 1..corners.len() - 1 {
            self.mesh.indices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
        }
        Ok(())
    }
}

impl ObjImporter {
    /// Parse OBJ statements from any buffered reader
    pub fn import_reader(&self, reader: impl BufRead) -> Result<MeshRecord, ImportError> {
        let mut state = ObjState::default();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let number = number + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some((keyword, rest)) = parts.split_first() else { continue };
            match *keyword {
                "v" => state.positions.push(parse_floats::<3>(rest, number, "position")?),
                "vn" => state.normals.push(parse_floats::<3>(rest, number, "normal")?),
                "vt" => state.uvs.push(parse_floats::<2>(rest, number, "texture coordinate")?),
                "f" => state.face(rest, number)?,
                other => debug!("Skipping OBJ statement `{other}` on line {number}"),
            }
        }

        if state.mesh.vertices.is_empty() {
            return Err(ImportError::InvalidFormat("no faces found".to_string()));
        }
        Ok(state.mesh)
    }

    /// Parse OBJ text held in memory
    pub fn import_str(&self, text: &str) -> Result<MeshRecord, ImportError> {
        self.import_reader(text.as_bytes())
    }
}

impl AssetImporter for ObjImporter {
    fn extensions(&self) -> &[&'static str] {
        &["obj"]
    }

    fn import(&self, path: &Path) -> Result<MeshRecord, ImportError> {
        let reader = BufReader::new(File::open(path)?);
        let mesh = self.import_reader(reader)?;
        info!(
            "Imported {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = ObjImporter.import_str(QUAD).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices[2].uv, [1.0, 1.0]);
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shared_corners_are_deduplicated() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";
        let mesh = ObjImporter.import_str(text).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices[0].normal, DEFAULT_NORMAL);
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = ObjImporter.import_str(text).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(
            ObjImporter.import_str("v 0 0 nope\n"),
            Err(ImportError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            ObjImporter.import_str("v 0 0 0\nf 1 2 3\n"),
            Err(ImportError::InvalidFormat(_))
        ));
        assert!(matches!(
            ObjImporter.import_str("v 0 0 0\nv 1 0 0\nf 1 2\n"),
            Err(ImportError::Parse { line: 3, .. })
        ));
        assert!(matches!(ObjImporter.import_str("# empty\n"), Err(ImportError::InvalidFormat(_))));
    }

    #[test]
    fn test_accepts_extension() {
        assert!(ObjImporter.accepts(Path::new("models/teapot.OBJ")));
        assert!(!ObjImporter.accepts(Path::new("models/teapot.fbx")));
    }

    #[test]
    fn test_mesh_record_file_round_trip() {
        let mesh = ObjImporter.import_str(QUAD).unwrap();
        let path = std::env::temp_dir().join(format!("scene_engine_mesh_{}.ron", std::process::id()));
        mesh.save(&path).unwrap();
        let loaded = MeshRecord::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, mesh);
    }
}
