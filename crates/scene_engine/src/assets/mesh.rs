//! Imported mesh data

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::ImportError;

/// One deduplicated vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub uv: [f32; 2],
}

/// Indexed triangle list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    /// Unique vertices
    pub vertices: Vec<Vertex>,
    /// Three indices per triangle
    pub indices: Vec<u32>,
}

impl MeshRecord {
    /// Number of triangles
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Write the record to disk as RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImportError> {
        let path = path.as_ref();
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ImportError::InvalidFormat(e.to_string()))?;
        std::fs::write(path, text)?;
        info!(
            "Wrote mesh with {} vertices and {} triangles to {}",
            self.vertices.len(),
            self.triangle_count(),
            path.display()
        );
        Ok(())
    }

    /// Read a RON mesh record from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path)?;
        ron::from_str(&text).map_err(|e| ImportError::InvalidFormat(e.to_string()))
    }
}
