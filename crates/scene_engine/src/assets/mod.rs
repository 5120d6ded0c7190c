//! Out-of-band asset import
//!
//! Converts raw model files into [`MeshRecord`]s that renderers load by path.
//! Nothing here runs on the per-frame path.

pub mod mesh;
pub mod obj_importer;

pub use mesh::{MeshRecord, Vertex};
pub use obj_importer::ObjImporter;

use std::path::Path;

use thiserror::Error;

/// Asset import errors
#[derive(Error, Debug)]
pub enum ImportError {
    /// The source or target file could not be accessed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A statement could not be parsed
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The file parsed but does not describe a usable mesh
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Converts one family of model files into mesh records
pub trait AssetImporter {
    /// Lower-case file extensions this importer accepts, without the dot
    fn extensions(&self) -> &[&'static str];

    /// Read and convert the file at `path`
    fn import(&self, path: &Path) -> Result<MeshRecord, ImportError>;

    /// Whether `path` carries one of [`AssetImporter::extensions`]
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions().iter().any(|known| known.eq_ignore_ascii_case(ext)))
    }
}
