//! Persisted scene document
//!
//! One [`EntityRecord`] per entity, nested to describe the tree. Transform
//! records hold local values; vectors are fixed-length tuples (3 for
//! position and scale, 4 for rotation in `x, y, z, w` order). Reference
//! fields hold the target's identity string.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::identity::Identity;
use crate::foundation::math::{self, Pose, Vec3};

use super::SerializationError;

/// Current document format version
pub const FORMAT_VERSION: u32 = 1;

/// RON nesting limit; every entity record nests a handful of levels deep
const RON_RECURSION_LIMIT: usize = 4096;

fn ron_options() -> ron::Options {
    ron::Options::default().with_recursion_limit(RON_RECURSION_LIMIT)
}

const fn default_version() -> u32 {
    FORMAT_VERSION
}

const fn enabled_by_default() -> bool {
    true
}

/// A whole scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Record of the root entity
    pub root: EntityRecord,
}

/// One entity and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Persistent identity
    pub id: Identity,
    /// Display name
    pub name: String,
    /// Own active flag
    pub active: bool,
    /// Local transform
    pub transform: TransformRecord,
    /// Components in insertion order
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
    /// Children in order
    #[serde(default)]
    pub children: Vec<EntityRecord>,
}

/// Local position, rotation and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    /// Local position
    pub position: [f32; 3],
    /// Local rotation, `x, y, z, w`
    pub rotation: [f32; 4],
    /// Local scale
    pub scale: [f32; 3],
}

impl From<&Pose> for TransformRecord {
    fn from(pose: &Pose) -> Self {
        Self {
            position: pose.position.into(),
            rotation: math::quat_to_xyzw(&pose.rotation),
            scale: pose.scale.into(),
        }
    }
}

impl From<&TransformRecord> for Pose {
    fn from(record: &TransformRecord) -> Self {
        Self {
            position: Vec3::from(record.position),
            rotation: math::quat_from_xyzw(record.rotation),
            scale: Vec3::from(record.scale),
        }
    }
}

/// One component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Type tag of the concrete kind
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Identity of the owning entity
    pub entity: Identity,
    /// Persistent identity
    pub id: Identity,
    /// User-controlled enabled flag
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Field values by name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

/// A persisted field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f32),
    /// String, also used for enums and key names
    Text(String),
    /// 3-vector
    Vec3([f32; 3]),
    /// Rotation, `x, y, z, w`
    Quat([f32; 4]),
    /// Identity of another entity or component, or unset
    Ref(Option<Identity>),
}

impl FieldValue {
    /// Variant name, for diagnostics
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::Text(_) => "Text",
            Self::Vec3(_) => "Vec3",
            Self::Quat(_) => "Quat",
            Self::Ref(_) => "Ref",
        }
    }
}

impl SceneDocument {
    /// Parse a RON document
    pub fn from_ron_str(text: &str) -> Result<Self, SerializationError> {
        ron_options()
            .from_str(text)
            .map_err(|e| SerializationError::Malformed(e.to_string()))
    }

    /// Render as pretty RON
    pub fn to_ron_string(&self) -> Result<String, SerializationError> {
        ron_options()
            .to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SerializationError::Malformed(e.to_string()))
    }

    /// Read a RON document from disk
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SerializationError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Write the document to disk as RON
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SerializationError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}
