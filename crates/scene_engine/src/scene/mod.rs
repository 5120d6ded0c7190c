//! Scene persistence
//!
//! Converts a live [`World`](crate::ecs::World) into a [`SceneDocument`] and
//! back. Component fields are walked through the static descriptor tables of
//! the [`ComponentRegistry`]; reference fields travel as identities and are
//! bound only after the whole document has been constructed.

pub mod document;
pub mod registry;
pub mod serializer;

#[cfg(test)]
mod tests;

pub use document::{ComponentRecord, EntityRecord, FieldValue, SceneDocument, TransformRecord, FORMAT_VERSION};
pub use registry::{
    ComponentKind, ComponentRegistry, ErasedField, FieldDescriptor, FieldError, FieldKind, Persistable, ValueType,
};
pub use serializer::SceneSerializer;

use crate::ecs::WorldError;
use crate::foundation::identity::Identity;

/// Scene load and save errors
///
/// Every load error is raised before the target world is touched, except
/// [`SerializationError::World`], which reports a hook failure while the
/// freshly committed subtree was being spawned.
#[derive(thiserror::Error, Debug)]
pub enum SerializationError {
    /// The document could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error, missing required field or mistyped field value
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// A component record names a type tag nobody registered
    #[error("Unknown component type `{0}`")]
    UnknownComponentType(String),

    /// A live component has no descriptor table
    #[error("Component type `{0}` is not registered")]
    UnregisteredComponent(&'static str),

    /// A reference field names an identity the document does not define
    #[error("Field `{component}.{field}` references {identity}, which {reason}")]
    ReferenceResolution {
        /// Type tag of the referencing component
        component: String,
        /// Name of the reference field
        field: String,
        /// Identity that failed to resolve
        identity: Identity,
        /// What went wrong
        reason: &'static str,
    },

    /// Duplicate identity inside the document or against the live world
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The world rejected the committed subtree
    #[error("World error: {0}")]
    World(#[from] WorldError),
}
