//! Error types for the entity tree and its lifecycle hooks

use std::fmt;

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::identity::DuplicateIdentity;
use crate::render::RenderError;

/// Lifecycle hook names, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// First hook a behaviour receives once attached to the world
    Spawn,
    /// Behaviour became enabled inside an active hierarchy
    Enable,
    /// First-time initialization, the frame after enable
    Init,
    /// Per-frame update
    Update,
    /// After the render pass
    RenderFinished,
    /// Behaviour stopped being enabled
    Disable,
    /// Behaviour is being torn down
    Destroy,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spawn => "spawn",
            Self::Enable => "enable",
            Self::Init => "init",
            Self::Update => "update",
            Self::RenderFinished => "render-finished",
            Self::Disable => "disable",
            Self::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Error raised from inside a behaviour hook
#[derive(thiserror::Error, Debug)]
pub enum HookError {
    /// Free-form failure reported by a behaviour
    #[error("{0}")]
    Custom(String),

    /// A reference field did not resolve to a live object
    #[error("reference `{0}` does not resolve to a live object")]
    UnresolvedReference(&'static str),

    /// A component the behaviour depends on is missing
    #[error("missing component: {0}")]
    MissingComponent(&'static str),
}

/// Violations of the tree shape
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// The new parent lies inside the entity's own subtree
    #[error("cannot parent `{0}` under itself or one of its descendants")]
    CyclicParent(String),

    /// `attach` was called on an entity that already has a parent
    #[error("entity `{0}` already has a parent")]
    AlreadyAttached(String),

    /// `set_parent` was called on an entity that has no parent yet
    #[error("entity `{0}` has no parent; attach it first")]
    NotAttached(String),

    /// The operation is not allowed on the root entity
    #[error("the root entity cannot be {0}")]
    RootEntity(&'static str),

    /// The move would take a live entity out of the world tree without destroying it
    #[error("cannot move live entity `{0}` under a detached parent")]
    LeavesWorld(String),
}

/// World errors
#[derive(thiserror::Error, Debug)]
pub enum WorldError {
    /// The tree shape would be violated
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    /// No entity with this key is alive
    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// No component with this key is alive
    #[error("Component not found: {0:?}")]
    ComponentNotFound(ComponentId),

    /// A world invariant would be broken (for example a duplicate identity)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A lifecycle hook failed
    #[error("{hook} hook of `{component}` on `{entity}` failed: {source}")]
    Hook {
        /// Name of the owning entity
        entity: String,
        /// Type tag of the failing component
        component: &'static str,
        /// Which hook failed
        hook: HookKind,
        /// The hook's own error
        source: HookError,
    },

    /// The renderer rejected a draw
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl From<DuplicateIdentity> for WorldError {
    fn from(err: DuplicateIdentity) -> Self {
        Self::InvariantViolation(err.to_string())
    }
}
