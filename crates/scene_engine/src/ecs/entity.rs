//! Entity nodes of the scene tree

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::identity::Identity;
use crate::foundation::math::Pose;

use super::transform::Transform;

/// Tree node owning one transform and an ordered list of components
///
/// Parent, children and components are arena keys into the owning
/// [`World`](super::World).
#[derive(Debug)]
pub struct Entity {
    pub(crate) identity: Identity,
    pub(crate) name: String,
    pub(crate) active: bool,
    pub(crate) transform: Transform,
    pub(crate) components: Vec<ComponentId>,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
}

impl Entity {
    pub(crate) fn new(identity: Identity, name: impl Into<String>, local: Pose) -> Self {
        Self {
            identity,
            name: name.into(),
            active: true,
            transform: Transform::new(local),
            components: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Persistent identity
    #[must_use]
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own active flag; ancestors may still deactivate the entity
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The entity's transform
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Components in insertion order
    #[must_use]
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    /// Parent entity, `None` for the root and for detached entities
    #[must_use]
    pub const fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Children in order
    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }
}
