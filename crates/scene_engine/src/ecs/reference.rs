//! Identity-based references between persistable objects
//!
//! A reference stores only the target's [`Identity`]. It is resolved through
//! the world's identity table on every dereference, so a destroyed target
//! simply stops resolving.

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::identity::Identity;

use super::World;

/// Reference to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntityRef(Option<Identity>);

impl EntityRef {
    /// An unset reference
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Reference the object with this identity
    #[must_use]
    pub const fn to(identity: Identity) -> Self {
        Self(Some(identity))
    }

    /// Reference a live entity
    #[must_use]
    pub fn from_entity(world: &World, entity: EntityId) -> Self {
        Self(world.entity(entity).map(super::Entity::identity))
    }

    /// Target identity, if set
    #[must_use]
    pub const fn identity(&self) -> Option<Identity> {
        self.0
    }

    /// Whether a target is set
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Resolve to a live entity
    #[must_use]
    pub fn resolve(&self, world: &World) -> Option<EntityId> {
        world.resolve_entity(&self.0?)
    }
}

/// Reference to a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentRef(Option<Identity>);

impl ComponentRef {
    /// An unset reference
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Reference the object with this identity
    #[must_use]
    pub const fn to(identity: Identity) -> Self {
        Self(Some(identity))
    }

    /// Reference a live component
    #[must_use]
    pub fn from_component(world: &World, component: ComponentId) -> Self {
        Self(world.component_slot(component).map(super::ComponentSlot::identity))
    }

    /// Target identity, if set
    #[must_use]
    pub const fn identity(&self) -> Option<Identity> {
        self.0
    }

    /// Whether a target is set
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Resolve to a live component
    #[must_use]
    pub fn resolve(&self, world: &World) -> Option<ComponentId> {
        world.resolve_component(&self.0?)
    }
}
