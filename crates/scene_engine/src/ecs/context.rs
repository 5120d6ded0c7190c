//! What a lifecycle hook can see and do
//!
//! Hooks run in the middle of a traversal, so structural edits are queued as
//! [`Command`]s and applied by the world between phases. Transform writes
//! and plain data edits on other components apply immediately.

use std::any::Any;

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::time::GameTime;
use crate::input::InputProvider;

use super::component::Component;
use super::reference::{ComponentRef, EntityRef};
use super::transform::{TransformMut, TransformView};
use super::World;

/// Deferred structural edit
pub(crate) enum Command {
    Destroy(EntityId),
    Attach { entity: EntityId, parent: EntityId },
    SetParent { entity: EntityId, parent: EntityId },
    SetActive { entity: EntityId, active: bool },
    SetEnabled { component: ComponentId, enabled: bool },
    AddComponent { entity: EntityId, component: Box<dyn Component> },
    RemoveComponent(ComponentId),
}

/// Handle passed to every lifecycle hook
pub struct HookContext<'w> {
    world: &'w mut World,
    entity: EntityId,
    component: ComponentId,
}

impl<'w> HookContext<'w> {
    pub(crate) fn new(world: &'w mut World, entity: EntityId, component: ComponentId) -> Self {
        Self { world, entity, component }
    }

    /// Entity owning the running component
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Key of the running component
    #[must_use]
    pub const fn component_id(&self) -> ComponentId {
        self.component
    }

    /// Read access to the whole world
    #[must_use]
    pub fn world(&self) -> &World {
        self.world
    }

    /// Frame clock
    #[must_use]
    pub fn time(&self) -> &GameTime {
        &self.world.time
    }

    /// Scaled frame delta, in seconds
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        self.world.time.delta_time()
    }

    /// Input state for this frame
    #[must_use]
    pub fn input(&self) -> &dyn InputProvider {
        self.world.input.as_ref()
    }

    /// Own entity's transform
    #[must_use]
    pub fn transform(&self) -> TransformView<'_> {
        TransformView::new(self.world, self.entity)
    }

    /// Own entity's transform, writable
    pub fn transform_mut(&mut self) -> TransformMut<'_> {
        TransformMut::new(self.world, self.entity)
    }

    /// Another entity's transform
    #[must_use]
    pub fn transform_of(&self, entity: EntityId) -> Option<TransformView<'_>> {
        self.world.transform(entity)
    }

    /// Another entity's transform, writable
    pub fn transform_of_mut(&mut self, entity: EntityId) -> Option<TransformMut<'_>> {
        self.world.transform_mut(entity).ok()
    }

    /// Resolve an entity reference through the identity table
    #[must_use]
    pub fn resolve_entity(&self, reference: &EntityRef) -> Option<EntityId> {
        reference.resolve(self.world)
    }

    /// Resolve a component reference through the identity table
    #[must_use]
    pub fn resolve_component(&self, reference: &ComponentRef) -> Option<ComponentId> {
        reference.resolve(self.world)
    }

    /// First component of kind `K` on `entity`
    #[must_use]
    pub fn get_component<K: Any>(&self, entity: EntityId) -> Option<&K> {
        self.world.get_component::<K>(entity)
    }

    /// Mutable first component of kind `K` on `entity`
    pub fn get_component_mut<K: Any>(&mut self, entity: EntityId) -> Option<&mut K> {
        self.world.get_component_mut::<K>(entity)
    }

    /// Construct a detached entity right away; attach it with [`HookContext::attach`]
    ///
    /// If the parent is gone by the time the queued attach runs, the entity
    /// and its detached subtree are discarded.
    pub fn create_entity(&mut self, name: &str) -> EntityId {
        self.world.create_entity(name)
    }

    /// Queue destruction of an entity and its subtree
    pub fn destroy(&mut self, entity: EntityId) {
        self.world.commands.push_back(Command::Destroy(entity));
    }

    /// Queue attaching a detached entity
    pub fn attach(&mut self, entity: EntityId, parent: EntityId) {
        self.world.commands.push_back(Command::Attach { entity, parent });
    }

    /// Queue a reparent
    pub fn set_parent(&mut self, entity: EntityId, parent: EntityId) {
        self.world.commands.push_back(Command::SetParent { entity, parent });
    }

    /// Queue an active-flag change
    pub fn set_active(&mut self, entity: EntityId, active: bool) {
        self.world.commands.push_back(Command::SetActive { entity, active });
    }

    /// Queue an enabled-flag change on a component
    pub fn set_component_enabled(&mut self, component: ComponentId, enabled: bool) {
        self.world.commands.push_back(Command::SetEnabled { component, enabled });
    }

    /// Queue adding a default `K` to `entity`
    pub fn add_component<K: Component + Default>(&mut self, entity: EntityId) {
        self.world.commands.push_back(Command::AddComponent {
            entity,
            component: Box::new(K::default()),
        });
    }

    /// Queue removal of a component
    pub fn remove_component(&mut self, component: ComponentId) {
        self.world.commands.push_back(Command::RemoveComponent(component));
    }
}
