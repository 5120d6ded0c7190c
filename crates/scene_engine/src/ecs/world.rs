//! The world: arenas, identity table and component access
//!
//! A [`World`] is an explicit value. It owns the root entity, the entity and
//! component arenas, the identity table, the queue of deferred structural
//! commands, the frame clock and the input provider. Tree edits live in
//! `hierarchy.rs`, the frame scheduler in `scheduler.rs`.

use std::any::{Any, TypeId};
use std::collections::VecDeque;

use log::debug;

use crate::config::WorldConfig;
use crate::foundation::collections::{ComponentId, EntityId, SlotMap};
use crate::foundation::identity::{Identity, IdentityTable, ObjectKey};
use crate::foundation::math::Pose;
use crate::foundation::time::GameTime;
use crate::input::{InputProvider, NoInput};

use super::component::{Component, ComponentSlot, LifecycleState};
use super::context::Command;
use super::entity::Entity;
use super::error::{StructuralError, WorldError};
use super::hierarchy::Traversal;

/// Name given to the root entity of a fresh world
pub const ROOT_NAME: &str = "Root";

/// Scheduling context owning a live entity tree
pub struct World {
    pub(crate) entities: SlotMap<EntityId, Entity>,
    pub(crate) components: SlotMap<ComponentId, ComponentSlot>,
    pub(crate) identities: IdentityTable,
    pub(crate) root: EntityId,
    pub(crate) commands: VecDeque<Command>,
    pub(crate) time: GameTime,
    pub(crate) input: Box<dyn InputProvider>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a world holding only a root entity
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(Identity::new(), ROOT_NAME)
    }

    /// Create a world whose clock follows `config`
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        let mut world = Self::new();
        world.time = GameTime::new(config.time_scale, config.max_delta_time);
        world
    }

    /// Create a world whose root carries the given identity and name
    #[must_use]
    pub fn with_root(identity: Identity, name: &str) -> Self {
        let mut entities = SlotMap::with_key();
        let root = entities.insert(Entity::new(identity, name, Pose::identity()));
        let mut identities = IdentityTable::new();
        let registered = identities.register(identity, ObjectKey::Entity(root));
        debug_assert!(registered.is_ok(), "an empty identity table cannot collide");
        Self {
            entities,
            components: SlotMap::with_key(),
            identities,
            root,
            commands: VecDeque::new(),
            time: GameTime::default(),
            input: Box::new(NoInput),
        }
    }

    /// The root entity
    #[must_use]
    pub const fn root(&self) -> EntityId {
        self.root
    }

    /// Frame clock
    #[must_use]
    pub const fn time(&self) -> &GameTime {
        &self.time
    }

    /// Mutable frame clock, for changing the time scale
    pub fn time_mut(&mut self) -> &mut GameTime {
        &mut self.time
    }

    /// Current input provider
    #[must_use]
    pub fn input(&self) -> &dyn InputProvider {
        self.input.as_ref()
    }

    /// Replace the input provider
    pub fn set_input_provider(&mut self, input: Box<dyn InputProvider>) {
        self.input = input;
    }

    /// World-scoped identity table
    #[must_use]
    pub const fn identities(&self) -> &IdentityTable {
        &self.identities
    }

    /// Resolve an identity to a live entity
    #[must_use]
    pub fn resolve_entity(&self, identity: &Identity) -> Option<EntityId> {
        self.identities.resolve_entity(identity)
    }

    /// Resolve an identity to a live component
    #[must_use]
    pub fn resolve_component(&self, identity: &Identity) -> Option<ComponentId> {
        self.identities.resolve_component(identity)
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    /// Construct a detached entity with a fresh identity
    pub fn create_entity(&mut self, name: &str) -> EntityId {
        let identity = Identity::new();
        let id = self.entities.insert(Entity::new(identity, name, Pose::identity()));
        let registered = self.identities.register(identity, ObjectKey::Entity(id));
        debug_assert!(registered.is_ok(), "fresh identity {identity} collided");
        debug!("Created entity `{name}` ({identity})");
        id
    }

    /// Construct a detached entity with a known identity
    pub fn create_entity_with_identity(&mut self, name: &str, identity: Identity) -> Result<EntityId, WorldError> {
        if self.identities.contains(&identity) {
            return Err(WorldError::InvariantViolation(format!(
                "identity {identity} is already registered"
            )));
        }
        let id = self.entities.insert(Entity::new(identity, name, Pose::identity()));
        self.identities.register(identity, ObjectKey::Entity(id))?;
        Ok(id)
    }

    /// Construct an entity and attach it under `parent` in one step
    pub fn spawn(&mut self, name: &str, parent: EntityId) -> Result<EntityId, WorldError> {
        let id = self.create_entity(name);
        if let Err(err) = self.attach(id, parent) {
            self.discard_detached(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Borrow an entity
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Whether the entity is alive
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of live entities, root and detached ones included
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live components
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Name of an entity, or an empty string if it is gone
    #[must_use]
    pub fn name_of(&self, id: EntityId) -> &str {
        self.entities.get(id).map_or("", |node| node.name.as_str())
    }

    /// Rename an entity
    pub fn set_name(&mut self, id: EntityId, name: &str) -> Result<(), WorldError> {
        let node = self.entities.get_mut(id).ok_or(WorldError::EntityNotFound(id))?;
        node.name = name.to_string();
        Ok(())
    }

    /// First entity with this name, depth-first from the root
    #[must_use]
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.descendants(self.root, Traversal::All)
            .into_iter()
            .find(|id| self.name_of(*id) == name)
    }

    /// First component of kind `K` anywhere in the tree, depth-first from the root
    #[must_use]
    pub fn find_component<K: Any>(&self) -> Option<(EntityId, &K)> {
        self.descendants(self.root, Traversal::All)
            .into_iter()
            .find_map(|id| self.get_component::<K>(id).map(|component| (id, component)))
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Construct a default `K`, append it to `entity` and return it
    pub fn add_component<K: Component + Default>(&mut self, entity: EntityId) -> Result<&mut K, WorldError> {
        let id = self.insert_component(entity, K::default())?;
        self.components
            .get_mut(id)
            .and_then(ComponentSlot::downcast_mut::<K>)
            .ok_or(WorldError::ComponentNotFound(id))
    }

    /// Append an already-configured component to `entity`
    pub fn insert_component<K: Component>(&mut self, entity: EntityId, component: K) -> Result<ComponentId, WorldError> {
        self.insert_boxed_component(entity, Box::new(component), Identity::new(), true)
    }

    /// Append a boxed component with a known identity and enabled flag
    pub fn insert_boxed_component(
        &mut self,
        entity: EntityId,
        component: Box<dyn Component>,
        identity: Identity,
        enabled: bool,
    ) -> Result<ComponentId, WorldError> {
        if entity == self.root {
            return Err(StructuralError::RootEntity("given components").into());
        }
        if !self.entities.contains_key(entity) {
            return Err(WorldError::EntityNotFound(entity));
        }
        if self.identities.contains(&identity) {
            return Err(WorldError::InvariantViolation(format!(
                "identity {identity} is already registered"
            )));
        }
        let tag = component.type_tag();
        let id = self.components.insert(ComponentSlot::new(entity, identity, enabled, component));
        self.identities.register(identity, ObjectKey::Component(id))?;
        if let Some(node) = self.entities.get_mut(entity) {
            node.components.push(id);
        }
        debug!("Added `{tag}` to `{}`", self.name_of(entity));
        Ok(id)
    }

    /// Component slot by key
    #[must_use]
    pub fn component_slot(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.components.get(id)
    }

    /// Lifecycle state of a component
    #[must_use]
    pub fn component_state(&self, id: ComponentId) -> Option<LifecycleState> {
        self.components.get(id).map(ComponentSlot::state)
    }

    /// Component by key, viewed as kind `K`
    #[must_use]
    pub fn component<K: Any>(&self, id: ComponentId) -> Option<&K> {
        self.components.get(id)?.downcast::<K>()
    }

    /// Mutable component by key, viewed as kind `K`
    pub fn component_mut<K: Any>(&mut self, id: ComponentId) -> Option<&mut K> {
        self.components.get_mut(id)?.downcast_mut::<K>()
    }

    /// Keys of the components of `entity`, in insertion order
    #[must_use]
    pub fn component_ids(&self, entity: EntityId) -> Vec<ComponentId> {
        self.entities
            .get(entity)
            .map(|node| node.components.clone())
            .unwrap_or_default()
    }

    /// Key of the first component of `entity` matching `K`
    #[must_use]
    pub fn component_id<K: Any>(&self, entity: EntityId) -> Option<ComponentId> {
        self.component_ids_of::<K>(entity).next()
    }

    fn component_ids_of<K: Any>(&self, entity: EntityId) -> impl Iterator<Item = ComponentId> + '_ {
        let kind = TypeId::of::<K>();
        self.entities
            .get(entity)
            .into_iter()
            .flat_map(|node| node.components.iter().copied())
            .filter(move |id| self.components.get(*id).is_some_and(|slot| slot.matches(kind)))
    }

    /// First component of `entity` matching `K`, in insertion order
    #[must_use]
    pub fn get_component<K: Any>(&self, entity: EntityId) -> Option<&K> {
        let id = self.component_id::<K>(entity)?;
        self.component::<K>(id)
    }

    /// Mutable counterpart of [`World::get_component`]
    pub fn get_component_mut<K: Any>(&mut self, entity: EntityId) -> Option<&mut K> {
        let id = self.component_id::<K>(entity)?;
        self.component_mut::<K>(id)
    }

    /// Every component of `entity` matching `K`, in insertion order
    #[must_use]
    pub fn get_components<K: Any>(&self, entity: EntityId) -> Vec<&K> {
        self.component_ids_of::<K>(entity)
            .filter_map(|id| self.component::<K>(id))
            .collect()
    }

    /// Remove the first component of `entity` matching `K`
    ///
    /// Returns `false` when nothing matched.
    pub fn remove_component<K: Any>(&mut self, entity: EntityId) -> Result<bool, WorldError> {
        if !self.entities.contains_key(entity) {
            return Err(WorldError::EntityNotFound(entity));
        }
        match self.component_id::<K>(entity) {
            Some(id) => self.remove_component_by_id(id).map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove a component by key, running its disable and destroy hooks first
    pub fn remove_component_by_id(&mut self, id: ComponentId) -> Result<(), WorldError> {
        let slot = self.components.get(id).ok_or(WorldError::ComponentNotFound(id))?;
        let owner = slot.owner;
        let mut result = Ok(());
        if slot.state.is_enabled() {
            result = self.transition(id, super::HookKind::Disable);
        }
        if self.components.get(id).is_some_and(|slot| slot.state.has_spawned()) {
            let destroyed = self.transition(id, super::HookKind::Destroy);
            result = result.and(destroyed);
        }
        if let Some(node) = self.entities.get_mut(owner) {
            node.components.retain(|component| *component != id);
        }
        if let Some(slot) = self.components.remove(id) {
            self.identities.unregister(&slot.identity);
            debug!("Removed `{}` from `{}`", slot.type_tag, self.name_of(owner));
        }
        result
    }

    /// Drop a detached subtree that never reached the tree
    pub(super) fn discard_detached(&mut self, id: EntityId) {
        if let Some(node) = self.entities.remove(id) {
            self.identities.unregister(&node.identity);
            for component in node.components {
                if let Some(slot) = self.components.remove(component) {
                    self.identities.unregister(&slot.identity);
                }
            }
            for child in node.children {
                self.discard_detached(child);
            }
        }
    }
}
