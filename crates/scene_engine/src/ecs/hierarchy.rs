//! Tree edits: attach, reparent, activate and destroy

use std::collections::HashSet;

use log::{debug, info};

use crate::foundation::collections::EntityId;

use super::error::{HookKind, StructuralError, WorldError};
use super::World;

/// Depth-first traversal discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Skip the whole subtree below an inactive entity
    ActiveOnly,
    /// Visit every node regardless of the active flag
    All,
}

impl World {
    /// Pre-order list of `start` and its descendants
    ///
    /// With [`Traversal::ActiveOnly`] the list is empty when `start` itself
    /// is inactive; ancestors of `start` are not consulted.
    #[must_use]
    pub fn descendants(&self, start: EntityId, traversal: Traversal) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.entities.get(id) else { continue };
            if traversal == Traversal::ActiveOnly && !node.active {
                continue;
            }
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Whether `entity` is the root or hangs below it
    #[must_use]
    pub fn is_in_world(&self, entity: EntityId) -> bool {
        self.topmost_ancestor(entity) == Some(self.root)
    }

    /// Whether `entity` and all of its ancestors are active
    #[must_use]
    pub fn is_active_in_hierarchy(&self, entity: EntityId) -> bool {
        let mut cursor = Some(entity);
        while let Some(id) = cursor {
            match self.entities.get(id) {
                Some(node) if node.active => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Whether `entity` equals `ancestor` or lies below it
    #[must_use]
    pub fn is_descendant_of(&self, entity: EntityId, ancestor: EntityId) -> bool {
        let mut cursor = Some(entity);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.entities.get(id).and_then(|node| node.parent);
        }
        false
    }

    fn topmost_ancestor(&self, entity: EntityId) -> Option<EntityId> {
        let mut current = entity;
        loop {
            let node = self.entities.get(current)?;
            match node.parent {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
    }

    fn require(&self, entity: EntityId) -> Result<(), WorldError> {
        if self.entities.contains_key(entity) {
            Ok(())
        } else {
            Err(WorldError::EntityNotFound(entity))
        }
    }

    fn link(&mut self, entity: EntityId, parent: EntityId) {
        if let Some(node) = self.entities.get_mut(entity) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.entities.get_mut(parent) {
            node.children.push(entity);
        }
        self.mark_subtree_dirty(entity);
    }

    fn unlink(&mut self, entity: EntityId) {
        let parent = self.entities.get_mut(entity).and_then(|node| node.parent.take());
        if let Some(node) = parent.and_then(|parent| self.entities.get_mut(parent)) {
            node.children.retain(|child| *child != entity);
        }
        self.mark_subtree_dirty(entity);
    }

    fn check_new_parent(&self, entity: EntityId, parent: EntityId) -> Result<(), WorldError> {
        if entity == self.root {
            return Err(StructuralError::RootEntity("reparented").into());
        }
        self.require(entity)?;
        self.require(parent)?;
        if self.is_descendant_of(parent, entity) {
            return Err(StructuralError::CyclicParent(self.name_of(entity).to_string()).into());
        }
        Ok(())
    }

    /// Attach a detached entity (and its subtree) under `parent`
    ///
    /// The local pose is kept. When `parent` is part of the world, the
    /// subtree is spawned and enabled before this returns.
    pub fn attach(&mut self, entity: EntityId, parent: EntityId) -> Result<(), WorldError> {
        self.check_new_parent(entity, parent)?;
        if self.entities.get(entity).and_then(|node| node.parent).is_some() {
            return Err(StructuralError::AlreadyAttached(self.name_of(entity).to_string()).into());
        }
        self.link(entity, parent);
        debug!("Attached `{}` under `{}`", self.name_of(entity), self.name_of(parent));
        if self.is_in_world(parent) {
            self.run_attach_hooks(&[entity])?;
        }
        Ok(())
    }

    /// Attach several detached subtrees under `parent` as one batch
    ///
    /// Every subtree is linked first; when `parent` is part of the world all
    /// of them are spawned before any of them is enabled.
    pub fn attach_all(&mut self, entities: &[EntityId], parent: EntityId) -> Result<(), WorldError> {
        let mut batch = HashSet::with_capacity(entities.len());
        for entity in entities {
            self.check_new_parent(*entity, parent)?;
            let attached = self.entities.get(*entity).and_then(|node| node.parent).is_some();
            if attached || !batch.insert(*entity) {
                return Err(StructuralError::AlreadyAttached(self.name_of(*entity).to_string()).into());
            }
        }
        for entity in entities {
            self.link(*entity, parent);
        }
        debug!("Attached {} subtrees under `{}`", entities.len(), self.name_of(parent));
        if self.is_in_world(parent) {
            self.run_attach_hooks(entities)?;
        }
        Ok(())
    }

    /// Move an attached entity under a new parent, preserving its world pose
    ///
    /// Moving a subtree from a detached hierarchy into the world spawns it.
    /// Moving a live entity under a detached parent is rejected.
    pub fn set_parent(&mut self, entity: EntityId, parent: EntityId) -> Result<(), WorldError> {
        self.check_new_parent(entity, parent)?;
        let Some(old_parent) = self.entities.get(entity).and_then(|node| node.parent) else {
            return Err(StructuralError::NotAttached(self.name_of(entity).to_string()).into());
        };
        if old_parent == parent {
            return Ok(());
        }
        let was_live = self.is_in_world(entity);
        let will_live = self.is_in_world(parent);
        if was_live && !will_live {
            return Err(StructuralError::LeavesWorld(self.name_of(entity).to_string()).into());
        }

        let world_pose = self.world_state(entity).pose;
        self.unlink(entity);
        self.link(entity, parent);
        let local = self.parent_state(entity).local_pose_of(&world_pose);
        self.transform_mut(entity)?.set_local_pose(local);
        debug!("Reparented `{}` under `{}`", self.name_of(entity), self.name_of(parent));

        if will_live && !was_live {
            self.run_attach_hooks(&[entity])?;
        }
        Ok(())
    }

    /// Set an entity's own active flag
    ///
    /// Only gates traversal: inactive subtrees receive no hooks. Behaviours
    /// that have not been spawned or enabled yet catch up on the next frame
    /// after the subtree becomes active again.
    pub fn set_active(&mut self, entity: EntityId, active: bool) -> Result<(), WorldError> {
        if entity == self.root && !active {
            return Err(StructuralError::RootEntity("deactivated").into());
        }
        let node = self.entities.get_mut(entity).ok_or(WorldError::EntityNotFound(entity))?;
        if node.active != active {
            node.active = active;
            debug!("Set `{}` active = {active}", node.name);
        }
        Ok(())
    }

    /// Destroy an entity and its subtree
    ///
    /// Live subtrees first receive disable hooks on every enabled behaviour
    /// of the active part, then destroy hooks on every spawned behaviour.
    /// The subtree is unlinked, dropped and its identities purged even if a
    /// hook fails; the first hook error is returned.
    pub fn destroy(&mut self, entity: EntityId) -> Result<(), WorldError> {
        if entity == self.root {
            return Err(StructuralError::RootEntity("destroyed").into());
        }
        self.require(entity)?;

        let mut result = Ok(());
        if self.is_in_world(entity) {
            if self.is_active_in_hierarchy(entity) {
                for id in self.descendants(entity, Traversal::ActiveOnly) {
                    for component in self.component_ids(id) {
                        if self.components.get(component).is_some_and(|slot| slot.state.is_enabled()) {
                            result = result.and(self.transition(component, HookKind::Disable));
                        }
                    }
                }
            }
            for id in self.descendants(entity, Traversal::All) {
                for component in self.component_ids(id) {
                    if self.components.get(component).is_some_and(|slot| slot.state.has_spawned()) {
                        result = result.and(self.transition(component, HookKind::Destroy));
                    }
                }
            }
        }

        let doomed = self.descendants(entity, Traversal::All);
        self.unlink(entity);
        for id in &doomed {
            if let Some(node) = self.entities.remove(*id) {
                self.identities.unregister(&node.identity);
                for component in node.components {
                    if let Some(slot) = self.components.remove(component) {
                        self.identities.unregister(&slot.identity);
                    }
                }
            }
        }
        debug!("Destroyed {} entities", doomed.len());
        result
    }

    /// Tear down everything below the root
    pub fn destroy_all(&mut self) -> Result<(), WorldError> {
        let children = self
            .entities
            .get(self.root)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        let mut result = Ok(());
        for child in children {
            result = result.and(self.destroy(child));
        }
        self.commands.clear();
        info!("World torn down; {} detached entities remain", self.entities.len() - 1);
        result
    }
}
