//! Per-frame lifecycle scheduling
//!
//! Frame order: transform refresh, then one active-filtered traversal that
//! spawns, enables, initializes or updates each behaviour (one step per
//! frame), then render, then render-finished. Queued structural commands
//! are flushed between phases.

use log::{debug, trace};

use crate::foundation::collections::{ComponentId, EntityId};
use crate::render::{self, DrawCall, Renderer};

use super::component::LifecycleState;
use super::components::MeshRenderer;
use super::context::{Command, HookContext};
use super::error::{HookKind, WorldError};
use super::hierarchy::Traversal;
use super::World;

impl World {
    /// Advance the clock and run the update phase
    ///
    /// Hook failures abort the phase and are returned; commands queued before
    /// the failure stay queued for the next boundary.
    pub fn update(&mut self, delta_time: f32) -> Result<(), WorldError> {
        self.time.advance(delta_time);
        self.input.begin_frame();
        self.flush_commands()?;
        self.refresh_transforms();

        for entity in self.frame_order() {
            for component in self.component_ids(entity) {
                if let Some(hook) = self.next_frame_hook(component) {
                    self.transition(component, hook)?;
                }
            }
        }

        self.flush_commands()
    }

    /// Submit every visible mesh, then run the render-finished phase
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> Result<(), WorldError> {
        self.flush_commands()?;
        self.refresh_transforms();
        let order = self.frame_order();

        let frame = render::frame_context(self, &order, renderer.aspect_ratio());
        renderer.begin_frame(&frame)?;
        for entity in &order {
            for component in self.component_ids(*entity) {
                if !self.is_running(component) {
                    continue;
                }
                if let Some(mesh) = self.component::<MeshRenderer>(component) {
                    let call = DrawCall {
                        entity: *entity,
                        world_matrix: self.world_state(*entity).matrix,
                        params: mesh.draw_params(),
                    };
                    renderer.draw(&call)?;
                }
            }
        }
        renderer.end_frame()?;

        for entity in order {
            for component in self.component_ids(entity) {
                if self.is_running(component) {
                    self.transition(component, HookKind::RenderFinished)?;
                }
            }
        }

        self.flush_commands()
    }

    /// One full frame: update followed by render
    pub fn frame(&mut self, delta_time: f32, renderer: &mut dyn Renderer) -> Result<(), WorldError> {
        self.update(delta_time)?;
        self.render(renderer)
    }

    /// Change a component's enabled flag
    ///
    /// Turning a live enabled behaviour off runs its disable hook; turning it
    /// back on inside an active hierarchy runs its enable hook. Otherwise
    /// only the flag changes and the next frame catches up.
    pub fn set_component_enabled(&mut self, component: ComponentId, enabled: bool) -> Result<(), WorldError> {
        let slot = self.components.get_mut(component).ok_or(WorldError::ComponentNotFound(component))?;
        if slot.enabled == enabled {
            return Ok(());
        }
        slot.enabled = enabled;
        let state = slot.state;
        let owner = slot.owner;

        if !enabled && state.is_enabled() {
            self.transition(component, HookKind::Disable)?;
        } else if enabled
            && matches!(state, LifecycleState::Spawned | LifecycleState::Disabled)
            && self.is_in_world(owner)
            && self.is_active_in_hierarchy(owner)
        {
            self.transition(component, HookKind::Enable)?;
        }
        Ok(())
    }

    /// Apply queued structural commands until the queue is empty
    pub fn flush_commands(&mut self) -> Result<(), WorldError> {
        while let Some(command) = self.commands.pop_front() {
            self.apply(command)?;
        }
        Ok(())
    }

    /// Number of commands waiting for the next boundary
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    fn apply(&mut self, command: Command) -> Result<(), WorldError> {
        match command {
            Command::Destroy(entity) => {
                if self.contains(entity) {
                    return self.destroy(entity);
                }
                debug!("Skipping queued destroy of a dead entity");
            }
            Command::Attach { entity, parent } => {
                if self.contains(entity) && self.contains(parent) {
                    return self.attach(entity, parent);
                }
                let detached = entity != self.root
                    && self.entities.get(entity).is_some_and(|node| node.parent.is_none());
                if detached {
                    debug!("Discarding `{}`: its queued parent is gone", self.name_of(entity));
                    self.discard_detached(entity);
                } else {
                    debug!("Skipping queued attach involving a dead entity");
                }
            }
            Command::SetParent { entity, parent } => {
                if self.contains(entity) && self.contains(parent) {
                    return self.set_parent(entity, parent);
                }
                debug!("Skipping queued reparent involving a dead entity");
            }
            Command::SetActive { entity, active } => {
                if self.contains(entity) {
                    return self.set_active(entity, active);
                }
            }
            Command::SetEnabled { component, enabled } => {
                if self.components.contains_key(component) {
                    return self.set_component_enabled(component, enabled);
                }
            }
            Command::AddComponent { entity, component } => {
                if self.contains(entity) {
                    return self
                        .insert_boxed_component(entity, component, crate::foundation::identity::Identity::new(), true)
                        .map(|_| ());
                }
                debug!("Skipping queued component for a dead entity");
            }
            Command::RemoveComponent(component) => {
                if self.components.contains_key(component) {
                    return self.remove_component_by_id(component);
                }
            }
        }
        Ok(())
    }

    /// Spawn every behaviour of newly attached subtrees, then enable the active part
    ///
    /// All subtrees finish spawning before any of them is enabled.
    pub(crate) fn run_attach_hooks(&mut self, roots: &[EntityId]) -> Result<(), WorldError> {
        for root in roots {
            for id in self.descendants(*root, Traversal::All) {
                for component in self.component_ids(id) {
                    if self.component_state(component) == Some(LifecycleState::Unspawned) {
                        self.transition(component, HookKind::Spawn)?;
                    }
                }
            }
        }
        for root in roots {
            if !self.contains(*root) || !self.is_active_in_hierarchy(*root) {
                continue;
            }
            for id in self.descendants(*root, Traversal::ActiveOnly) {
                for component in self.component_ids(id) {
                    let ready = self.components.get(component).is_some_and(|slot| {
                        slot.enabled && matches!(slot.state, LifecycleState::Spawned | LifecycleState::Disabled)
                    });
                    if ready {
                        self.transition(component, HookKind::Enable)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Active entities below the root, pre-order
    fn frame_order(&self) -> Vec<EntityId> {
        let mut order = self.descendants(self.root, Traversal::ActiveOnly);
        order.retain(|id| *id != self.root);
        order
    }

    fn next_frame_hook(&self, component: ComponentId) -> Option<HookKind> {
        let slot = self.components.get(component)?;
        match slot.state {
            LifecycleState::Unspawned => Some(HookKind::Spawn),
            LifecycleState::Spawned | LifecycleState::Disabled if slot.enabled => Some(HookKind::Enable),
            LifecycleState::Enabled => Some(HookKind::Init),
            LifecycleState::Running => Some(HookKind::Update),
            _ => None,
        }
    }

    fn is_running(&self, component: ComponentId) -> bool {
        self.components
            .get(component)
            .is_some_and(|slot| slot.enabled && slot.state == LifecycleState::Running)
    }

    /// Run one hook and advance the component's state when it succeeds
    pub(crate) fn transition(&mut self, component: ComponentId, hook: HookKind) -> Result<(), WorldError> {
        self.invoke(component, hook)?;
        if let Some(slot) = self.components.get_mut(component) {
            match hook {
                HookKind::Spawn => slot.state = LifecycleState::Spawned,
                HookKind::Enable => {
                    slot.state = if slot.initialized {
                        LifecycleState::Running
                    } else {
                        LifecycleState::Enabled
                    };
                }
                HookKind::Init => {
                    slot.initialized = true;
                    slot.state = LifecycleState::Running;
                }
                HookKind::Disable => slot.state = LifecycleState::Disabled,
                HookKind::Destroy => slot.state = LifecycleState::Destroyed,
                HookKind::Update | HookKind::RenderFinished => {}
            }
        }
        Ok(())
    }

    /// Take the component out of its slot, run the hook, put it back
    fn invoke(&mut self, component: ComponentId, hook: HookKind) -> Result<(), WorldError> {
        let Some(slot) = self.components.get_mut(component) else {
            return Err(WorldError::ComponentNotFound(component));
        };
        let owner = slot.owner;
        let tag = slot.type_tag;
        let Some(mut boxed) = slot.component.take() else {
            // The component's own hook is already on the stack.
            return Ok(());
        };

        trace!("{hook} `{tag}` on `{}`", self.name_of(owner));
        let result = match boxed.as_behaviour_mut() {
            Some(behaviour) => {
                let mut ctx = HookContext::new(self, owner, component);
                match hook {
                    HookKind::Spawn => behaviour.on_spawn(&mut ctx),
                    HookKind::Enable => behaviour.on_enable(&mut ctx),
                    HookKind::Init => behaviour.on_init(&mut ctx),
                    HookKind::Update => behaviour.on_update(&mut ctx),
                    HookKind::RenderFinished => behaviour.on_render_finished(&mut ctx),
                    HookKind::Disable => behaviour.on_disable(&mut ctx),
                    HookKind::Destroy => behaviour.on_destroy(&mut ctx),
                }
            }
            None => Ok(()),
        };

        if let Some(slot) = self.components.get_mut(component) {
            slot.component = Some(boxed);
        }
        result.map_err(|source| WorldError::Hook {
            entity: self.name_of(owner).to_string(),
            component: tag,
            hook,
            source,
        })
    }
}
