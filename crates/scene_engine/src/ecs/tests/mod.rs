//! Integration tests for the world, hierarchy and scheduler

mod behaviours;

use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::{Behaviour, Component, HookContext, HookError, HookResult, World};
use crate::foundation::collections::EntityId;

/// Shared list of `label:hook` entries
pub(super) type EventLog = Rc<RefCell<Vec<String>>>;

pub(super) fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub(super) fn entries(log: &EventLog) -> Vec<String> {
    log.borrow().clone()
}

pub(super) fn entries_for(log: &EventLog, hook: &str) -> Vec<String> {
    log.borrow()
        .iter()
        .filter(|entry| entry.ends_with(&format!(":{hook}")))
        .cloned()
        .collect()
}

/// Behaviour that appends every hook it receives to a shared log
pub(super) struct Recorder {
    pub label: String,
    pub log: EventLog,
    /// Queue destruction of this entity from the first update
    pub destroy_on_update: Option<EntityId>,
    /// Create a child and queue attaching it under this entity from the first update
    pub spawn_under_on_update: Option<EntityId>,
    /// Fail the init hook this many times before succeeding
    pub failing_inits: u32,
}

impl Recorder {
    pub fn new(label: &str, log: &EventLog) -> Self {
        Self {
            label: label.to_string(),
            log: Rc::clone(log),
            destroy_on_update: None,
            spawn_under_on_update: None,
            failing_inits: 0,
        }
    }

    fn push(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{}:{hook}", self.label));
    }
}

impl Behaviour for Recorder {
    fn on_spawn(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        self.push("spawn");
        Ok(())
    }

    fn on_enable(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        self.push("enable");
        Ok(())
    }

    fn on_init(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        if self.failing_inits > 0 {
            self.failing_inits -= 1;
            return Err(HookError::Custom("not ready".to_string()));
        }
        self.push("init");
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        self.push("update");
        if let Some(target) = self.destroy_on_update.take() {
            ctx.destroy(target);
        }
        if let Some(parent) = self.spawn_under_on_update.take() {
            let child = ctx.create_entity(&format!("{} child", self.label));
            ctx.attach(child, parent);
        }
        Ok(())
    }

    fn on_render_finished(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        self.push("render_finished");
        Ok(())
    }

    fn on_disable(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        self.push("disable");
        Ok(())
    }

    fn on_destroy(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        self.push("destroy");
        Ok(())
    }
}

impl Component for Recorder {
    fn type_tag(&self) -> &'static str {
        "Recorder"
    }

    fn as_behaviour_mut(&mut self) -> Option<&mut dyn Behaviour> {
        Some(self)
    }
}

/// Spawn `name` under `parent` carrying a recorder labelled `name`
pub(super) fn spawn_recorded(world: &mut World, name: &str, parent: EntityId, log: &EventLog) -> EntityId {
    let entity = world.spawn(name, parent).unwrap();
    world.insert_component(entity, Recorder::new(name, log)).unwrap();
    entity
}
