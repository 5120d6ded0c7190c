//! Scene-graph entity system
//!
//! Entities form a tree rooted at the world's root entity. Each entity owns a
//! transform and an ordered list of components; behaviours among those
//! components receive lifecycle hooks from the world's scheduler.

pub mod world;
pub mod entity;
pub mod transform;
pub mod component;
pub mod context;
pub mod reference;
pub mod hierarchy;
pub mod scheduler;
pub mod error;
pub mod components;

#[cfg(test)]
mod tests;

pub use world::World;
pub use entity::Entity;
pub use transform::{Transform, TransformMut, TransformView, WorldState};
pub use component::{AsAny, Behaviour, Component, ComponentSlot, HookResult, LifecycleState};
pub use context::HookContext;
pub use reference::{ComponentRef, EntityRef};
pub use hierarchy::Traversal;
pub use error::{HookError, HookKind, StructuralError, WorldError};
