//! Arena keys and specialized collection types
//!
//! Entities and components live in slot maps; every link between them
//! (parent, children, owner) is stored as one of these keys.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Arena key of an entity inside a [`World`](crate::ecs::World)
    pub struct EntityId;

    /// Arena key of a component slot inside a [`World`](crate::ecs::World)
    pub struct ComponentId;
}
