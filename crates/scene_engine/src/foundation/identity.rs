//! Stable identities for persistable objects
//!
//! Every entity and component carries an [`Identity`] assigned at
//! construction. Persisted references point at identities, never at arena
//! keys, so they survive save/load cycles. The [`IdentityTable`] is the
//! world-scoped map from identity to live object.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::collections::{ComponentId, EntityId};

/// A globally unique, immutable identifier for a persistable object
///
/// Serialized as the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
    /// Creates a new, random (version 4) identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Identity {
    /// Creates a new, random (version 4) identity.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for Identity {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What an identity resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKey {
    /// A live entity
    Entity(EntityId),
    /// A live component
    Component(ComponentId),
}

/// Error returned when an identity is registered twice
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("identity {0} is already registered")]
pub struct DuplicateIdentity(pub Identity);

/// World-scoped map from identity to live object
#[derive(Debug, Default)]
pub struct IdentityTable {
    entries: HashMap<Identity, ObjectKey>,
}

impl IdentityTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity; fails if it is already present
    pub fn register(&mut self, identity: Identity, key: ObjectKey) -> Result<(), DuplicateIdentity> {
        match self.entries.entry(identity) {
            std::collections::hash_map::Entry::Occupied(_) => Err(DuplicateIdentity(identity)),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(key);
                Ok(())
            }
        }
    }

    /// Remove an identity, returning what it pointed at
    pub fn unregister(&mut self, identity: &Identity) -> Option<ObjectKey> {
        self.entries.remove(identity)
    }

    /// Look up an identity
    #[must_use]
    pub fn resolve(&self, identity: &Identity) -> Option<ObjectKey> {
        self.entries.get(identity).copied()
    }

    /// Look up an identity that must name an entity
    #[must_use]
    pub fn resolve_entity(&self, identity: &Identity) -> Option<EntityId> {
        match self.resolve(identity)? {
            ObjectKey::Entity(id) => Some(id),
            ObjectKey::Component(_) => None,
        }
    }

    /// Look up an identity that must name a component
    #[must_use]
    pub fn resolve_component(&self, identity: &Identity) -> Option<ComponentId> {
        match self.resolve(identity)? {
            ObjectKey::Component(id) => Some(id),
            ObjectKey::Entity(_) => None,
        }
    }

    /// Whether the identity is registered
    #[must_use]
    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Number of registered identities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_identity_string_round_trip() {
        let identity = Identity::new();
        let text = identity.to_string();
        let parsed: Identity = text.parse().expect("identity should parse");
        assert_eq!(identity, parsed);
    }

    #[test]
    fn test_identity_serializes_as_plain_string() {
        let identity = Identity::new();
        let text = ron::to_string(&identity).expect("serialize");
        assert_eq!(text, format!("\"{identity}\""));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut arena: SlotMap<EntityId, ()> = SlotMap::with_key();
        let first = arena.insert(());
        let second = arena.insert(());

        let mut table = IdentityTable::new();
        let identity = Identity::new();
        table.register(identity, ObjectKey::Entity(first)).expect("first registration");
        assert_eq!(
            table.register(identity, ObjectKey::Entity(second)),
            Err(DuplicateIdentity(identity))
        );
        assert_eq!(table.resolve_entity(&identity), Some(first));
        assert_eq!(table.resolve_component(&identity), None);
    }

    #[test]
    fn test_unregister_purges_entry() {
        let mut arena: SlotMap<ComponentId, ()> = SlotMap::with_key();
        let key = arena.insert(());

        let mut table = IdentityTable::new();
        let identity = Identity::new();
        table.register(identity, ObjectKey::Component(key)).expect("registration");
        assert_eq!(table.unregister(&identity), Some(ObjectKey::Component(key)));
        assert!(!table.contains(&identity));
        assert!(table.is_empty());
    }
}
