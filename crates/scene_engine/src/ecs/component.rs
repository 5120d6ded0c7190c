//! Component and behaviour abstractions
//!
//! Every component is stored as a `Box<dyn Component>` inside a
//! [`ComponentSlot`]. Behaviours are components that also take part in the
//! lifecycle state machine; they expose themselves through
//! [`Component::as_behaviour_mut`].

use std::any::{Any, TypeId};

use crate::foundation::collections::EntityId;
use crate::foundation::identity::Identity;

use super::context::HookContext;
use super::error::HookError;

/// Result type of every lifecycle hook
pub type HookResult = Result<(), HookError>;

/// Upcast helper implemented for every `'static` type
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Capability object owned by exactly one entity
pub trait Component: AsAny {
    /// Stable tag naming the concrete kind in diagnostics and scene files
    fn type_tag(&self) -> &'static str;

    /// View this component as `kind`, if it is that kind or embeds it
    ///
    /// The default matches only the concrete type. Components that embed a
    /// shared base (lights embed `BaseLight`) override this so lookups by the
    /// base kind find them too.
    fn as_kind(&self, kind: TypeId) -> Option<&dyn Any> {
        (kind == TypeId::of::<Self>()).then(|| self.as_any())
    }

    /// Mutable counterpart of [`Component::as_kind`]
    fn as_kind_mut(&mut self, kind: TypeId) -> Option<&mut dyn Any> {
        if kind == TypeId::of::<Self>() {
            Some(self.as_any_mut())
        } else {
            None
        }
    }

    /// Lifecycle hooks, for components that have any
    fn as_behaviour_mut(&mut self) -> Option<&mut dyn Behaviour> {
        None
    }
}

/// Ordered lifecycle hooks
///
/// All hooks default to doing nothing. Structural edits requested through
/// the [`HookContext`] are queued and applied after the current phase;
/// transform writes apply immediately.
pub trait Behaviour {
    /// Called once when the owning subtree is attached to the world
    fn on_spawn(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called whenever the behaviour becomes enabled in an active hierarchy
    fn on_enable(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called once, on the first frame after the first enable
    fn on_init(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called every frame once initialized
    fn on_update(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called after the render pass, with the same gating as update
    fn on_render_finished(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called when an enabled behaviour is disabled or destroyed
    fn on_disable(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called once before the behaviour is dropped
    fn on_destroy(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }
}

/// Per-component lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed, never spawned
    Unspawned,
    /// Spawn hook has run
    Spawned,
    /// Enable hook has run; init is still pending
    Enabled,
    /// Enabled and initialized; receives updates
    Running,
    /// Disabled after having been enabled
    Disabled,
    /// Destroy hook has run
    Destroyed,
}

impl LifecycleState {
    /// Whether the disable hook would fire for this state
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled | Self::Running)
    }

    /// Whether the destroy hook would fire for this state
    #[must_use]
    pub const fn has_spawned(self) -> bool {
        !matches!(self, Self::Unspawned | Self::Destroyed)
    }
}

/// Arena slot holding one component and its lifecycle bookkeeping
pub struct ComponentSlot {
    pub(crate) owner: EntityId,
    pub(crate) identity: Identity,
    pub(crate) type_tag: &'static str,
    pub(crate) state: LifecycleState,
    pub(crate) initialized: bool,
    pub(crate) enabled: bool,
    /// `None` only while the component's own hook is running
    pub(crate) component: Option<Box<dyn Component>>,
}

impl ComponentSlot {
    pub(crate) fn new(owner: EntityId, identity: Identity, enabled: bool, component: Box<dyn Component>) -> Self {
        Self {
            owner,
            identity,
            type_tag: component.type_tag(),
            state: LifecycleState::Unspawned,
            initialized: false,
            enabled,
            component: Some(component),
        }
    }

    /// Entity that owns this component
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Persistent identity
    #[must_use]
    pub const fn identity(&self) -> Identity {
        self.identity
    }

    /// Type tag of the stored component
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the init hook has completed at least once
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// User-controlled enabled flag
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Borrow the component, unless its own hook is running
    #[must_use]
    pub fn component(&self) -> Option<&dyn Component> {
        self.component.as_deref()
    }

    pub(crate) fn matches(&self, kind: TypeId) -> bool {
        self.component
            .as_ref()
            .is_some_and(|component| component.as_kind(kind).is_some())
    }

    pub(crate) fn downcast<K: Any>(&self) -> Option<&K> {
        self.component
            .as_ref()?
            .as_kind(TypeId::of::<K>())?
            .downcast_ref::<K>()
    }

    pub(crate) fn downcast_mut<K: Any>(&mut self) -> Option<&mut K> {
        self.component
            .as_mut()?
            .as_kind_mut(TypeId::of::<K>())?
            .downcast_mut::<K>()
    }
}
