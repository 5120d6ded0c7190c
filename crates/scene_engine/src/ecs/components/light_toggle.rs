//! Switches a directional light on and off from the keyboard

use crate::ecs::{Behaviour, Component, ComponentRef, HookContext, HookError, HookResult};
use crate::input::Key;
use crate::scene::{FieldDescriptor, FieldError, Persistable};

use super::DirectionalLight;

/// Toggles the referenced light's enabled flag whenever `key` is pressed
///
/// With no light referenced, init binds the first directional light on the
/// same entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LightToggle {
    /// Key that flips the light
    pub key: Key,
    /// Light to flip
    pub light: ComponentRef,
}

impl Default for LightToggle {
    fn default() -> Self {
        Self {
            key: Key::O,
            light: ComponentRef::none(),
        }
    }
}

impl Behaviour for LightToggle {
    fn on_init(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        if self.light.is_set() {
            return match ctx.resolve_component(&self.light) {
                Some(_) => Ok(()),
                None => Err(HookError::UnresolvedReference("light")),
            };
        }
        let world = ctx.world();
        let identity = world
            .component_id::<DirectionalLight>(ctx.entity())
            .and_then(|id| world.component_slot(id))
            .map(crate::ecs::ComponentSlot::identity)
            .ok_or(HookError::MissingComponent(DirectionalLight::TYPE_TAG))?;
        self.light = ComponentRef::to(identity);
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        if !ctx.input().is_key_pressed(self.key) {
            return Ok(());
        }
        let Some(light) = ctx.resolve_component(&self.light) else {
            return Ok(());
        };
        let enabled = ctx
            .world()
            .component_slot(light)
            .is_some_and(crate::ecs::ComponentSlot::is_enabled);
        log::debug!("Toggling light {} -> {}", enabled, !enabled);
        ctx.set_component_enabled(light, !enabled);
        Ok(())
    }
}

impl Component for LightToggle {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn as_behaviour_mut(&mut self) -> Option<&mut dyn Behaviour> {
        Some(self)
    }
}

impl Persistable for LightToggle {
    const TYPE_TAG: &'static str = "LightToggle";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::text(
                "key",
                |c| c.key.to_string(),
                |c, v| {
                    c.key = v.parse().map_err(|e: crate::input::UnknownKey| FieldError::Invalid(e.to_string()))?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::component_ref(
                "light",
                DirectionalLight::TYPE_TAG,
                |c| c.light,
                |c, v| c.light = v,
            ),
        ]
    }
}
