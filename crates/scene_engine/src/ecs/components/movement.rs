//! Movement behaviours
//!
//! - [`CharacterMove`]: WASD translation and Q/E yaw from polled input
//! - [`BounceJump`]: bobs up and down above its starting point
//! - [`TriggerJump`]: lifts while a referenced entity stands within range

use crate::ecs::{Behaviour, Component, EntityRef, HookContext, HookError, HookResult};
use crate::foundation::math::{utils, Quat, Vec3};
use crate::input::Key;
use crate::scene::{FieldDescriptor, Persistable};

/// Distance below which a lerping body counts as arrived
const ARRIVAL_EPSILON: f32 = 0.01;

/// Player-style movement driven by the keyboard
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterMove {
    /// Units per second
    pub move_speed: f32,
    /// Degrees per second
    pub rotate_speed: f32,
}

impl Default for CharacterMove {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            rotate_speed: 90.0,
        }
    }
}

impl Behaviour for CharacterMove {
    fn on_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        let input = ctx.input();
        let axis = |positive: Key, negative: Key| {
            f32::from(u8::from(input.is_key_down(positive))) - f32::from(u8::from(input.is_key_down(negative)))
        };
        let advance = axis(Key::W, Key::S);
        let strafe = axis(Key::D, Key::A);
        let turn = axis(Key::Q, Key::E);
        let dt = ctx.delta_time();

        let view = ctx.transform();
        let direction = view.forward() * advance + view.right() * strafe;
        if direction.norm_squared() > f32::EPSILON {
            let delta = direction.normalize() * self.move_speed * dt;
            ctx.transform_mut().translate(delta);
        }
        if turn != 0.0 {
            let angle = utils::deg_to_rad(self.rotate_speed * turn * dt);
            ctx.transform_mut().rotate(Quat::from_axis_angle(&Vec3::y_axis(), angle));
        }
        Ok(())
    }
}

impl Component for CharacterMove {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn as_behaviour_mut(&mut self) -> Option<&mut dyn Behaviour> {
        Some(self)
    }
}

impl Persistable for CharacterMove {
    const TYPE_TAG: &'static str = "CharacterMove";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::float("move_speed", |c| c.move_speed, |c, v| c.move_speed = v),
            FieldDescriptor::<Self>::float("rotate_speed", |c| c.rotate_speed, |c, v| c.rotate_speed = v),
        ]
    }
}

/// Bobs between its starting local position and a point above it
#[derive(Debug, Clone, PartialEq)]
pub struct BounceJump {
    /// Height of the upper turning point
    pub lift_up_distance: f32,
    /// Lerp rate per second
    pub move_speed: f32,
    origin: Vec3,
    rising: bool,
}

impl Default for BounceJump {
    fn default() -> Self {
        Self {
            lift_up_distance: 1.0,
            move_speed: 2.0,
            origin: Vec3::zeros(),
            rising: true,
        }
    }
}

impl BounceJump {
    /// Whether the body is heading to the upper turning point
    #[must_use]
    pub const fn is_rising(&self) -> bool {
        self.rising
    }
}

impl Behaviour for BounceJump {
    fn on_init(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        self.origin = ctx.transform().local_position();
        self.rising = true;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        let target = if self.rising {
            self.origin + Vec3::y() * self.lift_up_distance
        } else {
            self.origin
        };
        let rate = (self.move_speed * ctx.delta_time()).clamp(0.0, 1.0);
        let current = ctx.transform().local_position();
        let next = utils::lerp_vec3(&current, &target, rate);
        ctx.transform_mut().set_local_position(next);
        if (next - target).norm() < ARRIVAL_EPSILON {
            self.rising = !self.rising;
        }
        Ok(())
    }
}

impl Component for BounceJump {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn as_behaviour_mut(&mut self) -> Option<&mut dyn Behaviour> {
        Some(self)
    }
}

impl Persistable for BounceJump {
    const TYPE_TAG: &'static str = "BounceJump";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::float("lift_up_distance", |c| c.lift_up_distance, |c, v| c.lift_up_distance = v),
            FieldDescriptor::<Self>::float("move_speed", |c| c.move_speed, |c, v| c.move_speed = v),
        ]
    }
}

/// Rises while the referenced player is within `trigger_radius`
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerJump {
    /// Horizontal and vertical reach of the trigger
    pub trigger_radius: f32,
    /// Height reached while triggered
    pub lift_up_distance: f32,
    /// Entity that sets the trigger off
    pub player: EntityRef,
    origin: Vec3,
    triggered: bool,
}

impl Default for TriggerJump {
    fn default() -> Self {
        Self {
            trigger_radius: 1.0,
            lift_up_distance: 0.5,
            player: EntityRef::none(),
            origin: Vec3::zeros(),
            triggered: false,
        }
    }
}

impl TriggerJump {
    /// Lerp rate per second toward the current target
    pub const LIFT_RATE: f32 = 8.0;

    /// Trigger set off by `player`, other settings at their defaults
    #[must_use]
    pub fn with_player(player: EntityRef) -> Self {
        Self {
            player,
            ..Self::default()
        }
    }

    /// Whether the player was in range on the last update
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.triggered
    }
}

impl Behaviour for TriggerJump {
    fn on_init(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        self.origin = ctx.transform().local_position();
        if self.player.is_set() && ctx.resolve_entity(&self.player).is_none() {
            return Err(HookError::UnresolvedReference("player"));
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        // A player destroyed at runtime just stops triggering.
        let player = ctx
            .resolve_entity(&self.player)
            .and_then(|player| ctx.transform_of(player))
            .map(|view| view.position());
        self.triggered = player.is_some_and(|position| {
            let base = ctx.transform().position();
            (position - base).norm() <= self.trigger_radius
        });

        let target = if self.triggered {
            self.origin + Vec3::y() * self.lift_up_distance
        } else {
            self.origin
        };
        let rate = (Self::LIFT_RATE * ctx.delta_time()).clamp(0.0, 1.0);
        let current = ctx.transform().local_position();
        ctx.transform_mut()
            .set_local_position(utils::lerp_vec3(&current, &target, rate));
        Ok(())
    }
}

impl Component for TriggerJump {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn as_behaviour_mut(&mut self) -> Option<&mut dyn Behaviour> {
        Some(self)
    }
}

impl Persistable for TriggerJump {
    const TYPE_TAG: &'static str = "TriggerJump";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::float("trigger_radius", |c| c.trigger_radius, |c, v| c.trigger_radius = v),
            FieldDescriptor::<Self>::float("lift_up_distance", |c| c.lift_up_distance, |c, v| c.lift_up_distance = v),
            FieldDescriptor::<Self>::entity_ref("player", |c| c.player, |c, v| c.player = v),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::identity::Identity;

    #[test]
    fn test_trigger_jump_with_player_keeps_defaults() {
        let player = EntityRef::to(Identity::new());
        let trigger = TriggerJump::with_player(player);
        let defaults = TriggerJump::default();

        assert_eq!(trigger.player, player);
        assert!((trigger.trigger_radius - defaults.trigger_radius).abs() < f32::EPSILON);
        assert!((trigger.lift_up_distance - defaults.lift_up_distance).abs() < f32::EPSILON);
        assert!(!trigger.is_triggered());
    }
}
