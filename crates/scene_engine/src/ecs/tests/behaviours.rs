//! Built-in gameplay behaviours driven through the scheduler

use approx::assert_relative_eq;

use crate::ecs::components::{BounceJump, CharacterMove, DirectionalLight, LightToggle, TriggerJump};
use crate::ecs::{EntityRef, HookError, LifecycleState, World, WorldError};
use crate::foundation::collections::EntityId;
use crate::foundation::identity::Identity;
use crate::foundation::math::Vec3;
use crate::input::{Key, ScriptedInput};

const DT: f32 = 0.1;

/// Attach a fresh entity carrying `component` so it is spawned and enabled at once
fn attach_with<K: crate::ecs::Component>(world: &mut World, name: &str, component: K) -> EntityId {
    let entity = world.create_entity(name);
    world.insert_component(entity, component).unwrap();
    let root = world.root();
    world.attach(entity, root).unwrap();
    entity
}

#[test]
fn test_character_move_walks_forward() {
    let mut world = World::new();
    world.set_input_provider(Box::new(
        ScriptedInput::new().then_hold(&[]).then_hold_for(&[Key::W], 10),
    ));
    let player = attach_with(&mut world, "Player", CharacterMove::default());

    for _ in 0..12 {
        world.update(DT).unwrap();
    }
    assert_relative_eq!(world.transform(player).unwrap().position(), Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-4);
}

#[test]
fn test_character_move_turns_with_q() {
    let mut world = World::new();
    world.set_input_provider(Box::new(
        ScriptedInput::new().then_hold(&[]).then_hold_for(&[Key::Q], 10),
    ));
    let player = attach_with(&mut world, "Player", CharacterMove::default());

    for _ in 0..11 {
        world.update(DT).unwrap();
    }
    let view = world.transform(player).unwrap();
    assert_relative_eq!(view.forward(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-4);
    assert_relative_eq!(view.position(), Vec3::zeros());
}

#[test]
fn test_bounce_jump_rises_and_falls() {
    let mut world = World::new();
    let body = attach_with(&mut world, "Body", BounceJump::default());
    world.transform_mut(body).unwrap().set_local_position(Vec3::new(2.0, 0.0, 0.0));

    world.update(DT).unwrap();
    world.update(DT).unwrap();
    let first = world.transform(body).unwrap().local_position();
    assert!(first.y > 0.0);
    assert_relative_eq!(first.x, 2.0, epsilon = 1e-5);

    let mut flipped = false;
    for _ in 0..100 {
        world.update(DT).unwrap();
        let y = world.transform(body).unwrap().local_position().y;
        assert!((0.0..=1.0 + 1e-4).contains(&y));
        if !world.get_component::<BounceJump>(body).unwrap().is_rising() {
            flipped = true;
            break;
        }
    }
    assert!(flipped);

    for _ in 0..5 {
        world.update(DT).unwrap();
    }
    assert!(world.transform(body).unwrap().local_position().y < 0.99);
}

#[test]
fn test_trigger_jump_follows_player_distance() {
    let mut world = World::new();
    let player = attach_with(&mut world, "Player", CharacterMove::default());
    world.transform_mut(player).unwrap().set_position(Vec3::new(5.0, 0.0, 0.0));
    let trigger = TriggerJump::with_player(EntityRef::from_entity(&world, player));
    let platform = attach_with(&mut world, "Platform", trigger);

    for _ in 0..3 {
        world.update(DT).unwrap();
    }
    assert!(!world.get_component::<TriggerJump>(platform).unwrap().is_triggered());
    assert_relative_eq!(world.transform(platform).unwrap().position().y, 0.0);

    world.transform_mut(player).unwrap().set_position(Vec3::new(0.5, 0.0, 0.0));
    for _ in 0..10 {
        world.update(DT).unwrap();
    }
    assert!(world.get_component::<TriggerJump>(platform).unwrap().is_triggered());
    assert_relative_eq!(world.transform(platform).unwrap().position().y, 0.5, epsilon = 1e-3);

    // A destroyed player simply stops triggering.
    world.destroy(player).unwrap();
    for _ in 0..10 {
        world.update(DT).unwrap();
    }
    assert!(!world.get_component::<TriggerJump>(platform).unwrap().is_triggered());
    assert!(world.transform(platform).unwrap().position().y < 0.01);
}

#[test]
fn test_trigger_jump_rejects_dangling_player() {
    let mut world = World::new();
    let trigger = TriggerJump::with_player(EntityRef::to(Identity::new()));
    attach_with(&mut world, "Platform", trigger);

    let err = world.update(DT).unwrap_err();
    assert!(matches!(
        err,
        WorldError::Hook {
            source: HookError::UnresolvedReference("player"),
            ..
        }
    ));
}

#[test]
fn test_light_toggle_flips_sibling_light() {
    let mut world = World::new();
    world.set_input_provider(Box::new(
        ScriptedInput::new()
            .then_hold(&[])
            .then_hold_for(&[Key::O], 2)
            .then_hold(&[])
            .then_hold(&[Key::O]),
    ));
    let lamp = world.create_entity("Lamp");
    let light = world.insert_component(lamp, DirectionalLight::default()).unwrap();
    world.insert_component(lamp, LightToggle::default()).unwrap();
    let root = world.root();
    world.attach(lamp, root).unwrap();

    world.update(DT).unwrap();
    assert!(world.get_component::<LightToggle>(lamp).unwrap().light.is_set());
    assert!(world.component_slot(light).unwrap().is_enabled());

    world.update(DT).unwrap();
    assert!(!world.component_slot(light).unwrap().is_enabled());
    assert_eq!(world.component_state(light), Some(LifecycleState::Disabled));

    world.update(DT).unwrap();
    world.update(DT).unwrap();
    assert!(!world.component_slot(light).unwrap().is_enabled());

    world.update(DT).unwrap();
    assert!(world.component_slot(light).unwrap().is_enabled());
    assert_eq!(world.component_state(light), Some(LifecycleState::Running));
}

#[test]
fn test_light_toggle_without_light_fails_init() {
    let mut world = World::new();
    attach_with(&mut world, "Switch", LightToggle::default());

    let err = world.update(DT).unwrap_err();
    assert!(matches!(
        err,
        WorldError::Hook {
            source: HookError::MissingComponent("DirectionalLight"),
            ..
        }
    ));
}
