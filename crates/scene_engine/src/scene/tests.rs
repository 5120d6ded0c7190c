use approx::assert_relative_eq;

use crate::ecs::components::{Camera, DirectionalLight, LightToggle, MeshRenderer, PointLight, Projection, TriggerJump};
use crate::ecs::{ComponentRef, EntityRef, LifecycleState, World};
use crate::foundation::collections::EntityId;
use crate::foundation::identity::Identity;
use crate::foundation::math::{Quat, Vec3};

use super::*;

struct Fixture {
    world: World,
    player: EntityId,
    sun: EntityId,
    platform: EntityId,
    lamp: EntityId,
}

fn build_world() -> Fixture {
    let mut world = World::new();
    let root = world.root();

    let player = world.spawn("Player", root).unwrap();
    world.add_component::<MeshRenderer>(player).unwrap().mesh_path = "models/player.obj".to_string();
    world
        .transform_mut(player)
        .unwrap()
        .set_local_position(Vec3::new(1.0, 0.0, -2.0))
        .set_local_rotation(Quat::from_axis_angle(&Vec3::y_axis(), 0.5));

    let sun = world.spawn("Sun", root).unwrap();
    let light = world.insert_component(sun, DirectionalLight::default()).unwrap();
    world.get_component_mut::<DirectionalLight>(sun).unwrap().base.intensity = 2.5;
    let toggle = LightToggle {
        light: ComponentRef::from_component(&world, light),
        ..LightToggle::default()
    };
    world.insert_component(sun, toggle).unwrap();

    let platform = world.spawn("Platform", root).unwrap();
    let trigger = TriggerJump::with_player(EntityRef::from_entity(&world, player));
    world.insert_component(platform, trigger).unwrap();

    let lamp = world.spawn("Lamp", platform).unwrap();
    world.add_component::<PointLight>(lamp).unwrap().range = 7.0;
    world.set_active(lamp, false).unwrap();

    let camera = world.spawn("Camera", root).unwrap();
    world.add_component::<Camera>(camera).unwrap().projection = Projection::Orthographic;
    world.transform_mut(camera).unwrap().set_local_scale(Vec3::new(2.0, 2.0, 2.0));
    let camera_id = world.component_id::<Camera>(camera).unwrap();
    world.set_component_enabled(camera_id, false).unwrap();

    Fixture {
        world,
        player,
        sun,
        platform,
        lamp,
    }
}

fn identity_of(world: &World, entity: EntityId) -> Identity {
    world.entity(entity).unwrap().identity()
}

fn assert_records_match(a: &EntityRecord, b: &EntityRecord) {
    assert_eq!(a.id, b.id);
    assert_eq!(a.name, b.name);
    assert_eq!(a.active, b.active);
    assert_eq!(a.components, b.components);
    assert_eq!(a.transform.position, b.transform.position);
    assert_eq!(a.transform.scale, b.transform.scale);
    for (x, y) in a.transform.rotation.iter().zip(b.transform.rotation.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-6);
    }
    assert_eq!(a.children.len(), b.children.len());
    for (x, y) in a.children.iter().zip(b.children.iter()) {
        assert_records_match(x, y);
    }
}

#[test]
fn test_round_trip_through_ron_preserves_tree() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);

    let first = serializer.serialize(&fixture.world).unwrap();
    let text = first.to_ron_string().unwrap();
    let parsed = SceneDocument::from_ron_str(&text).unwrap();
    let loaded = serializer.deserialize(&parsed).unwrap();
    let second = serializer.serialize(&loaded).unwrap();

    assert_records_match(&first.root, &second.root);
    assert_eq!(loaded.entity_count(), fixture.world.entity_count());
    assert_eq!(loaded.component_count(), fixture.world.component_count());
    assert_eq!(identity_of(&loaded, loaded.root()), identity_of(&fixture.world, fixture.world.root()));
}

#[test]
fn test_round_trip_rebinds_references() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let document = serializer.serialize(&fixture.world).unwrap();
    let loaded = serializer.deserialize(&document).unwrap();

    let platform = loaded.resolve_entity(&identity_of(&fixture.world, fixture.platform)).unwrap();
    let trigger = loaded.get_component::<TriggerJump>(platform).unwrap();
    let player = trigger.player.resolve(&loaded).unwrap();
    assert_eq!(loaded.name_of(player), "Player");

    let sun = loaded.resolve_entity(&identity_of(&fixture.world, fixture.sun)).unwrap();
    let toggle = loaded.get_component::<LightToggle>(sun).unwrap();
    let light = toggle.light.resolve(&loaded).unwrap();
    assert_eq!(loaded.component_slot(light).unwrap().type_tag(), "DirectionalLight");
    assert_eq!(loaded.component_slot(light).unwrap().owner(), sun);
}

#[test]
fn test_round_trip_keeps_flags_and_values() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let document = serializer.serialize(&fixture.world).unwrap();
    let loaded = serializer.deserialize(&document).unwrap();

    let lamp = loaded.resolve_entity(&identity_of(&fixture.world, fixture.lamp)).unwrap();
    assert!(!loaded.entity(lamp).unwrap().is_active());
    assert_relative_eq!(loaded.get_component::<PointLight>(lamp).unwrap().range, 7.0);

    let camera = loaded.find_entity("Camera").unwrap();
    let camera_id = loaded.component_id::<Camera>(camera).unwrap();
    assert!(!loaded.component_slot(camera_id).unwrap().is_enabled());
    assert_eq!(loaded.get_component::<Camera>(camera).unwrap().projection, Projection::Orthographic);
    assert_relative_eq!(loaded.transform(camera).unwrap().scale().x, 2.0);

    let player = loaded.resolve_entity(&identity_of(&fixture.world, fixture.player)).unwrap();
    let original = fixture.world.transform(fixture.player).unwrap().position();
    let restored = loaded.transform(player).unwrap().position();
    assert_relative_eq!(original, restored, epsilon = 1e-5);
    assert_eq!(loaded.get_component::<MeshRenderer>(player).unwrap().mesh_path, "models/player.obj");
}

#[test]
fn test_forward_reference_resolves() {
    let mut world = World::new();
    let root = world.root();
    // The switch precedes the light it points at in document order.
    let switch = world.spawn("Switch", root).unwrap();
    let sun = world.spawn("Sun", root).unwrap();
    let light = world.insert_component(sun, DirectionalLight::default()).unwrap();
    let toggle = LightToggle {
        light: ComponentRef::from_component(&world, light),
        ..LightToggle::default()
    };
    world.insert_component(switch, toggle).unwrap();

    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let document = serializer.serialize(&world).unwrap();
    let mut loaded = serializer.deserialize(&document).unwrap();

    let switch = loaded.find_entity("Switch").unwrap();
    let toggle = loaded.component_id::<LightToggle>(switch).unwrap();
    loaded.update(0.016).unwrap();
    assert_eq!(loaded.component_state(toggle), Some(LifecycleState::Running));
}

#[test]
fn test_forward_entity_reference_resolves() {
    let mut world = World::new();
    let root = world.root();
    // The platform's trigger points at a sibling written after it.
    let platform = world.spawn("Platform", root).unwrap();
    let player = world.spawn("Player", root).unwrap();
    let trigger = TriggerJump::with_player(EntityRef::from_entity(&world, player));
    world.insert_component(platform, trigger).unwrap();

    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let text = serializer.serialize(&world).unwrap().to_ron_string().unwrap();
    let document = SceneDocument::from_ron_str(&text).unwrap();
    assert_eq!(document.root.children[0].name, "Platform");
    assert_eq!(document.root.children[1].name, "Player");

    let mut loaded = serializer.deserialize(&document).unwrap();
    let platform = loaded.find_entity("Platform").unwrap();
    let target = loaded.get_component::<TriggerJump>(platform).unwrap().player.resolve(&loaded);
    assert_eq!(target, loaded.find_entity("Player"));

    let trigger = loaded.component_id::<TriggerJump>(platform).unwrap();
    loaded.update(0.016).unwrap();
    assert_eq!(loaded.component_state(trigger), Some(LifecycleState::Running));
}

#[test]
fn test_deep_chain_round_trips_through_ron() {
    const DEPTH: usize = 100;

    // Serde and the staging passes recurse once per level.
    let worker = std::thread::Builder::new()
        .stack_size(32 * 1024 * 1024)
        .spawn(|| {
            let mut world = World::new();
            let mut parent = world.root();
            for level in 0..DEPTH {
                parent = world.spawn(&format!("Link {level}"), parent).unwrap();
            }
            world.add_component::<PointLight>(parent).unwrap();

            let registry = ComponentRegistry::with_builtins();
            let serializer = SceneSerializer::new(&registry);
            let document = serializer.serialize(&world).unwrap();
            let text = document.to_ron_string().unwrap();
            let parsed = SceneDocument::from_ron_str(&text).unwrap();
            let loaded = serializer.deserialize(&parsed).unwrap();

            assert_eq!(loaded.entity_count(), DEPTH + 1);
            let tip = loaded.find_entity(&format!("Link {}", DEPTH - 1)).unwrap();
            assert!(loaded.get_component::<PointLight>(tip).is_some());
            assert_records_match(&document.root, &serializer.serialize(&loaded).unwrap().root);
        })
        .unwrap();
    worker.join().unwrap();
}

#[test]
fn test_loaded_behaviours_are_spawned_and_enabled() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let document = serializer.serialize(&fixture.world).unwrap();
    let loaded = serializer.deserialize(&document).unwrap();

    let platform = loaded.find_entity("Platform").unwrap();
    let trigger = loaded.component_id::<TriggerJump>(platform).unwrap();
    assert_eq!(loaded.component_state(trigger), Some(LifecycleState::Enabled));

    let lamp = loaded.find_entity("Lamp").unwrap();
    let point = loaded.component_id::<PointLight>(lamp).unwrap();
    assert_eq!(loaded.component_state(point), Some(LifecycleState::Spawned));

    let camera = loaded.find_entity("Camera").unwrap();
    let camera_id = loaded.component_id::<Camera>(camera).unwrap();
    assert_eq!(loaded.component_state(camera_id), Some(LifecycleState::Spawned));
}

fn first_component_mut<'a>(record: &'a mut EntityRecord, tag: &str) -> Option<&'a mut ComponentRecord> {
    if let Some(index) = record.components.iter().position(|c| c.type_tag == tag) {
        return record.components.get_mut(index);
    }
    record
        .children
        .iter_mut()
        .find_map(|child| first_component_mut(child, tag))
}

#[test]
fn test_missing_reference_leaves_world_untouched() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let mut document = serializer.serialize(&fixture.world).unwrap();

    let mut target = World::new();
    let stranger = Identity::new();
    first_component_mut(&mut document.root, "TriggerJump")
        .unwrap()
        .fields
        .insert("player".to_string(), FieldValue::Ref(Some(stranger)));

    let err = serializer.load_into(&mut target, &document).unwrap_err();
    match err {
        SerializationError::ReferenceResolution { component, field, identity, .. } => {
            assert_eq!(component, "TriggerJump");
            assert_eq!(field, "player");
            assert_eq!(identity, stranger);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(target.entity_count(), 1);
    assert_eq!(target.component_count(), 0);
    assert_eq!(target.identities().len(), 1);
}

#[test]
fn test_reference_of_wrong_kind_is_rejected() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let mut document = serializer.serialize(&fixture.world).unwrap();

    // Point the light toggle at an entity instead of a light.
    let player = identity_of(&fixture.world, fixture.player);
    first_component_mut(&mut document.root, "LightToggle")
        .unwrap()
        .fields
        .insert("light".to_string(), FieldValue::Ref(Some(player)));

    let err = serializer.deserialize(&document).err().unwrap();
    assert!(matches!(err, SerializationError::ReferenceResolution { .. }));
}

#[test]
fn test_unset_reference_loads() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let mut document = serializer.serialize(&fixture.world).unwrap();
    first_component_mut(&mut document.root, "TriggerJump")
        .unwrap()
        .fields
        .insert("player".to_string(), FieldValue::Ref(None));

    let loaded = serializer.deserialize(&document).unwrap();
    let platform = loaded.find_entity("Platform").unwrap();
    assert!(!loaded.get_component::<TriggerJump>(platform).unwrap().player.is_set());
}

#[test]
fn test_unknown_component_type() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let mut document = serializer.serialize(&fixture.world).unwrap();
    first_component_mut(&mut document.root, "PointLight").unwrap().type_tag = "SpotLight".to_string();

    let err = serializer.deserialize(&document).err().unwrap();
    assert!(matches!(err, SerializationError::UnknownComponentType(ref tag) if tag == "SpotLight"));
}

#[test]
fn test_unregistered_component_cannot_be_saved() {
    let fixture = build_world();
    let registry = ComponentRegistry::new();
    let serializer = SceneSerializer::new(&registry);

    let err = serializer.serialize(&fixture.world).unwrap_err();
    assert!(matches!(err, SerializationError::UnregisteredComponent(_)));
}

#[test]
fn test_malformed_documents() {
    assert!(matches!(
        SceneDocument::from_ron_str("this is not a scene"),
        Err(SerializationError::Malformed(_))
    ));

    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);

    let mut missing_field = serializer.serialize(&fixture.world).unwrap();
    first_component_mut(&mut missing_field.root, "PointLight")
        .unwrap()
        .fields
        .remove("range");
    assert!(matches!(
        serializer.deserialize(&missing_field),
        Err(SerializationError::Malformed(_))
    ));

    let mut mistyped = serializer.serialize(&fixture.world).unwrap();
    first_component_mut(&mut mistyped.root, "PointLight")
        .unwrap()
        .fields
        .insert("range".to_string(), FieldValue::Text("far".to_string()));
    assert!(matches!(serializer.deserialize(&mistyped), Err(SerializationError::Malformed(_))));

    let mut bad_key = serializer.serialize(&fixture.world).unwrap();
    first_component_mut(&mut bad_key.root, "LightToggle")
        .unwrap()
        .fields
        .insert("key".to_string(), FieldValue::Text("F13".to_string()));
    assert!(matches!(serializer.deserialize(&bad_key), Err(SerializationError::Malformed(_))));

    let mut wrong_owner = serializer.serialize(&fixture.world).unwrap();
    first_component_mut(&mut wrong_owner.root, "PointLight").unwrap().entity = Identity::new();
    assert!(matches!(serializer.deserialize(&wrong_owner), Err(SerializationError::Malformed(_))));
}

#[test]
fn test_unknown_fields_are_ignored() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let mut document = serializer.serialize(&fixture.world).unwrap();
    first_component_mut(&mut document.root, "PointLight")
        .unwrap()
        .fields
        .insert("shadow_bias".to_string(), FieldValue::Float(0.1));

    assert!(serializer.deserialize(&document).is_ok());
}

#[test]
fn test_root_components_are_malformed() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let mut document = serializer.serialize(&fixture.world).unwrap();
    let stray = first_component_mut(&mut document.root, "PointLight").unwrap().clone();
    document.root.components.push(stray);

    assert!(matches!(serializer.deserialize(&document), Err(SerializationError::Malformed(_))));
}

#[test]
fn test_duplicate_identity_in_document() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let mut document = serializer.serialize(&fixture.world).unwrap();
    let mut twin = document.root.children[0].clone();
    twin.name = "Twin".to_string();
    document.root.children.push(twin);

    assert!(matches!(
        serializer.deserialize(&document),
        Err(SerializationError::InvariantViolation(_))
    ));
}

#[test]
fn test_additive_load_rejects_live_identities() {
    let mut fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let document = serializer.serialize(&fixture.world).unwrap();
    let entities = fixture.world.entity_count();
    let components = fixture.world.component_count();

    let err = serializer.load_into(&mut fixture.world, &document).unwrap_err();
    assert!(matches!(err, SerializationError::InvariantViolation(_)));
    assert_eq!(fixture.world.entity_count(), entities);
    assert_eq!(fixture.world.component_count(), components);
}

#[test]
fn test_additive_load_appends_subtrees() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let document = serializer.serialize(&fixture.world).unwrap();

    let mut target = World::new();
    let root = target.root();
    let existing = target.spawn("Existing", root).unwrap();
    let added = serializer.load_into(&mut target, &document).unwrap();

    assert_eq!(added.len(), 4);
    let children = target.entity(root).unwrap().children().to_vec();
    assert_eq!(children[0], existing);
    assert_eq!(&children[1..], added.as_slice());
    assert_eq!(target.name_of(added[0]), "Player");
    assert_eq!(target.entity_count(), fixture.world.entity_count() + 1);

    let platform = target.find_entity("Platform").unwrap();
    let player = target
        .get_component::<TriggerJump>(platform)
        .unwrap()
        .player
        .resolve(&target)
        .unwrap();
    assert_eq!(target.name_of(player), "Player");
}

#[test]
fn test_parse_handwritten_document() {
    let text = r#"(
        version: 1,
        root: (
            id: "00000000-0000-4000-8000-000000000001",
            name: "Root",
            active: true,
            transform: (position: (0.0, 0.0, 0.0), rotation: (0.0, 0.0, 0.0, 1.0), scale: (1.0, 1.0, 1.0)),
            children: [
                (
                    id: "00000000-0000-4000-8000-000000000002",
                    name: "Sun",
                    active: true,
                    transform: (position: (0.0, 5.0, 0.0), rotation: (0.0, 0.0, 0.0, 1.0), scale: (1.0, 1.0, 1.0)),
                    components: [
                        (
                            type: "DirectionalLight",
                            entity: "00000000-0000-4000-8000-000000000002",
                            id: "00000000-0000-4000-8000-000000000003",
                            fields: {
                                "color": Vec3((1.0, 0.5, 0.25)),
                                "intensity": Float(2.0),
                                "direction": Vec3((0.0, -1.0, 0.0)),
                            },
                        ),
                    ],
                ),
            ],
        ),
    )"#;

    let document = SceneDocument::from_ron_str(text).unwrap();
    let registry = ComponentRegistry::with_builtins();
    let world = SceneSerializer::new(&registry).deserialize(&document).unwrap();

    let sun = world.find_entity("Sun").unwrap();
    let light = world.get_component::<DirectionalLight>(sun).unwrap();
    assert_relative_eq!(light.base.intensity, 2.0);
    assert_relative_eq!(light.base.color, Vec3::new(1.0, 0.5, 0.25));
    assert_relative_eq!(world.transform(sun).unwrap().position().y, 5.0);
    let light_id = world.component_id::<DirectionalLight>(sun).unwrap();
    assert!(world.component_slot(light_id).unwrap().is_enabled());
}

#[test]
fn test_save_and_load_files() {
    let fixture = build_world();
    let registry = ComponentRegistry::with_builtins();
    let serializer = SceneSerializer::new(&registry);
    let path = std::env::temp_dir().join(format!("scene_engine_{}.ron", Identity::new()));

    serializer.save(&fixture.world, &path).unwrap();
    let loaded = serializer.load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.entity_count(), fixture.world.entity_count());
    assert!(matches!(serializer.load(&path), Err(SerializationError::Io(_))));
}
