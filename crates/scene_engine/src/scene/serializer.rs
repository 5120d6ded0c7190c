//! Scene serializer
//!
//! Loading runs in three stages and touches the world only in the last one:
//!
//! 1. Construction: walk the document top-down, build every entity and
//!    component in a staging area under its persisted identity, registering
//!    each identity in a staging table as soon as it is built. Plain fields
//!    are assigned here.
//! 2. Reference resolution: with every identity of the document known,
//!    bind each reference field, rejecting identities the document lacks.
//! 3. Commit: insert the staged subtree into the world and run the
//!    spawn/enable traversal over it.

use std::collections::HashMap;
use std::path::Path;

use log::{info, warn};

use crate::ecs::{Component, World};
use crate::foundation::collections::EntityId;
use crate::foundation::identity::Identity;
use crate::foundation::math::Pose;

use super::document::{ComponentRecord, EntityRecord, FieldValue, SceneDocument, TransformRecord, FORMAT_VERSION};
use super::registry::{ComponentRegistry, FieldKind};
use super::SerializationError;

/// What a staged identity names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StagedTarget {
    Entity,
    Component(&'static str),
}

struct StagedComponent {
    identity: Identity,
    enabled: bool,
    component: Box<dyn Component>,
}

struct StagedEntity {
    identity: Identity,
    name: String,
    active: bool,
    pose: Pose,
    components: Vec<StagedComponent>,
    children: Vec<StagedEntity>,
}

/// Staging area for one load
struct Staging<'a> {
    registry: &'a ComponentRegistry,
    /// Identities already live in the target world
    live: Option<&'a World>,
    table: HashMap<Identity, StagedTarget>,
}

impl Staging<'_> {
    fn register(&mut self, identity: Identity, target: StagedTarget) -> Result<(), SerializationError> {
        if self.live.is_some_and(|world| world.identities().contains(&identity)) {
            return Err(SerializationError::InvariantViolation(format!(
                "identity {identity} is already live in the world"
            )));
        }
        if self.table.insert(identity, target).is_some() {
            return Err(SerializationError::InvariantViolation(format!(
                "identity {identity} appears more than once in the document"
            )));
        }
        Ok(())
    }

    fn construct_entity(&mut self, record: &EntityRecord) -> Result<StagedEntity, SerializationError> {
        self.register(record.id, StagedTarget::Entity)?;
        let components = record
            .components
            .iter()
            .map(|component| self.construct_component(record, component))
            .collect::<Result<Vec<_>, _>>()?;
        let children = record
            .children
            .iter()
            .map(|child| self.construct_entity(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StagedEntity {
            identity: record.id,
            name: record.name.clone(),
            active: record.active,
            pose: Pose::from(&record.transform),
            components,
            children,
        })
    }

    fn construct_component(
        &mut self,
        owner: &EntityRecord,
        record: &ComponentRecord,
    ) -> Result<StagedComponent, SerializationError> {
        let kind = self
            .registry
            .by_tag(&record.type_tag)
            .ok_or_else(|| SerializationError::UnknownComponentType(record.type_tag.clone()))?;
        if record.entity != owner.id {
            return Err(SerializationError::Malformed(format!(
                "component {} names owner {} but is listed under {}",
                record.id, record.entity, owner.id
            )));
        }
        self.register(record.id, StagedTarget::Component(kind.tag))?;

        let mut component = kind.construct();
        for field in kind.fields() {
            let value = record.fields.get(field.name).ok_or_else(|| {
                SerializationError::Malformed(format!("`{}` is missing field `{}`", kind.tag, field.name))
            })?;
            if field.kind.is_reference() {
                if !matches!(value, FieldValue::Ref(_)) {
                    return Err(SerializationError::Malformed(format!(
                        "`{}.{}` must be a Ref, found {}",
                        kind.tag,
                        field.name,
                        value.kind_name()
                    )));
                }
                continue;
            }
            field
                .set(&mut *component, value.clone())
                .map_err(|e| SerializationError::Malformed(format!("`{}.{}`: {e}", kind.tag, field.name)))?;
        }
        for name in record.fields.keys() {
            if !kind.fields().iter().any(|field| field.name == name) {
                warn!("Ignoring unknown field `{}.{name}`", kind.tag);
            }
        }

        Ok(StagedComponent {
            identity: record.id,
            enabled: record.enabled,
            component,
        })
    }

    /// Bind every reference field of `staged`, mirroring `record`
    fn resolve_references(&self, record: &EntityRecord, staged: &mut StagedEntity) -> Result<(), SerializationError> {
        for (component_record, component) in record.components.iter().zip(staged.components.iter_mut()) {
            let kind = self
                .registry
                .by_tag(&component_record.type_tag)
                .ok_or_else(|| SerializationError::UnknownComponentType(component_record.type_tag.clone()))?;
            for field in kind.fields().iter().filter(|field| field.kind.is_reference()) {
                let Some(value) = component_record.fields.get(field.name) else { continue };
                if let FieldValue::Ref(Some(identity)) = value {
                    let failure = |reason| SerializationError::ReferenceResolution {
                        component: kind.tag.to_string(),
                        field: field.name.to_string(),
                        identity: *identity,
                        reason,
                    };
                    let target = self
                        .table
                        .get(identity)
                        .ok_or_else(|| failure("is not defined in the document"))?;
                    let fits = match (field.kind, target) {
                        (FieldKind::EntityRef, StagedTarget::Entity) => true,
                        (FieldKind::ComponentRef(expected), StagedTarget::Component(actual)) => expected == *actual,
                        _ => false,
                    };
                    if !fits {
                        return Err(failure("has the wrong kind for this field"));
                    }
                }
                field
                    .set(&mut *component.component, value.clone())
                    .map_err(|e| SerializationError::Malformed(format!("`{}.{}`: {e}", kind.tag, field.name)))?;
            }
        }
        for (child_record, child) in record.children.iter().zip(staged.children.iter_mut()) {
            self.resolve_references(child_record, child)?;
        }
        Ok(())
    }
}

/// Insert a staged subtree as a detached hierarchy and return its top entity
fn commit(world: &mut World, staged: StagedEntity) -> Result<EntityId, SerializationError> {
    let id = world.create_entity_with_identity(&staged.name, staged.identity)?;
    world.transform_mut(id)?.set_local_pose(staged.pose);
    world.set_active(id, staged.active)?;
    for component in staged.components {
        world.insert_boxed_component(id, component.component, component.identity, component.enabled)?;
    }
    for child in staged.children {
        let child_id = commit(world, child)?;
        world.attach(child_id, id)?;
    }
    Ok(id)
}

/// Reads and writes scene documents through a component registry
pub struct SceneSerializer<'r> {
    registry: &'r ComponentRegistry,
}

impl<'r> SceneSerializer<'r> {
    /// Serializer backed by `registry`
    #[must_use]
    pub const fn new(registry: &'r ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Snapshot the live tree
    pub fn serialize(&self, world: &World) -> Result<SceneDocument, SerializationError> {
        Ok(SceneDocument {
            version: FORMAT_VERSION,
            root: self.entity_record(world, world.root())?,
        })
    }

    fn entity_record(&self, world: &World, id: EntityId) -> Result<EntityRecord, SerializationError> {
        let node = world
            .entity(id)
            .ok_or(crate::ecs::WorldError::EntityNotFound(id))?;

        let mut components = Vec::with_capacity(node.components().len());
        for component_id in node.components() {
            let slot = world
                .component_slot(*component_id)
                .ok_or(crate::ecs::WorldError::ComponentNotFound(*component_id))?;
            let component = slot.component().ok_or_else(|| {
                SerializationError::InvariantViolation(format!("`{}` is busy running a hook", slot.type_tag()))
            })?;
            let kind = self
                .registry
                .kind_of(component)
                .ok_or(SerializationError::UnregisteredComponent(slot.type_tag()))?;
            let mut fields = std::collections::BTreeMap::new();
            for field in kind.fields() {
                let value = field.get(component).ok_or(SerializationError::UnregisteredComponent(kind.tag))?;
                fields.insert(field.name.to_string(), value);
            }
            components.push(ComponentRecord {
                type_tag: kind.tag.to_string(),
                entity: node.identity(),
                id: slot.identity(),
                enabled: slot.is_enabled(),
                fields,
            });
        }

        let children = node
            .children()
            .iter()
            .map(|child| self.entity_record(world, *child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EntityRecord {
            id: node.identity(),
            name: node.name().to_string(),
            active: node.is_active(),
            transform: TransformRecord::from(node.transform().local()),
            components,
            children,
        })
    }

    fn check_version(document: &SceneDocument) -> Result<(), SerializationError> {
        if document.version > FORMAT_VERSION {
            return Err(SerializationError::Malformed(format!(
                "document version {} is newer than supported version {FORMAT_VERSION}",
                document.version
            )));
        }
        Ok(())
    }

    /// Stage the children of the document root against an optional live world
    fn stage_children(
        &self,
        document: &SceneDocument,
        live: Option<&World>,
        include_root: bool,
    ) -> Result<Vec<StagedEntity>, SerializationError> {
        Self::check_version(document)?;
        let root = &document.root;
        if !root.components.is_empty() {
            return Err(SerializationError::Malformed(
                "the root entity cannot carry components".to_string(),
            ));
        }

        let mut staging = Staging {
            registry: self.registry,
            live,
            table: HashMap::new(),
        };
        if include_root {
            staging.register(root.id, StagedTarget::Entity)?;
        }
        let mut staged = root
            .children
            .iter()
            .map(|child| staging.construct_entity(child))
            .collect::<Result<Vec<_>, _>>()?;
        for (record, entity) in root.children.iter().zip(staged.iter_mut()) {
            staging.resolve_references(record, entity)?;
        }
        Ok(staged)
    }

    /// Build a new world from a document; its root takes the document root's identity
    pub fn deserialize(&self, document: &SceneDocument) -> Result<World, SerializationError> {
        let staged = self.stage_children(document, None, true)?;

        let root = &document.root;
        if !root.active {
            warn!("Document root `{}` is inactive; the root is always active", root.name);
        }
        let mut world = World::with_root(root.id, &root.name);
        let root_id = world.root();
        world.transform_mut(root_id)?.set_local_pose(Pose::from(&root.transform));
        Self::commit_children(&mut world, staged)?;
        info!("Loaded scene `{}` with {} entities", root.name, world.entity_count());
        Ok(world)
    }

    /// Add the document root's children under the live root
    ///
    /// Nothing is written to `world` unless the whole document stages
    /// cleanly. Returns the new top-level entities.
    pub fn load_into(&self, world: &mut World, document: &SceneDocument) -> Result<Vec<EntityId>, SerializationError> {
        let staged = self.stage_children(document, Some(&*world), false)?;
        let added = Self::commit_children(world, staged)?;
        info!("Added {} subtrees from scene `{}`", added.len(), document.root.name);
        Ok(added)
    }

    fn commit_children(world: &mut World, staged: Vec<StagedEntity>) -> Result<Vec<EntityId>, SerializationError> {
        let tops = staged
            .into_iter()
            .map(|entity| commit(world, entity))
            .collect::<Result<Vec<_>, _>>()?;
        let root = world.root();
        world.attach_all(&tops, root)?;
        Ok(tops)
    }

    /// Write the live tree to a RON file
    pub fn save(&self, world: &World, path: impl AsRef<Path>) -> Result<(), SerializationError> {
        let path = path.as_ref();
        self.serialize(world)?.write(path)?;
        info!("Saved scene to {}", path.display());
        Ok(())
    }

    /// Build a new world from a RON file
    pub fn load(&self, path: impl AsRef<Path>) -> Result<World, SerializationError> {
        let document = SceneDocument::read(path)?;
        self.deserialize(&document)
    }

    /// Add the contents of a RON file to a live world
    pub fn load_additive(&self, world: &mut World, path: impl AsRef<Path>) -> Result<Vec<EntityId>, SerializationError> {
        let document = SceneDocument::read(path)?;
        self.load_into(world, &document)
    }
}
