//! Static per-kind field descriptor tables
//!
//! Each persistable component kind implements [`Persistable`], listing its
//! fields once. [`ComponentRegistry`] erases those tables at startup so the
//! serializer can walk any registered kind by type tag or by `TypeId`.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::ecs::components;
use crate::ecs::{Component, ComponentRef, EntityRef};
use crate::foundation::math::{self, Quat, Vec3};

use super::document::FieldValue;

/// Shape of a plain value field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// `FieldValue::Bool`
    Bool,
    /// `FieldValue::Int`
    Int,
    /// `FieldValue::Float`
    Float,
    /// `FieldValue::Text`
    Text,
    /// `FieldValue::Vec3`
    Vec3,
    /// `FieldValue::Quat`
    Quat,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value-vs-reference classification of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain data, assigned during construction
    Value(ValueType),
    /// Identity of an entity, bound after the whole document is constructed
    EntityRef,
    /// Identity of a component with the given type tag
    ComponentRef(&'static str),
}

impl FieldKind {
    /// Whether the field holds an identity
    #[must_use]
    pub const fn is_reference(self) -> bool {
        !matches!(self, Self::Value(_))
    }
}

/// Error assigning a field value
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// The stored variant does not fit the field
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared field shape
        expected: &'static str,
        /// Variant found in the document
        found: &'static str,
    },

    /// The variant fits but the content does not
    #[error("{0}")]
    Invalid(String),
}

type Getter<C> = Box<dyn Fn(&C) -> FieldValue>;
type Setter<C> = Box<dyn Fn(&mut C, FieldValue) -> Result<(), FieldError>>;

/// One persisted field of component kind `C`
pub struct FieldDescriptor<C> {
    /// Field name in the document
    pub name: &'static str,
    /// Value or reference
    pub kind: FieldKind,
    get: Getter<C>,
    set: Setter<C>,
}

fn mismatch(expected: &'static str, found: &FieldValue) -> FieldError {
    FieldError::TypeMismatch {
        expected,
        found: found.kind_name(),
    }
}

impl<C: 'static> FieldDescriptor<C> {
    /// Read the field
    pub fn get(&self, component: &C) -> FieldValue {
        (self.get)(component)
    }

    /// Write the field
    pub fn set(&self, component: &mut C, value: FieldValue) -> Result<(), FieldError> {
        (self.set)(component, value)
    }

    /// Boolean field
    pub fn boolean(name: &'static str, get: fn(&C) -> bool, set: fn(&mut C, bool)) -> Self {
        Self {
            name,
            kind: FieldKind::Value(ValueType::Bool),
            get: Box::new(move |c| FieldValue::Bool(get(c))),
            set: Box::new(move |c, value| match value {
                FieldValue::Bool(v) => {
                    set(c, v);
                    Ok(())
                }
                other => Err(mismatch("Bool", &other)),
            }),
        }
    }

    /// Float field; integers are accepted and widened
    pub fn float(name: &'static str, get: fn(&C) -> f32, set: fn(&mut C, f32)) -> Self {
        Self {
            name,
            kind: FieldKind::Value(ValueType::Float),
            get: Box::new(move |c| FieldValue::Float(get(c))),
            set: Box::new(move |c, value| match value {
                FieldValue::Float(v) => {
                    set(c, v);
                    Ok(())
                }
                #[allow(clippy::cast_precision_loss)]
                FieldValue::Int(v) => {
                    set(c, v as f32);
                    Ok(())
                }
                other => Err(mismatch("Float", &other)),
            }),
        }
    }

    /// Text field; the setter may reject the content
    pub fn text(
        name: &'static str,
        get: fn(&C) -> String,
        set: fn(&mut C, String) -> Result<(), FieldError>,
    ) -> Self {
        Self {
            name,
            kind: FieldKind::Value(ValueType::Text),
            get: Box::new(move |c| FieldValue::Text(get(c))),
            set: Box::new(move |c, value| match value {
                FieldValue::Text(v) => set(c, v),
                other => Err(mismatch("Text", &other)),
            }),
        }
    }

    /// 3-vector field
    pub fn vec3(name: &'static str, get: fn(&C) -> Vec3, set: fn(&mut C, Vec3)) -> Self {
        Self {
            name,
            kind: FieldKind::Value(ValueType::Vec3),
            get: Box::new(move |c| FieldValue::Vec3(get(c).into())),
            set: Box::new(move |c, value| match value {
                FieldValue::Vec3(v) => {
                    set(c, Vec3::from(v));
                    Ok(())
                }
                other => Err(mismatch("Vec3", &other)),
            }),
        }
    }

    /// Rotation field
    pub fn quat(name: &'static str, get: fn(&C) -> Quat, set: fn(&mut C, Quat)) -> Self {
        Self {
            name,
            kind: FieldKind::Value(ValueType::Quat),
            get: Box::new(move |c| FieldValue::Quat(math::quat_to_xyzw(&get(c)))),
            set: Box::new(move |c, value| match value {
                FieldValue::Quat(v) => {
                    set(c, math::quat_from_xyzw(v));
                    Ok(())
                }
                other => Err(mismatch("Quat", &other)),
            }),
        }
    }

    /// Reference to an entity
    pub fn entity_ref(name: &'static str, get: fn(&C) -> EntityRef, set: fn(&mut C, EntityRef)) -> Self {
        Self {
            name,
            kind: FieldKind::EntityRef,
            get: Box::new(move |c| FieldValue::Ref(get(c).identity())),
            set: Box::new(move |c, value| match value {
                FieldValue::Ref(target) => {
                    set(c, target.map_or_else(EntityRef::none, EntityRef::to));
                    Ok(())
                }
                other => Err(mismatch("Ref", &other)),
            }),
        }
    }

    /// Reference to a component of the kind tagged `target`
    pub fn component_ref(
        name: &'static str,
        target: &'static str,
        get: fn(&C) -> ComponentRef,
        set: fn(&mut C, ComponentRef),
    ) -> Self {
        Self {
            name,
            kind: FieldKind::ComponentRef(target),
            get: Box::new(move |c| FieldValue::Ref(get(c).identity())),
            set: Box::new(move |c, value| match value {
                FieldValue::Ref(target) => {
                    set(c, target.map_or_else(ComponentRef::none, ComponentRef::to));
                    Ok(())
                }
                other => Err(mismatch("Ref", &other)),
            }),
        }
    }
}

/// A component kind that can be written to and read from scene documents
pub trait Persistable: Component + Default {
    /// Type tag stored in component records
    const TYPE_TAG: &'static str;

    /// The kind's persisted fields, in document order
    fn fields() -> Vec<FieldDescriptor<Self>>;
}

type ErasedGetter = Box<dyn Fn(&dyn Component) -> Option<FieldValue>>;
type ErasedSetter = Box<dyn Fn(&mut dyn Component, FieldValue) -> Result<(), FieldError>>;

/// Type-erased field descriptor
pub struct ErasedField {
    /// Field name in the document
    pub name: &'static str,
    /// Value or reference
    pub kind: FieldKind,
    get: ErasedGetter,
    set: ErasedSetter,
}

impl ErasedField {
    fn new<C: Persistable>(descriptor: FieldDescriptor<C>) -> Self {
        let FieldDescriptor { name, kind, get, set } = descriptor;
        Self {
            name,
            kind,
            get: Box::new(move |component: &dyn Component| component.as_any().downcast_ref::<C>().map(|c| get(c))),
            set: Box::new(move |component: &mut dyn Component, value: FieldValue| {
                let c = component
                    .as_any_mut()
                    .downcast_mut::<C>()
                    .ok_or_else(|| FieldError::Invalid(format!("component is not a {}", C::TYPE_TAG)))?;
                set(c, value)
            }),
        }
    }

    /// Read the field from a component of the registered kind
    #[must_use]
    pub fn get(&self, component: &dyn Component) -> Option<FieldValue> {
        (self.get)(component)
    }

    /// Write the field on a component of the registered kind
    pub fn set(&self, component: &mut dyn Component, value: FieldValue) -> Result<(), FieldError> {
        (self.set)(component, value)
    }
}

/// Registered component kind
pub struct ComponentKind {
    /// Type tag
    pub tag: &'static str,
    type_id: TypeId,
    construct: fn() -> Box<dyn Component>,
    fields: Vec<ErasedField>,
}

impl ComponentKind {
    /// Build a default instance
    #[must_use]
    pub fn construct(&self) -> Box<dyn Component> {
        (self.construct)()
    }

    /// Persisted fields in document order
    #[must_use]
    pub fn fields(&self) -> &[ErasedField] {
        &self.fields
    }

    /// Rust type of the kind
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// Table of every persistable component kind
#[derive(Default)]
pub struct ComponentRegistry {
    kinds: Vec<ComponentKind>,
    by_tag: HashMap<&'static str, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl ComponentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in kind
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register::<components::Camera>()
            .register::<components::MeshRenderer>()
            .register::<components::DirectionalLight>()
            .register::<components::PointLight>()
            .register::<components::CharacterMove>()
            .register::<components::BounceJump>()
            .register::<components::TriggerJump>()
            .register::<components::LightToggle>();
        registry
    }

    /// Register kind `C`; registering the same kind twice replaces it
    pub fn register<C: Persistable>(&mut self) -> &mut Self {
        let kind = ComponentKind {
            tag: C::TYPE_TAG,
            type_id: TypeId::of::<C>(),
            construct: || -> Box<dyn Component> { Box::new(C::default()) },
            fields: C::fields().into_iter().map(ErasedField::new).collect(),
        };
        if let Some(&index) = self.by_tag.get(C::TYPE_TAG) {
            self.kinds[index] = kind;
        } else {
            self.by_tag.insert(C::TYPE_TAG, self.kinds.len());
            self.by_type.insert(TypeId::of::<C>(), self.kinds.len());
            self.kinds.push(kind);
        }
        debug!("Registered component kind `{}`", C::TYPE_TAG);
        self
    }

    /// Look up a kind by type tag
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Option<&ComponentKind> {
        self.by_tag.get(tag).and_then(|index| self.kinds.get(*index))
    }

    /// Look up the kind of a live component
    #[must_use]
    pub fn kind_of(&self, component: &dyn Component) -> Option<&ComponentKind> {
        let type_id = std::any::Any::type_id(component.as_any());
        self.by_type.get(&type_id).and_then(|index| self.kinds.get(*index))
    }

    /// Number of registered kinds
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
