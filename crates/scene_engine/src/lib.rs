//! # Scene Engine
//!
//! A retained-mode scene-graph runtime.
//!
//! ## Features
//!
//! - **Entity Tree**: hierarchical transforms with lazy world matrices
//! - **Lifecycle Scheduling**: ordered spawn, enable, init, update and teardown hooks
//! - **Scene Persistence**: RON scene documents with identity-based references
//! - **Collaborators**: renderer, input and mesh-import seams
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ComponentRegistry::with_builtins();
//!     let serializer = SceneSerializer::new(&registry);
//!
//!     let mut world = World::new();
//!     let camera = world.spawn("Camera", world.root())?;
//!     world.add_component::<Camera>(camera)?;
//!     world.transform_mut(camera)?.set_position(Vec3::new(0.0, 2.0, -5.0));
//!
//!     let mut renderer = NullRenderer;
//!     for _ in 0..3 {
//!         world.frame(1.0 / 60.0, &mut renderer)?;
//!     }
//!
//!     serializer.save(&world, "scene.ron")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod ecs;
pub mod scene;
pub mod input;
pub mod render;
pub mod assets;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, WorldConfig},
        foundation::{
            identity::Identity,
            collections::{ComponentId, EntityId},
            math::{Vec3, Mat4, Quat, Pose},
            time::{GameTime, Timer},
        },
        ecs::{
            World, Entity, Component, Behaviour, HookContext, HookResult, HookError,
            EntityRef, ComponentRef, LifecycleState, WorldError,
            components::{
                Camera, Projection, MeshRenderer, BaseLight, DirectionalLight, PointLight,
                CharacterMove, BounceJump, TriggerJump, LightToggle,
            },
        },
        scene::{ComponentRegistry, Persistable, SceneDocument, SceneSerializer, SerializationError},
        input::{InputProvider, Key, NoInput, ScriptedInput},
        render::{Renderer, DrawCall, NullRenderer, RecordingRenderer, RenderError},
        assets::{AssetImporter, MeshRecord, ObjImporter},
    };
}
