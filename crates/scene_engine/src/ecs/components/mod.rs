//! Built-in component kinds
//!
//! Plain data components (camera, mesh renderer, lights) and the gameplay
//! behaviours shipped with the engine. Every kind here is persistable.

pub mod camera;
pub mod mesh_renderer;
pub mod lighting;
pub mod movement;
pub mod light_toggle;

pub use camera::{Camera, Projection};
pub use mesh_renderer::MeshRenderer;
pub use lighting::{BaseLight, DirectionalLight, PointLight};
pub use movement::{CharacterMove, BounceJump, TriggerJump};
pub use light_toggle::LightToggle;
