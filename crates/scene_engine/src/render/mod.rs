//! Renderer collaborator
//!
//! The world hands a [`Renderer`] one [`DrawCall`] per visible mesh per
//! frame, after the transform refresh, bracketed by `begin_frame` and
//! `end_frame`. Shader compilation, buffer upload and the actual draw live
//! behind this trait.

use log::debug;

use crate::ecs::components::{Camera, DirectionalLight, PointLight};
use crate::ecs::{LifecycleState, World};
use crate::foundation::collections::EntityId;
use crate::foundation::math::{Mat4, Vec3};

/// Renderer errors
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// The backend failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// A mesh could not be found or loaded
    #[error("Mesh not available: {0}")]
    MissingMesh(String),
}

/// Asset paths a mesh renderer draws with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawParams {
    /// Mesh record path
    pub mesh_path: String,
    /// Vertex shader path
    pub vertex_shader: String,
    /// Fragment shader path
    pub fragment_shader: String,
    /// Texture path, empty for none
    pub texture_path: String,
}

/// One mesh submission
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Entity owning the mesh renderer
    pub entity: EntityId,
    /// Finalized local-to-world matrix
    pub world_matrix: Mat4,
    /// What to draw
    pub params: DrawParams,
}

/// Light contribution for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightParams {
    /// Parallel light along a world-space direction
    Directional {
        /// World-space direction the light travels
        direction: Vec3,
        /// Color already multiplied by intensity
        color: Vec3,
    },
    /// Omni light with a falloff range
    Point {
        /// World position
        position: Vec3,
        /// Falloff range
        range: f32,
        /// Color already multiplied by intensity
        color: Vec3,
    },
}

/// Per-frame state shared by every draw call
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    /// Entity of the camera in use, if any
    pub camera: Option<EntityId>,
    /// World-to-view matrix
    pub view: Mat4,
    /// View-to-clip matrix
    pub projection: Mat4,
    /// Enabled lights in the active tree
    pub lights: Vec<LightParams>,
}

/// Rendering backend
pub trait Renderer {
    /// Width over height of the render target
    fn aspect_ratio(&self) -> f32 {
        16.0 / 9.0
    }

    /// Called once per frame before any draw
    fn begin_frame(&mut self, _frame: &FrameContext) -> Result<(), RenderError> {
        Ok(())
    }

    /// Submit one mesh
    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError>;

    /// Called once per frame after the last draw
    fn end_frame(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Renderer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _call: &DrawCall) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Renderer that keeps every frame and draw call it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    /// Frame contexts, in order
    pub frames: Vec<FrameContext>,
    /// Draw calls, in order
    pub calls: Vec<DrawCall>,
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self, frame: &FrameContext) -> Result<(), RenderError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        self.calls.push(call.clone());
        Ok(())
    }
}

/// Gather the first camera and every light from running, enabled components
pub(crate) fn frame_context(world: &World, order: &[EntityId], aspect_ratio: f32) -> FrameContext {
    let mut frame = FrameContext {
        camera: None,
        view: Mat4::identity(),
        projection: Mat4::identity(),
        lights: Vec::new(),
    };

    for entity in order {
        let Some(transform) = world.transform(*entity) else { continue };
        for id in world.component_ids(*entity) {
            let running = world
                .component_slot(id)
                .is_some_and(|slot| slot.is_enabled() && slot.state() == LifecycleState::Running);
            if !running {
                continue;
            }
            if let Some(camera) = world.component::<Camera>(id) {
                if frame.camera.is_none() {
                    frame.camera = Some(*entity);
                    frame.view = transform.world_to_local_matrix();
                    frame.projection = camera.projection_matrix(aspect_ratio);
                }
            } else if let Some(light) = world.component::<DirectionalLight>(id) {
                frame.lights.push(LightParams::Directional {
                    direction: transform.transform_direction(&light.direction),
                    color: light.base.final_color(),
                });
            } else if let Some(light) = world.component::<PointLight>(id) {
                frame.lights.push(LightParams::Point {
                    position: transform.position(),
                    range: light.range,
                    color: light.base.final_color(),
                });
            }
        }
    }

    if frame.camera.is_none() {
        debug!("No running camera in the active tree");
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_renderer_keeps_calls() {
        let mut world = World::new();
        let entity = world.create_entity("mesh");
        let mut renderer = RecordingRenderer::default();
        let call = DrawCall {
            entity,
            world_matrix: Mat4::identity(),
            params: DrawParams {
                mesh_path: "cube.ron".to_string(),
                ..DrawParams::default()
            },
        };
        renderer.draw(&call).expect("draw");
        assert_eq!(renderer.calls, vec![call]);
        assert!(renderer.end_frame().is_ok());
    }
}
