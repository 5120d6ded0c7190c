//! Mesh renderer component

use crate::ecs::Component;
use crate::render::DrawParams;
use crate::scene::{FieldDescriptor, Persistable};

/// Draws a mesh record with the owning entity's world matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRenderer {
    /// Mesh record path, as written by the asset importer
    pub mesh_path: String,
    /// Vertex shader path
    pub vertex_shader: String,
    /// Fragment shader path
    pub fragment_shader: String,
    /// Texture path, empty for none
    pub texture_path: String,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            mesh_path: String::new(),
            vertex_shader: "shaders/standard.vert".to_string(),
            fragment_shader: "shaders/standard.frag".to_string(),
            texture_path: String::new(),
        }
    }
}

impl MeshRenderer {
    /// Renderer for the mesh at `mesh_path` with the default shaders
    #[must_use]
    pub fn with_mesh(mesh_path: impl Into<String>) -> Self {
        Self {
            mesh_path: mesh_path.into(),
            ..Self::default()
        }
    }

    /// What the renderer collaborator receives for this mesh
    #[must_use]
    pub fn draw_params(&self) -> DrawParams {
        DrawParams {
            mesh_path: self.mesh_path.clone(),
            vertex_shader: self.vertex_shader.clone(),
            fragment_shader: self.fragment_shader.clone(),
            texture_path: self.texture_path.clone(),
        }
    }
}

impl Component for MeshRenderer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }
}

impl Persistable for MeshRenderer {
    const TYPE_TAG: &'static str = "MeshRenderer";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::text("mesh_path", |c| c.mesh_path.clone(), |c, v| {
                c.mesh_path = v;
                Ok(())
            }),
            FieldDescriptor::<Self>::text("vertex_shader", |c| c.vertex_shader.clone(), |c, v| {
                c.vertex_shader = v;
                Ok(())
            }),
            FieldDescriptor::<Self>::text("fragment_shader", |c| c.fragment_shader.clone(), |c, v| {
                c.fragment_shader = v;
                Ok(())
            }),
            FieldDescriptor::<Self>::text("texture_path", |c| c.texture_path.clone(), |c, v| {
                c.texture_path = v;
                Ok(())
            }),
        ]
    }
}
