//! Camera component

use std::fmt;
use std::str::FromStr;

use log::warn;
use nalgebra::{Orthographic3, Perspective3};

use crate::ecs::Component;
use crate::foundation::math::{utils, Mat4};
use crate::scene::{FieldDescriptor, FieldError, Persistable};

/// Projection model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Perspective projection driven by the vertical field of view
    #[default]
    Perspective,
    /// Parallel projection driven by the orthographic half height
    Orthographic,
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perspective => f.write_str("Perspective"),
            Self::Orthographic => f.write_str("Orthographic"),
        }
    }
}

impl FromStr for Projection {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Perspective" => Ok(Self::Perspective),
            "Orthographic" => Ok(Self::Orthographic),
            other => Err(FieldError::Invalid(format!("unknown projection `{other}`"))),
        }
    }
}

/// Camera looking down its entity's transform
///
/// The view matrix is the owning entity's world-to-local matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Projection model
    pub projection: Projection,
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Half height of the orthographic view volume
    pub orthographic_size: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective,
            field_of_view: 60.0,
            near: 0.1,
            far: 1000.0,
            orthographic_size: 5.0,
        }
    }
}

impl Camera {
    /// View-to-clip matrix for a render target of the given aspect ratio
    ///
    /// Degenerate parameters yield the identity matrix.
    #[must_use]
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let depth = self.far - self.near;
        if aspect_ratio <= f32::EPSILON || depth.abs() <= f32::EPSILON || self.near <= 0.0 {
            warn!("Degenerate camera parameters, using identity projection");
            return Mat4::identity();
        }
        match self.projection {
            Projection::Perspective => {
                let fov = utils::deg_to_rad(self.field_of_view);
                if fov <= f32::EPSILON {
                    warn!("Non-positive field of view, using identity projection");
                    return Mat4::identity();
                }
                Perspective3::new(aspect_ratio, fov, self.near, self.far).to_homogeneous()
            }
            Projection::Orthographic => {
                let half_height = self.orthographic_size;
                if half_height <= f32::EPSILON {
                    warn!("Non-positive orthographic size, using identity projection");
                    return Mat4::identity();
                }
                let half_width = half_height * aspect_ratio;
                Orthographic3::new(-half_width, half_width, -half_height, half_height, self.near, self.far)
                    .to_homogeneous()
            }
        }
    }
}

impl Component for Camera {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }
}

impl Persistable for Camera {
    const TYPE_TAG: &'static str = "Camera";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::text(
                "projection",
                |c| c.projection.to_string(),
                |c, v| {
                    c.projection = v.parse()?;
                    Ok(())
                },
            ),
            FieldDescriptor::<Self>::float("field_of_view", |c| c.field_of_view, |c, v| c.field_of_view = v),
            FieldDescriptor::<Self>::float("near", |c| c.near, |c, v| c.near = v),
            FieldDescriptor::<Self>::float("far", |c| c.far, |c, v| c.far = v),
            FieldDescriptor::<Self>::float("orthographic_size", |c| c.orthographic_size, |c, v| c.orthographic_size = v),
        ]
    }
}
