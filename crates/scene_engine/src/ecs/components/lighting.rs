//! Light components
//!
//! [`DirectionalLight`] and [`PointLight`] embed a [`BaseLight`], so a
//! lookup for `BaseLight` finds either kind.

use std::any::{Any, TypeId};

use crate::ecs::Component;
use crate::foundation::math::Vec3;
use crate::scene::{FieldDescriptor, Persistable};

/// Color and intensity shared by every light kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseLight {
    /// RGB color, 0.0 to 1.0 per channel
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl Default for BaseLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

impl BaseLight {
    /// Color multiplied by intensity
    #[must_use]
    pub fn final_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// Parallel light, like sunlight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Shared light parameters
    pub base: BaseLight,
    /// Direction the light travels, in the entity's local space
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            base: BaseLight::default(),
            direction: Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

/// Omni light at the entity's position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// Shared light parameters
    pub base: BaseLight,
    /// Falloff range
    pub range: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            base: BaseLight::default(),
            range: 3.0,
        }
    }
}

macro_rules! light_component {
    ($light:ty, $tag:literal) => {
        impl Component for $light {
            fn type_tag(&self) -> &'static str {
                $tag
            }

            fn as_kind(&self, kind: TypeId) -> Option<&dyn Any> {
                if kind == TypeId::of::<BaseLight>() {
                    Some(&self.base)
                } else if kind == TypeId::of::<Self>() {
                    Some(self)
                } else {
                    None
                }
            }

            fn as_kind_mut(&mut self, kind: TypeId) -> Option<&mut dyn Any> {
                if kind == TypeId::of::<BaseLight>() {
                    Some(&mut self.base)
                } else if kind == TypeId::of::<Self>() {
                    Some(self)
                } else {
                    None
                }
            }
        }
    };
}

light_component!(DirectionalLight, "DirectionalLight");
light_component!(PointLight, "PointLight");

impl Persistable for DirectionalLight {
    const TYPE_TAG: &'static str = "DirectionalLight";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::vec3("color", |c| c.base.color, |c, v| c.base.color = v),
            FieldDescriptor::<Self>::float("intensity", |c| c.base.intensity, |c, v| c.base.intensity = v),
            FieldDescriptor::<Self>::vec3("direction", |c| c.direction, |c, v| c.direction = v),
        ]
    }
}

impl Persistable for PointLight {
    const TYPE_TAG: &'static str = "PointLight";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::<Self>::vec3("color", |c| c.base.color, |c, v| c.base.color = v),
            FieldDescriptor::<Self>::float("intensity", |c| c.base.intensity, |c, v| c.base.intensity = v),
            FieldDescriptor::<Self>::float("range", |c| c.range, |c, v| c.range = v),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_final_color_scales_by_intensity() {
        let light = BaseLight {
            color: Vec3::new(1.0, 0.5, 0.25),
            intensity: 2.0,
        };
        assert_relative_eq!(light.final_color(), Vec3::new(2.0, 1.0, 0.5));
    }

    #[test]
    fn test_lights_expose_their_base() {
        let mut point = PointLight::default();
        let base = point
            .as_kind(TypeId::of::<BaseLight>())
            .and_then(|any| any.downcast_ref::<BaseLight>());
        assert_eq!(base, Some(&BaseLight::default()));

        if let Some(base) = point
            .as_kind_mut(TypeId::of::<BaseLight>())
            .and_then(|any| any.downcast_mut::<BaseLight>())
        {
            base.intensity = 4.0;
        }
        assert_relative_eq!(point.base.intensity, 4.0);

        let directional = DirectionalLight::default();
        assert!(directional.as_kind(TypeId::of::<PointLight>()).is_none());
        assert!(directional.as_kind(TypeId::of::<DirectionalLight>()).is_some());
    }
}
