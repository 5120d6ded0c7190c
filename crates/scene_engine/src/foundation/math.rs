//! Math utilities and types
//!
//! Provides fundamental math types for 3D scene work. All arithmetic is
//! delegated to `nalgebra`.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Position, rotation and scale triple
///
/// Used both for the local values a transform owns and for the world values
/// it caches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// The identity pose
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Convert to a translation * rotation * scale matrix
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Re-normalize a rotation so accumulated drift never reaches storage
#[must_use]
pub fn normalized(rotation: Quat) -> Quat {
    Quat::new_normalize(rotation.into_inner())
}

/// Build a rotation from `[x, y, z, w]` components, normalizing on the way in
#[must_use]
pub fn quat_from_xyzw(xyzw: [f32; 4]) -> Quat {
    let [x, y, z, w] = xyzw;
    let raw = Quaternion::new(w, x, y, z);
    if raw.norm_squared() <= f32::EPSILON {
        Quat::identity()
    } else {
        Quat::new_normalize(raw)
    }
}

/// Rotation components in `[x, y, z, w]` order
#[must_use]
pub fn quat_to_xyzw(rotation: &Quat) -> [f32; 4] {
    let q = rotation.quaternion();
    [q.i, q.j, q.k, q.w]
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec3};

    /// Convert degrees to radians
    #[must_use]
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation between two vectors
    #[must_use]
    pub fn lerp_vec3(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    /// Component-wise division that maps a zero divisor to zero
    #[must_use]
    pub fn safe_component_div(value: &Vec3, divisor: &Vec3) -> Vec3 {
        value.zip_map(divisor, |v, d| if d == 0.0 { 0.0 } else { v / d })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pose_matrix_applies_scale_then_rotation_then_translation() {
        let pose = Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), constants::PI / 2.0),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let point = pose.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        // (1,0,0) scaled to (2,0,0), rotated about Y to (0,0,-2), then translated.
        assert_relative_eq!(point.coords, Vec3::new(1.0, 2.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_quat_array_order_is_xyzw() {
        let rotation = Quat::from_axis_angle(&Vec3::x_axis(), 0.5);
        let back = quat_from_xyzw(quat_to_xyzw(&rotation));
        assert_relative_eq!(back.angle_to(&rotation), 0.0, epsilon = 1e-5);
        assert_relative_eq!(quat_to_xyzw(&Quat::identity())[3], 1.0);
    }

    #[test]
    fn test_quat_from_unnormalized_input() {
        let rotation = quat_from_xyzw([0.0, 0.0, 0.0, 4.0]);
        assert_relative_eq!(rotation.quaternion().norm(), 1.0, epsilon = 1e-6);
        assert_eq!(quat_from_xyzw([0.0; 4]), Quat::identity());
    }

    #[test]
    fn test_safe_component_div() {
        let result = utils::safe_component_div(&Vec3::new(4.0, 3.0, 1.0), &Vec3::new(2.0, 0.0, -1.0));
        assert_relative_eq!(result, Vec3::new(2.0, 0.0, -1.0));
    }
}
