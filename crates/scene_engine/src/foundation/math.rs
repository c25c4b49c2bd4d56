//! Math utilities and types
//!
//! Provides the math types shared by the scene graph, the cameras and the
//! graphics device boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type, also used for RGBA colours
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// RGBA colour with channels in `0.0..=1.0`
pub type Color = Vec4;

/// Returns true if every coordinate of the point is exactly zero
///
/// Zero points are treated as "no translation" and skip the device call.
pub fn is_origin(point: &Point3) -> bool {
    point.x == 0.0 && point.y == 0.0 && point.z == 0.0
}

/// Four-component rotation in degrees
///
/// `x`, `y` and `z` are applied as three ordered axis rotations (X, then Y,
/// then Z). `w` is carried along for devices that interpret the rotation as
/// axis-angle; it takes part in the identity check but is never applied by
/// the scene graph itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Rotation about the X axis, in degrees
    pub x: f32,
    /// Rotation about the Y axis, in degrees
    pub y: f32,
    /// Rotation about the Z axis, in degrees
    pub z: f32,
    /// Fourth component
    pub w: f32,
}

impl Rotation {
    /// The all-zero rotation
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };

    /// Create a rotation from its four components
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create a rotation from the three axis angles, with `w = 0`
    pub const fn from_euler_degrees(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 0.0 }
    }

    /// Returns true if all four components are zero
    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0 && self.w == 0.0
    }

    /// The three axis rotations in application order, as `(angle, axis)`
    pub fn axis_steps(&self) -> [(f32, Vec3); 3] {
        [
            (self.x, Vec3::x()),
            (self.y, Vec3::y()),
            (self.z, Vec3::z()),
        ]
    }

    /// Equivalent rotation matrix (X, then Y, then Z, post-multiplied)
    pub fn to_matrix(&self) -> Mat4 {
        self.axis_steps()
            .iter()
            .fold(Mat4::identity(), |acc, (angle, axis)| acc * Mat4::rotation_degrees(*angle, axis))
    }

    /// The rotation as a direction vector (used for spot light directions)
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x, self.y, self.z, self.w)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with fixed-function style constructors
pub trait Mat4Ext {
    /// Rotation of `degrees` about an arbitrary axis (normalized internally)
    ///
    /// A zero axis yields the identity, matching what fixed-function
    /// pipelines do with a degenerate rotate call.
    fn rotation_degrees(degrees: f32, axis: &Vec3) -> Mat4;

    /// Translation matrix
    fn translation(offset: &Vec3) -> Mat4;

    /// Right-handed perspective projection with a vertical field of view in degrees
    fn perspective_degrees(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_degrees(degrees: f32, axis: &Vec3) -> Mat4 {
        match nalgebra::Unit::try_new(*axis, f32::EPSILON) {
            Some(unit) => Mat4::from_axis_angle(&unit, utils::deg_to_rad(degrees)),
            None => Mat4::identity(),
        }
    }

    fn translation(offset: &Vec3) -> Mat4 {
        Mat4::new_translation(offset)
    }

    fn perspective_degrees(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // gluPerspective layout; aspect here is width / height of the viewport
        let f = 1.0 / (utils::deg_to_rad(fov_y) * 0.5).tan();
        let mut result = Mat4::zeros();
        result[(0, 0)] = f / aspect;
        result[(1, 1)] = f;
        result[(2, 2)] = (far + near) / (near - far);
        result[(2, 3)] = (2.0 * far * near) / (near - far);
        result[(3, 2)] = -1.0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_identity() {
        assert!(Rotation::IDENTITY.is_identity());
        assert!(Rotation::default().is_identity());
        assert!(!Rotation::new(0.0, 0.0, 0.0, 1.0).is_identity());
        assert!(!Rotation::from_euler_degrees(0.0, 90.0, 0.0).is_identity());
    }

    #[test]
    fn test_rotation_matrix_order() {
        // 90 degrees about X then 90 about Y: expected = Rx * Ry
        let rot = Rotation::from_euler_degrees(90.0, 90.0, 0.0);
        let expected = Mat4::rotation_degrees(90.0, &Vec3::x()) * Mat4::rotation_degrees(90.0, &Vec3::y());
        assert_relative_eq!(rot.to_matrix(), expected, epsilon = 1e-6);

        let p = rot.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_axis_is_identity() {
        assert_eq!(Mat4::rotation_degrees(45.0, &Vec3::zeros()), Mat4::identity());
    }

    #[test]
    fn test_is_origin() {
        assert!(is_origin(&Point3::origin()));
        assert!(!is_origin(&Point3::new(0.0, -0.5, 0.0)));
    }

    #[test]
    fn test_rotation_display() {
        assert_eq!(Rotation::new(1.0, 2.5, 0.0, 0.0).to_string(), "[1, 2.5, 0, 0]");
    }
}
