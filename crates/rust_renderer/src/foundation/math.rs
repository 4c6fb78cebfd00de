//! Math utilities and types
//!
//! Provides the fundamental math types used by the renderer. Everything is
//! `f32` and column-vector based (`M * v`), the same convention the shaders use.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;

    /// Tolerance used by the camera and controller preconditions
    pub const EPSILON: f32 = f32::EPSILON;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Column-major array layout of a matrix, as GLSL `mat4` expects it
    pub fn to_cols_array_2d(matrix: &Mat4) -> [[f32; 4]; 4] {
        (*matrix).into()
    }

    /// Wrap an angle into `[0, TAU)`
    pub fn wrap_angle(radians: f32) -> f32 {
        radians.rem_euclid(constants::TAU)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_deg_rad_roundtrip() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI);
        assert_relative_eq!(utils::rad_to_deg(constants::HALF_PI), 90.0);
    }

    #[test]
    fn test_column_major_layout() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let cols = utils::to_cols_array_2d(&m);

        // Translation lives in the last column
        assert_eq!(cols[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(cols[0], [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(utils::wrap_angle(-constants::HALF_PI), 3.0 * constants::HALF_PI, epsilon = 1e-6);
        assert_relative_eq!(utils::wrap_angle(constants::TAU + 0.5), 0.5, epsilon = 1e-5);
    }
}
