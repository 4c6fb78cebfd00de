//! Object transform
//!
//! Position, Euler rotation and scale of a renderable object, and the model
//! matrix built from them. Rotations are Tait-Bryan angles applied in Y, X, Z
//! order, so the matrix is `T * Ry * Rx * Rz * S`. The matrix is written out
//! column by column instead of multiplying five matrices every frame.

use crate::foundation::math::{Mat3, Mat4, Vec3, Vec4};

/// Translation, rotation and scale of an object in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World space position
    pub translation: Vec3,

    /// Euler angles in radians, applied Y first, then X, then Z
    pub rotation: Vec3,

    /// Per-axis scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Set the translation
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Set the Euler rotation
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the per-axis scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set a uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Model matrix `translate * Ry * Rx * Rz * scale`
    pub fn mat4(&self) -> Mat4 {
        let (s1, c1) = self.rotation.y.sin_cos();
        let (s2, c2) = self.rotation.x.sin_cos();
        let (s3, c3) = self.rotation.z.sin_cos();

        let x_axis = Vec4::new(
            c1 * c3 + s1 * s2 * s3,
            c2 * s3,
            c1 * s2 * s3 - c3 * s1,
            0.0,
        ) * self.scale.x;
        let y_axis = Vec4::new(
            c3 * s1 * s2 - c1 * s3,
            c2 * c3,
            c1 * c3 * s2 + s1 * s3,
            0.0,
        ) * self.scale.y;
        let z_axis = Vec4::new(c2 * s1, -s2, c1 * c2, 0.0) * self.scale.z;
        let w_axis = self.translation.push(1.0);

        Mat4::from_columns(&[x_axis, y_axis, z_axis, w_axis])
    }

    /// Matrix for transforming normals: the inverse-transpose of the model's
    /// upper 3x3, which for `R * S` is `R * S^-1`
    pub fn normal_matrix(&self) -> Mat3 {
        let (s1, c1) = self.rotation.y.sin_cos();
        let (s2, c2) = self.rotation.x.sin_cos();
        let (s3, c3) = self.rotation.z.sin_cos();
        let inv_scale = self.scale.map(|s| 1.0 / s);

        let x_axis = Vec3::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1) * inv_scale.x;
        let y_axis = Vec3::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3) * inv_scale.y;
        let z_axis = Vec3::new(c2 * s1, -s2, c1 * c2) * inv_scale.z;

        Mat3::from_columns(&[x_axis, y_axis, z_axis])
    }
}
