//! # 3D Camera
//!
//! Produces the view and projection matrices consumed by the render systems.
//! The camera owns no GPU resources.
//!
//! ## Conventions
//! - Column vectors: a point is transformed as `projection * view * p`
//! - Vulkan clip space: depth in `[0, 1]`, Y pointing down
//! - View space looks down `+Z`, so [`Camera::DEFAULT_UP`] is `-Y`
//!
//! View matrices are rebuilt from an explicit orthonormal basis rather than a
//! generic look-at helper so the Euler form can share the exact rotation order
//! used by [`Transform`](crate::scene::transform::Transform).

use crate::foundation::math::{constants, Mat4, Vec3};

/// 3D Camera holding a view and a projection matrix
///
/// Both matrices start as identity. Call one of the projection setters and
/// one of the view setters before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Up direction for view setters when the scene uses the Y-down convention
    pub const DEFAULT_UP: Vec3 = Vec3::new(0.0, -1.0, 0.0);

    /// Camera with identity view and projection
    pub fn new() -> Self {
        Self {
            projection: Mat4::identity(),
            view: Mat4::identity(),
        }
    }

    /// Set an orthographic projection for the given view volume
    ///
    /// # Arguments
    /// * `left`, `right` - X extent of the view volume
    /// * `top`, `bottom` - Y extent; `top` maps to clip Y of -1
    /// * `near`, `far` - Z extent, mapped to depth 0 and 1
    ///
    /// # Panics
    /// Panics if any of the extents is empty.
    pub fn set_orthographic_projection(&mut self, left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) {
        assert!(right != left, "orthographic projection needs right != left");
        assert!(bottom != top, "orthographic projection needs bottom != top");
        assert!(far != near, "orthographic projection needs far != near");

        let mut projection = Mat4::identity();
        projection[(0, 0)] = 2.0 / (right - left);
        projection[(1, 1)] = 2.0 / (bottom - top);
        projection[(2, 2)] = 1.0 / (far - near);
        projection[(0, 3)] = -(right + left) / (right - left);
        projection[(1, 3)] = -(bottom + top) / (bottom - top);
        projection[(2, 3)] = -near / (far - near);
        self.projection = projection;
    }

    /// Set a perspective projection
    ///
    /// # Arguments
    /// * `fovy` - Vertical field of view in radians, in `(0, PI)`
    /// * `aspect` - Viewport width over height
    /// * `near` - Distance to the near plane, mapped to depth 0
    /// * `far` - Distance to the far plane, mapped to depth 1
    ///
    /// # Panics
    /// Panics unless `0 < fovy < PI`, `aspect > 0` and `0 < near < far`.
    pub fn set_perspective_projection(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        assert!(
            fovy > 0.0 && fovy < constants::PI,
            "perspective projection needs a field of view in (0, PI), got {}",
            fovy
        );
        assert!(
            aspect > constants::EPSILON,
            "perspective projection needs a positive aspect ratio, got {}",
            aspect
        );
        assert!(
            near > 0.0 && far > near,
            "perspective projection needs 0 < near < far, got near={} far={}",
            near,
            far
        );

        let tan_half_fovy = (fovy / 2.0).tan();
        let mut projection = Mat4::zeros();
        projection[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        projection[(1, 1)] = 1.0 / tan_half_fovy;
        projection[(2, 2)] = far / (far - near);
        projection[(3, 2)] = 1.0;
        projection[(2, 3)] = -(far * near) / (far - near);
        self.projection = projection;
    }

    /// Look from `position` along `direction`
    ///
    /// # Panics
    /// Panics if `direction` is (nearly) zero or (nearly) parallel to `up`.
    pub fn set_view_direction(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
        assert!(
            direction.norm_squared() > constants::EPSILON,
            "view direction must not be zero"
        );
        let w = direction.normalize();
        let side = w.cross(&up);
        assert!(
            side.norm_squared() > constants::EPSILON,
            "view direction {:?} is parallel to up {:?}",
            direction,
            up
        );
        let u = side.normalize();
        let v = w.cross(&u);

        self.set_view_basis(position, u, v, w);
    }

    /// Look from `position` at `target`
    ///
    /// # Panics
    /// Panics if `target` coincides with `position` or the direction to it is
    /// parallel to `up`.
    pub fn set_view_target(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.set_view_direction(position, target - position, up);
    }

    /// View from `position` with Euler `rotation` applied Y, then X, then Z
    ///
    /// This is the inverse of the model matrix of a transform with the same
    /// translation and rotation, so a camera can follow a scene object.
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let (s1, c1) = rotation.y.sin_cos();
        let (s2, c2) = rotation.x.sin_cos();
        let (s3, c3) = rotation.z.sin_cos();

        let u = Vec3::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1);
        let v = Vec3::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3);
        let w = Vec3::new(c2 * s1, -s2, c1 * c2);

        self.set_view_basis(position, u, v, w);
    }

    fn set_view_basis(&mut self, position: Vec3, u: Vec3, v: Vec3, w: Vec3) {
        let mut view = Mat4::identity();
        for (row, axis) in [u, v, w].iter().enumerate() {
            view[(row, 0)] = axis.x;
            view[(row, 1)] = axis.y;
            view[(row, 2)] = axis.z;
            view[(row, 3)] = -axis.dot(&position);
        }
        self.view = view;
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// View matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// `projection * view`
    pub fn projection_view(&self) -> Mat4 {
        self.projection * self.view
    }
}
