//! First-person style movement driven by held keys
//!
//! The controller only needs to know which logical keys are held; the
//! windowing layer maps its own key codes onto [`MoveKey`].

use crate::foundation::math::{constants, utils, Vec3};
use crate::scene::transform::Transform;

/// Pitch is kept inside this range so the view never flips over the pole
pub const PITCH_LIMIT: f32 = 1.5;

/// Logical movement keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    /// Strafe left (A)
    MoveLeft,
    /// Strafe right (D)
    MoveRight,
    /// Move forward (W)
    MoveForward,
    /// Move backward (S)
    MoveBackward,
    /// Move up (E)
    MoveUp,
    /// Move down (Q)
    MoveDown,
    /// Turn left (Left arrow)
    LookLeft,
    /// Turn right (Right arrow)
    LookRight,
    /// Look up (Up arrow)
    LookUp,
    /// Look down (Down arrow)
    LookDown,
}

/// Source of held-key state
pub trait KeyInput {
    /// Whether the key is currently held down
    fn is_pressed(&self, key: MoveKey) -> bool;
}

/// Moves a transform in the XZ plane relative to its yaw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyboardMovementController {
    /// Translation speed in units per second
    pub move_speed: f32,
    /// Rotation speed in radians per second
    pub look_speed: f32,
}

impl Default for KeyboardMovementController {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            look_speed: 1.5,
        }
    }
}

impl KeyboardMovementController {
    /// Create a controller with explicit speeds
    pub fn new(move_speed: f32, look_speed: f32) -> Self {
        Self { move_speed, look_speed }
    }

    /// Apply one tick of held keys to `transform`
    pub fn move_in_plane_xz(&self, input: &dyn KeyInput, dt: f32, transform: &mut Transform) {
        let axis = |positive: MoveKey, negative: MoveKey| -> f32 {
            f32::from(u8::from(input.is_pressed(positive))) - f32::from(u8::from(input.is_pressed(negative)))
        };

        let rotate = Vec3::new(
            axis(MoveKey::LookUp, MoveKey::LookDown),
            axis(MoveKey::LookRight, MoveKey::LookLeft),
            0.0,
        );
        if rotate.norm_squared() > constants::EPSILON {
            transform.rotation += self.look_speed * dt * rotate.normalize();
        }

        transform.rotation.x = transform.rotation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        transform.rotation.y = utils::wrap_angle(transform.rotation.y);

        let yaw = transform.rotation.y;
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let right = Vec3::new(forward.z, 0.0, -forward.x);
        let up = Vec3::new(0.0, -1.0, 0.0);

        let direction = forward * axis(MoveKey::MoveForward, MoveKey::MoveBackward)
            + right * axis(MoveKey::MoveRight, MoveKey::MoveLeft)
            + up * axis(MoveKey::MoveUp, MoveKey::MoveDown);
        if direction.norm_squared() > constants::EPSILON {
            transform.translation += self.move_speed * dt * direction.normalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    #[derive(Default)]
    struct Held(HashSet<MoveKey>);

    impl Held {
        fn with(keys: &[MoveKey]) -> Self {
            Self(keys.iter().copied().collect())
        }
    }

    impl KeyInput for Held {
        fn is_pressed(&self, key: MoveKey) -> bool {
            self.0.contains(&key)
        }
    }

    #[test]
    fn test_no_keys_leaves_transform() {
        let controller = KeyboardMovementController::default();
        let mut transform = Transform::default().with_translation(Vec3::new(1.0, 2.0, 3.0));
        controller.move_in_plane_xz(&Held::default(), 0.5, &mut transform);

        assert_relative_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(transform.rotation, Vec3::zeros());
    }

    #[test]
    fn test_forward_follows_yaw() {
        let controller = KeyboardMovementController::new(2.0, 1.0);
        let mut transform = Transform::default();
        controller.move_in_plane_xz(&Held::with(&[MoveKey::MoveForward]), 0.5, &mut transform);
        assert_relative_eq!(transform.translation, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);

        let mut turned = Transform::default().with_rotation(Vec3::new(0.0, constants::HALF_PI, 0.0));
        controller.move_in_plane_xz(&Held::with(&[MoveKey::MoveForward]), 0.5, &mut turned);
        assert_relative_eq!(turned.translation, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let controller = KeyboardMovementController::default();
        let mut transform = Transform::default();
        let held = Held::with(&[MoveKey::MoveLeft, MoveKey::MoveRight, MoveKey::LookUp, MoveKey::LookDown]);
        controller.move_in_plane_xz(&held, 1.0, &mut transform);

        assert_relative_eq!(transform.translation, Vec3::zeros());
        assert_relative_eq!(transform.rotation, Vec3::zeros());
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let controller = KeyboardMovementController::new(1.0, 1.0);
        let mut transform = Transform::default();
        controller.move_in_plane_xz(&Held::with(&[MoveKey::MoveForward, MoveKey::MoveRight]), 1.0, &mut transform);

        assert_relative_eq!(transform.translation.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_up_is_negative_y() {
        let controller = KeyboardMovementController::new(1.0, 1.0);
        let mut transform = Transform::default();
        controller.move_in_plane_xz(&Held::with(&[MoveKey::MoveUp]), 1.0, &mut transform);

        assert_relative_eq!(transform.translation, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let controller = KeyboardMovementController::new(1.0, 10.0);
        let mut transform = Transform::default();
        controller.move_in_plane_xz(&Held::with(&[MoveKey::LookUp]), 1.0, &mut transform);
        assert_relative_eq!(transform.rotation.x, PITCH_LIMIT);

        controller.move_in_plane_xz(&Held::with(&[MoveKey::LookDown]), 1.0, &mut transform);
        controller.move_in_plane_xz(&Held::with(&[MoveKey::LookDown]), 1.0, &mut transform);
        assert_relative_eq!(transform.rotation.x, -PITCH_LIMIT);
    }

    #[test]
    fn test_yaw_wraps() {
        let controller = KeyboardMovementController::new(1.0, 1.0);
        let mut transform = Transform::default();
        controller.move_in_plane_xz(&Held::with(&[MoveKey::LookLeft]), 0.5, &mut transform);

        assert_relative_eq!(transform.rotation.y, constants::TAU - 0.5, epsilon = 1e-5);
    }
}
