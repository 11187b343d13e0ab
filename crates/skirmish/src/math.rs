//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. The [`Transform`] type provides position, rotation,
//! and scale for every entity; tanks stack a body and a turret transform on
//! top of their root.
//!
//! ## Axes
//!
//! Entities face local **+Z**, with +X to their right and +Y up. A positive
//! rotation about Y turns the facing toward the right. Cameras built with
//! [`Transform::looking_at`] follow glam's right-handed view convention instead.

pub use glam::{EulerRot, Mat4, Quat, Vec3};

use fastrand::Rng;

/// A 3D transform: position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Build from a position, Euler angles in radians (applied Y, then X,
    /// then Z) and a per-axis scale.
    pub fn from_placement(translation: Vec3, euler: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::from_euler(EulerRot::YXZ, euler.y, euler.x, euler.z),
            scale,
        }
    }

    /// Orient a camera at this position toward `target`. Tanks use it for
    /// their chase camera.
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let look = Mat4::look_at_rh(self.translation, target, up);
        let (_, rot, _) = look.inverse().to_scale_rotation_translation();
        self.rotation = rot;
        self
    }

    /// Compute the 4x4 model matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Unit facing direction (local +Z).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Unit right direction (local +X).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Turn about the local Y axis. Positive angles turn right.
    pub fn rotate_local_y(&mut self, radians: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_y(radians)).normalize();
    }

    /// Move along the facing direction, ignoring scale.
    pub fn move_local_z(&mut self, distance: f32) {
        self.translation += self.forward() * distance;
    }

    /// Turn about world Y so the facing points at `target` in the XZ plane.
    /// Pitch and roll are discarded. Does nothing if the target is directly
    /// above or below.
    pub fn face_flat(&mut self, target: Vec3) {
        if let Some(yaw) = yaw_towards(self.translation, target) {
            self.rotation = Quat::from_rotation_y(yaw);
        }
    }

    /// Point the facing straight at `target`, pitch included.
    pub fn face(&mut self, target: Vec3) {
        let dir = target - self.translation;
        if dir.length_squared() > f32::EPSILON {
            self.rotation = Quat::from_rotation_arc(Vec3::Z, dir.normalize());
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// World yaw (radians about +Y) that makes +Z point from `from` toward `to`.
pub fn yaw_towards(from: Vec3, to: Vec3) -> Option<f32> {
    let d = to - from;
    if d.x * d.x + d.z * d.z <= f32::EPSILON {
        return None;
    }
    Some(d.x.atan2(d.z))
}

/// Uniform float between `a` and `b`. The bounds may come in either order.
pub fn random_range(rng: &mut Rng, a: f32, b: f32) -> f32 {
    a + (b - a) * rng.f32()
}

/// Uniform integer between `a` and `b` inclusive. The bounds may come in either order.
pub fn random_u32(rng: &mut Rng, a: u32, b: u32) -> u32 {
    rng.u32(a.min(b)..=a.max(b))
}

/// Uniform offset in `[-half, +half]` per axis.
pub fn random_spread(rng: &mut Rng, half: Vec3) -> Vec3 {
    Vec3::new(
        random_range(rng, -half.x, half.x),
        random_range(rng, -half.y, half.y),
        random_range(rng, -half.z, half.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 0.001
    }

    #[test]
    fn positive_yaw_turns_right() {
        let mut t = Transform::IDENTITY;
        t.rotate_local_y(FRAC_PI_2);
        assert!(close(t.forward(), Vec3::X));
        assert!(close(t.right(), Vec3::NEG_Z));
    }

    #[test]
    fn move_local_z_follows_facing() {
        let mut t = Transform::from_xyz(1.0, 0.0, 1.0);
        t.rotate_local_y(FRAC_PI_2);
        t.move_local_z(3.0);
        assert!(close(t.translation, Vec3::new(4.0, 0.0, 1.0)));
    }

    #[test]
    fn face_flat_ignores_height() {
        let mut t = Transform::IDENTITY;
        t.face_flat(Vec3::new(-10.0, 50.0, 0.0));
        assert!(close(t.forward(), Vec3::NEG_X));
    }

    #[test]
    fn face_points_with_pitch() {
        let mut t = Transform::from_xyz(0.0, 0.0, 0.0);
        t.face(Vec3::new(0.0, 10.0, 10.0));
        assert!(close(t.forward(), Vec3::new(0.0, 1.0, 1.0).normalize()));
    }

    #[test]
    fn yaw_towards_degenerate_is_none() {
        assert!(yaw_towards(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0)).is_none());
    }

    #[test]
    fn random_range_stays_between_bounds() {
        let mut rng = Rng::with_seed(7);
        for _ in 0..100 {
            let v = random_range(&mut rng, 10.0, 5.0);
            assert!((5.0..=10.0).contains(&v));
        }
    }

    #[test]
    fn random_u32_accepts_reversed_bounds() {
        let mut rng = Rng::with_seed(3);
        for _ in 0..50 {
            assert!((25..=100).contains(&random_u32(&mut rng, 100, 25)));
        }
    }

    #[test]
    fn matrix_places_origin_at_translation() {
        let t = Transform {
            scale: Vec3::splat(2.0),
            ..Transform::from_xyz(1.0, 2.0, 3.0)
        };
        let p = t.matrix().transform_point3(Vec3::ZERO);
        assert!(close(p, Vec3::new(1.0, 2.0, 3.0)));
    }
}
