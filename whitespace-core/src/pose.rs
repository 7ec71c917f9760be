//! Rigid poses and angle helpers.
//!
//! Yaw turns about +Y (positive yaw swings +Z toward +X), pitch about +X.
//! Euler angles are composed in YXZ order and expressed in degrees.

use bevy_math::{EulerRot, Quat, Vec3};

/// Position plus rotation in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// A pose with only a yaw rotation.
    pub fn from_yaw(position: Vec3, yaw: f32) -> Self {
        Self::new(position, euler_rotation(yaw, 0.0, 0.0))
    }

    /// Euler angles `(yaw, pitch, roll)` in degrees.
    pub fn euler(&self) -> (f32, f32, f32) {
        let (yaw, pitch, roll) = self.rotation.to_euler(EulerRot::YXZ);
        (yaw.to_degrees(), pitch.to_degrees(), roll.to_degrees())
    }

    pub fn yaw(&self) -> f32 {
        self.euler().0
    }

    /// The rotation with pitch and roll stripped.
    pub fn yaw_only(&self) -> Quat {
        euler_rotation(self.yaw(), 0.0, 0.0)
    }

    /// Map a point from this pose's local frame to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Place a local pose inside this one.
    pub fn compose(&self, local: Pose) -> Pose {
        Pose {
            position: self.transform_point(local.position),
            rotation: self.rotation * local.rotation,
        }
    }
}

/// Build a rotation from yaw, pitch and roll in degrees.
pub fn euler_rotation(yaw: f32, pitch: f32, roll: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw.to_radians(),
        pitch.to_radians(),
        roll.to_radians(),
    )
}

/// Interpolate between two angles in degrees along the shorter arc.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = (to - from).rem_euclid(360.0);
    let delta = if delta > 180.0 { delta - 360.0 } else { delta };
    from + delta * t.clamp(0.0, 1.0)
}

/// Angular distance between two angles in degrees, in `[0, 180]`.
pub fn angle_delta(a: f32, b: f32) -> f32 {
    let d = (b - a).rem_euclid(360.0);
    d.min(360.0 - d)
}
