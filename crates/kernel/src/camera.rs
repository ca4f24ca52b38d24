use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

const PLANAR_EPSILON: f32 = 1e-10;

/// First-person camera pose. Orientation is re-derived from yaw and pitch
/// whenever it is needed; the camera looks down `-Z` at zero yaw and pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl PlayerCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Yaw about world `+Y`, then pitch about the camera's local `+X`.
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Unit facing direction.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    /// Facing direction flattened onto the XZ plane. Zero when looking
    /// straight up or down.
    pub fn planar_forward(&self) -> Vec3 {
        let f = self.forward();
        let flat = Vec3::new(f.x, 0.0, f.z);
        if flat.length_squared() <= PLANAR_EPSILON {
            return Vec3::ZERO;
        }
        flat.normalize()
    }

    /// Unit vector pointing to the camera's left on the XZ plane.
    pub fn planar_left(&self) -> Vec3 {
        Vec3::Y.cross(self.planar_forward()).normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let cam = PlayerCamera::new(Vec3::ZERO);
        assert!(close(cam.forward(), Vec3::NEG_Z));
        assert!(close(cam.planar_left(), Vec3::NEG_X));
        assert!(close(cam.up(), Vec3::Y));
    }

    #[test]
    fn positive_yaw_turns_left() {
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        cam.yaw = FRAC_PI_2;
        assert!(close(cam.forward(), Vec3::NEG_X));
        assert!(close(cam.planar_left(), Vec3::Z));
    }

    #[test]
    fn pitch_does_not_tilt_planar_vectors() {
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        cam.pitch = 0.7;
        assert!(cam.forward().y > 0.0);
        assert!(close(cam.planar_forward(), Vec3::NEG_Z));
        assert!((cam.forward().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn looking_straight_up_has_no_planar_forward() {
        let mut cam = PlayerCamera::new(Vec3::ZERO);
        cam.pitch = FRAC_PI_2;
        assert_eq!(cam.planar_forward(), Vec3::ZERO);
        assert_eq!(cam.planar_left(), Vec3::ZERO);
    }
}
