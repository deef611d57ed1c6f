//! Camera rig that drifts toward the hand or pointer.

use crate::config::Config;
use glam::{Mat4, Vec2, Vec3};

/// Smoothed camera always looking at the origin.
///
/// The camera sits at a fixed distance along +Z and pans in X/Y. Each frame it
/// moves a fraction of the way toward a target derived from the tracked hand,
/// or from the pointer when no hand is visible.
#[derive(Debug, Clone)]
pub struct CameraRig {
    /// Current world position.
    pub position: Vec3,
    smoothing: f32,
    hand_pan: Vec2,
    pointer_pan: Vec2,
    fov_y: f32,
}

impl CameraRig {
    pub fn new(config: &Config) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, config.camera_distance),
            smoothing: config.camera_smoothing,
            hand_pan: Vec2::from(config.hand_pan),
            pointer_pan: Vec2::from(config.pointer_pan),
            fov_y: config.fov_degrees.to_radians(),
        }
    }

    /// Pan target for the given inputs, both in `[-1, 1]²`.
    pub fn target(&self, hand: Option<Vec2>, pointer: Vec2) -> Vec2 {
        match hand {
            Some(h) => h * self.hand_pan,
            None => pointer * self.pointer_pan,
        }
    }

    /// Advance one frame.
    pub fn update(&mut self, hand: Option<Vec2>, pointer: Vec2) {
        let target = self.target(hand, pointer);
        self.position.x += (target.x - self.position.x) * self.smoothing;
        self.position.y += (target.y - self.position.y) * self.smoothing;
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    /// Perspective projection for the given aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 100.0)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// Camera-space right and up vectors in world space, for billboards.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = (-self.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_on_axis() {
        let rig = CameraRig::new(&Config::default());
        assert_eq!(rig.position, Vec3::new(0.0, 0.0, 18.0));
    }

    #[test]
    fn test_hand_overrides_pointer() {
        let rig = CameraRig::new(&Config::default());
        let pointer = Vec2::new(1.0, 1.0);
        assert_eq!(rig.target(None, pointer), Vec2::new(8.0, 4.0));
        assert_eq!(rig.target(Some(Vec2::new(0.5, -1.0)), pointer), Vec2::new(7.0, -7.0));
    }

    #[test]
    fn test_smoothing_converges_without_moving_z() {
        let mut rig = CameraRig::new(&Config::default());
        rig.update(None, Vec2::new(1.0, 0.0));
        assert!((rig.position.x - 0.4).abs() < 1e-6);
        for _ in 0..400 {
            rig.update(None, Vec2::new(1.0, 0.0));
        }
        assert!((rig.position.x - 8.0).abs() < 1e-3);
        assert_eq!(rig.position.z, 18.0);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let mut rig = CameraRig::new(&Config::default());
        rig.position = Vec3::new(4.0, 2.0, 18.0);
        let (right, up) = rig.basis();
        assert!((right.length() - 1.0).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
        assert!(right.dot(up).abs() < 1e-5);
        assert!(right.dot(rig.position).abs() < 1e-4);
    }
}
