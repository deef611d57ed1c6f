//! Keyboard-driven stand-in for a hand-pose model.
//!
//! [`SimulatedHand`] implements [`HandLandmarkModel`] by synthesizing a
//! plausible 21-point hand in image space from a pose set elsewhere (usually
//! the window's key handler). Clones share the same pose, so one copy can
//! live on the detection thread while another is driven by input.

use crate::detection::HandLandmarkModel;
use crate::error::ModelError;
use crate::gesture::{FingerPose, HandLandmarks, FINGER_JOINTS, LANDMARK_COUNT, WRIST};
use crate::video::VideoFrame;
use glam::{Vec2, Vec3};
use std::sync::{Arc, Mutex};

/// What the simulated hand is doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedPose {
    /// `None` means no hand in view.
    pub fingers: Option<FingerPose>,
    /// Wrist position in `[0, 1]²` image coordinates (`y` down).
    pub wrist: Vec2,
}

impl Default for SimulatedPose {
    fn default() -> Self {
        Self {
            fingers: None,
            wrist: Vec2::new(0.5, 0.7),
        }
    }
}

/// Shared, cheaply cloneable simulated model.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHand {
    pose: Arc<Mutex<SimulatedPose>>,
}

impl SimulatedHand {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_pose<T>(&self, f: impl FnOnce(&mut SimulatedPose) -> T) -> T {
        let mut pose = self.pose.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut pose)
    }

    pub fn pose(&self) -> SimulatedPose {
        self.with_pose(|p| *p)
    }

    /// Show a hand with the given fingers, or hide it with `None`.
    pub fn set_fingers(&self, fingers: Option<FingerPose>) {
        self.with_pose(|p| p.fingers = fingers);
    }

    /// Move the wrist; coordinates are clamped to the frame.
    pub fn set_wrist(&self, wrist: Vec2) {
        self.with_pose(|p| p.wrist = wrist.clamp(Vec2::ZERO, Vec2::ONE));
    }

    /// Landmarks for `pose` in a `width × height` frame.
    pub fn synthesize(pose: &SimulatedPose, width: u32, height: u32) -> Option<HandLandmarks> {
        let fingers = pose.fingers?;
        let scale = height.min(width) as f32 * 0.08;
        let wrist = Vec3::new(pose.wrist.x * width as f32, pose.wrist.y * height as f32, 0.0);

        let mut points = vec![wrist; LANDMARK_COUNT];
        points[WRIST] = wrist;

        // Thumb, off to one side and never counted.
        for j in 1..=4 {
            points[j] = wrist + Vec3::new(-scale * (0.6 + 0.35 * j as f32), -scale * 0.4 * j as f32, 0.0);
        }

        let extended = [fingers.index, fingers.middle, fingers.ring, fingers.pinky];
        for (f, (&(tip, base), up)) in FINGER_JOINTS.iter().zip(extended).enumerate() {
            let x = wrist.x + scale * (f as f32 - 1.5) * 0.5;
            let base_y = wrist.y - scale * 1.8;
            points[base] = Vec3::new(x, base_y, 0.0);
            // Two intermediate joints between base and tip.
            let tip_y = if up { base_y - scale * 1.6 } else { base_y + scale * 0.6 };
            for (step, joint) in (base + 1..tip).enumerate() {
                let t = (step + 1) as f32 / 3.0;
                points[joint] = Vec3::new(x, base_y + (tip_y - base_y) * t, 0.0);
            }
            points[tip] = Vec3::new(x, tip_y, 0.0);
        }

        Some(HandLandmarks::new(points))
    }
}

impl HandLandmarkModel for SimulatedHand {
    fn estimate(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, ModelError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(ModelError::Inference("empty frame".into()));
        }
        let pose = self.pose();
        Ok(Self::synthesize(&pose, frame.width(), frame.height()).into_iter().collect())
    }
}
