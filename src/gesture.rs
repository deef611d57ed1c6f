//! Gesture classification.
//!
//! A [`HandLandmarks`] snapshot (21 points, as produced by common hand-pose
//! models) is reduced to a [`FingerPose`]: four "is this finger extended"
//! flags. The [`GestureClassifier`] turns that pose into a [`Mode`] change and
//! an edge-triggered capture request:
//!
//! | Pose | Effect |
//! |------|--------|
//! | Index + middle up, ring + pinky down | Capture (only when not already in photo mode) |
//! | All four up | Explode, for as long as the pose is held |
//! | Anything else | Leave explode for tree |
//! | No hand | Leave explode for tree |
//!
//! Photo mode is never left by the classifier; only the capture dwell timer
//! ends it.

use crate::layout::Mode;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Number of landmarks in a full hand snapshot.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark index of the wrist.
pub const WRIST: usize = 0;

/// (tip, base joint) landmark pairs for index, middle, ring and pinky.
pub const FINGER_JOINTS: [(usize, usize); 4] = [(8, 5), (12, 9), (16, 13), (20, 17)];

/// Direction in which the landmark source's `y` coordinate grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAxis {
    /// Image space: `y` grows downward, so "above" means a smaller `y`.
    #[default]
    Down,
    /// World space: `y` grows upward.
    Up,
}

impl VerticalAxis {
    /// Whether `a` is strictly above `b` in this convention.
    #[inline]
    pub fn is_above(self, a: f32, b: f32) -> bool {
        match self {
            VerticalAxis::Down => a < b,
            VerticalAxis::Up => a > b,
        }
    }
}

/// One hand's landmarks in source pixel coordinates.
///
/// `z` is zero when the model only reports 2D points.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    pub points: Vec<Vec3>,
}

impl HandLandmarks {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Whether every landmark the classifier needs is present.
    pub fn is_complete(&self) -> bool {
        self.points.len() >= LANDMARK_COUNT
    }

    /// Derive finger extension flags, or `None` if landmarks are missing.
    pub fn finger_pose(&self, axis: VerticalAxis) -> Option<FingerPose> {
        if !self.is_complete() {
            return None;
        }
        let up = |(tip, base): (usize, usize)| axis.is_above(self.points[tip].y, self.points[base].y);
        Some(FingerPose {
            index: up(FINGER_JOINTS[0]),
            middle: up(FINGER_JOINTS[1]),
            ring: up(FINGER_JOINTS[2]),
            pinky: up(FINGER_JOINTS[3]),
        })
    }

    /// Wrist position mapped to `[-1, 1]²`, mirrored horizontally so moving
    /// the hand right pans right in a selfie view.
    pub fn normalized_position(&self, frame_width: u32, frame_height: u32) -> Option<Vec2> {
        let wrist = self.points.get(WRIST)?;
        if frame_width == 0 || frame_height == 0 {
            return None;
        }
        Some(Vec2::new(
            (wrist.x / frame_width as f32 - 0.5) * -2.0,
            -(wrist.y / frame_height as f32 - 0.5) * 2.0,
        ))
    }
}

/// Which of the four long fingers are extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerPose {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerPose {
    pub const OPEN_PALM: FingerPose = FingerPose {
        index: true,
        middle: true,
        ring: true,
        pinky: true,
    };

    pub const PEACE: FingerPose = FingerPose {
        index: true,
        middle: true,
        ring: false,
        pinky: false,
    };

    pub const FIST: FingerPose = FingerPose {
        index: false,
        middle: false,
        ring: false,
        pinky: false,
    };

    /// The recognized gesture for this pose.
    pub fn gesture(&self) -> Gesture {
        match (self.index, self.middle, self.ring, self.pinky) {
            (true, true, false, false) => Gesture::Peace,
            (true, true, true, true) => Gesture::OpenPalm,
            _ => Gesture::Other,
        }
    }
}

/// Discrete gestures the classifier reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Two fingers up: take a photo.
    Peace,
    /// Four fingers up: explode.
    OpenPalm,
    /// Any other pose.
    Other,
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Mode to use from this frame on.
    pub mode: Mode,
    /// A capture should start this frame.
    pub capture: bool,
}

/// Per-frame mode state machine.
///
/// The classifier does not own the mode; it receives the current one and
/// returns the next, so photo-mode entry and exit (driven by the capture
/// pipeline) stay in one place.
#[derive(Debug, Default)]
pub struct GestureClassifier {
    last_gesture: Option<Gesture>,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gesture seen on the previous frame, `None` if no hand was present.
    pub fn last_gesture(&self) -> Option<Gesture> {
        self.last_gesture
    }

    /// Classify one frame. `pose` is `None` when no hand is present.
    pub fn classify(&mut self, pose: Option<FingerPose>, mode: Mode) -> Classification {
        let gesture = pose.map(|p| p.gesture());
        if gesture != self.last_gesture {
            log::trace!("gesture {:?} -> {:?}", self.last_gesture, gesture);
            self.last_gesture = gesture;
        }

        let next = match (mode, gesture) {
            // Photo runs to completion regardless of hand state.
            (Mode::Photo, _) => Classification { mode, capture: false },
            (_, Some(Gesture::Peace)) => Classification { mode, capture: true },
            (_, Some(Gesture::OpenPalm)) => Classification {
                mode: Mode::Explode,
                capture: false,
            },
            (Mode::Explode, _) => Classification {
                mode: Mode::Tree,
                capture: false,
            },
            (Mode::Tree, _) => Classification { mode, capture: false },
        };

        if next.mode != mode {
            log::debug!("mode {} -> {}", mode.as_str(), next.mode.as_str());
        }
        next
    }
}
