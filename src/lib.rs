//! # Tinsel
//!
//! A gesture-driven particle Christmas tree.
//!
//! A few thousand textured particles morph between three layouts: a spiral
//! cone ([`Mode::Tree`]), a random sphere shell ([`Mode::Explode`]) and a
//! flat grid ([`Mode::Photo`]) colored from a captured video frame. Hand
//! gestures pick the layout:
//!
//! | Gesture | Effect |
//! |---------|--------|
//! | Open palm | Explode |
//! | Fist, or no hand | Back to the tree |
//! | Peace sign | Capture a photo; the grid shows it for a few seconds |
//!
//! The hand position pans the camera, falling back to the mouse pointer when
//! no hand is seen or the hand model is unavailable.
//!
//! ## Pieces
//!
//! - [`layout`] generates the three target layouts.
//! - [`morph`] eases particles toward the active one.
//! - [`gesture`] turns hand landmarks into mode changes.
//! - [`detection`] runs the hand model off the render thread.
//! - [`capture`] samples a video frame into the photo grid.
//! - [`camera`], [`snow`] and [`star`] animate the rest of the scene.
//! - [`atlas`] bakes decoration images into one texture.
//! - [`scene`] ties them together into a single per-frame tick.
//! - [`gpu`] and [`window`] draw it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tinsel::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let video = VideoInput::Pattern(Arc::new(TestPatternSource::new(640, 480)));
//!     tinsel::window::run(Config::default(), video)
//! }
//! ```
//!
//! Headless, the scene can be ticked directly:
//!
//! ```ignore
//! let mut scene = Scene::new(Config::default(), source, SnapshotSlot::new());
//! let ctx = scene.tick();
//! println!("{}", ctx.mode.as_str());
//! ```

pub mod atlas;
pub mod camera;
pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod gesture;
pub mod gpu;
pub mod input;
pub mod layout;
pub mod morph;
pub mod scene;
pub mod shader;
pub mod simulated;
pub mod snow;
pub mod star;
pub mod time;
pub mod video;
pub mod window;

pub use atlas::{AtlasTexture, FileImageFetcher, ImageFetcher, TextureAtlasBuilder};
pub use camera::CameraRig;
pub use capture::{CaptureOutcome, PhotoCapturePipeline, PhotoColorGrid};
pub use config::Config;
pub use detection::{spawn_detection, HandLandmarkModel, ModelStatus, SnapshotSlot};
pub use error::{AppError, AtlasError, CaptureError, ConfigError, GpuError, ModelError};
pub use gesture::{FingerPose, Gesture, GestureClassifier, HandLandmarks, VerticalAxis};
pub use glam::{Vec2, Vec3, Vec4};
pub use layout::{Layout, Layouts, Mode};
pub use morph::MorphEngine;
pub use scene::{FrameContext, Scene};
pub use simulated::SimulatedHand;
pub use video::{StillImageSource, TestPatternSource, VideoFrame, VideoFrameSource};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use tinsel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::capture::CaptureOutcome;
    pub use crate::config::Config;
    pub use crate::detection::{spawn_detection, DetectionOptions, HandLandmarkModel, ModelStatus, SnapshotSlot};
    pub use crate::error::AppError;
    pub use crate::gesture::{FingerPose, HandLandmarks};
    pub use crate::layout::Mode;
    pub use crate::scene::{FrameContext, Scene};
    pub use crate::simulated::SimulatedHand;
    pub use crate::time::Time;
    pub use crate::video::{StillImageSource, TestPatternSource, VideoFrameSource};
    pub use crate::window::VideoInput;
    pub use crate::{Vec2, Vec3, Vec4};
}
