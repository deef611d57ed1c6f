//! Video frame sources.
//!
//! The camera device itself is outside this crate. Anything that can hand out
//! the latest frame implements [`VideoFrameSource`]; both the detection thread
//! and the capture pipeline read from the same source.

use crate::error::CaptureError;
use image::RgbaImage;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// One decoded video frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub image: RgbaImage,
}

impl VideoFrame {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A live source of video frames.
pub trait VideoFrameSource: Send + Sync {
    /// Whether a frame can be grabbed right now.
    fn is_ready(&self) -> bool;

    /// Grab the current frame.
    fn current_frame(&self) -> Result<VideoFrame, CaptureError>;
}

/// A source that always shows the same image, e.g. a photo on disk.
pub struct StillImageSource {
    frame: VideoFrame,
}

impl StillImageSource {
    /// Decode an image file into a still source.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let image = image::open(path.as_ref())?.into_rgba8();
        Self::from_image(image)
    }

    pub fn from_image(image: RgbaImage) -> Result<Self, CaptureError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::EmptyFrame);
        }
        Ok(Self {
            frame: VideoFrame::new(image),
        })
    }
}

impl VideoFrameSource for StillImageSource {
    fn is_ready(&self) -> bool {
        true
    }

    fn current_frame(&self) -> Result<VideoFrame, CaptureError> {
        Ok(self.frame.clone())
    }
}

/// Animated gradient standing in for a webcam.
///
/// The pattern drifts over time so consecutive captures differ. It can be
/// switched to "not ready" to exercise the capture abort path.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    start: Instant,
    ready: AtomicBool,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            start: Instant::now(),
            ready: AtomicBool::new(true),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    /// Render the pattern at `t` seconds.
    pub fn render(&self, t: f32) -> RgbaImage {
        let (w, h) = (self.width.max(1) as f32, self.height.max(1) as f32);
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let u = x as f32 / w;
            let v = y as f32 / h;
            let r = 0.5 + 0.5 * (u * 6.0 + t).sin();
            let g = 0.5 + 0.5 * (v * 5.0 - t * 0.7).sin();
            let b = 0.5 + 0.5 * ((u + v) * 4.0 + t * 1.3).cos();
            image::Rgba([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8, 255])
        })
    }
}

impl VideoFrameSource for TestPatternSource {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn current_frame(&self) -> Result<VideoFrame, CaptureError> {
        if !self.is_ready() {
            return Err(CaptureError::NotReady);
        }
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::EmptyFrame);
        }
        let t = self.start.elapsed().as_secs_f32();
        Ok(VideoFrame::new(self.render(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_source_ready_toggle() {
        let source = TestPatternSource::new(64, 48);
        let frame = source.current_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 48));

        source.set_ready(false);
        assert!(!source.is_ready());
        assert!(matches!(source.current_frame(), Err(CaptureError::NotReady)));
    }

    #[test]
    fn test_still_source_rejects_empty_image() {
        assert!(matches!(
            StillImageSource::from_image(RgbaImage::new(0, 10)),
            Err(CaptureError::EmptyFrame)
        ));
        let still = StillImageSource::from_image(RgbaImage::new(4, 4)).unwrap();
        assert!(still.is_ready());
        assert_eq!(still.current_frame().unwrap().width(), 4);
    }

    #[test]
    fn test_still_source_missing_file() {
        assert!(StillImageSource::open("/no/such/frame.png").is_err());
    }
}
