//! Photo capture: turn a video frame into per-particle colors.
//!
//! A capture grabs the current frame, shrinks it to `rows × rows` pixels and
//! stores one normalized RGB triple per particle (row-major, matching the
//! photo layout). The grid then stays active for a dwell period, after which
//! the scene reverts to the tree.
//!
//! Only one capture is ever active. Triggers that arrive while a photo is
//! showing are ignored, so at most one revert is pending.

use crate::config::Config;
use crate::layout::Mode;
use crate::time::Deadline;
use crate::video::{VideoFrame, VideoFrameSource};
use glam::Vec3;
use image::imageops::{self, FilterType};
use std::time::{Duration, Instant};

/// Captured colors, one RGB triple per particle, each channel in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoColorGrid {
    values: Vec<f32>,
}

impl PhotoColorGrid {
    /// Sample `frame` into a `rows × rows` grid.
    pub fn from_frame(frame: &VideoFrame, rows: u32, mirror: bool) -> Self {
        let mut small = imageops::resize(&frame.image, rows, rows, FilterType::Triangle);
        if mirror {
            imageops::flip_horizontal_in_place(&mut small);
        }
        let values = small
            .pixels()
            .flat_map(|p| [p[0], p[1], p[2]])
            .map(|c| c as f32 / 255.0)
            .collect();
        Self { values }
    }

    /// Number of particles covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat `len() * 3` channel values.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Color of particle `index`.
    #[inline]
    pub fn color(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.values[index * 3..index * 3 + 3])
    }
}

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A photo was taken and photo mode should start.
    Captured,
    /// A photo is already showing; nothing changed.
    Ignored,
    /// The video source could not deliver a frame; nothing changed.
    Aborted,
}

/// Emitted when the dwell timer runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revert;

struct ActiveCapture {
    grid: PhotoColorGrid,
    revert_at: Deadline,
}

/// Capture state machine: idle, or showing one photo until its deadline.
pub struct PhotoCapturePipeline {
    rows: u32,
    mirror: bool,
    dwell: Duration,
    flash_duration: Duration,
    flash_until: Option<Deadline>,
    active: Option<ActiveCapture>,
    captures: u64,
}

impl PhotoCapturePipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            rows: config.rows,
            mirror: config.mirror_capture,
            dwell: config.photo_dwell(),
            flash_duration: config.flash_duration(),
            flash_until: None,
            active: None,
            captures: 0,
        }
    }

    /// Try to take a photo at `now`.
    ///
    /// The flash is raised whenever a capture is attempted, even if the
    /// source then fails.
    pub fn trigger(&mut self, now: Instant, source: &dyn VideoFrameSource) -> CaptureOutcome {
        if self.active.is_some() {
            log::trace!("capture ignored: photo already showing");
            return CaptureOutcome::Ignored;
        }

        self.flash_until = Some(Deadline::after(now, self.flash_duration));

        if !source.is_ready() {
            log::debug!("capture aborted: video source not ready");
            return CaptureOutcome::Aborted;
        }
        let frame = match source.current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("capture aborted: {}", e);
                return CaptureOutcome::Aborted;
            }
        };
        if frame.width() == 0 || frame.height() == 0 {
            log::debug!("capture aborted: empty frame");
            return CaptureOutcome::Aborted;
        }

        let grid = PhotoColorGrid::from_frame(&frame, self.rows, self.mirror);
        self.active = Some(ActiveCapture {
            grid,
            revert_at: Deadline::after(now, self.dwell),
        });
        self.captures += 1;
        log::info!(
            "photo captured ({}x{} -> {}x{}), showing for {:?}",
            frame.width(),
            frame.height(),
            self.rows,
            self.rows,
            self.dwell
        );
        CaptureOutcome::Captured
    }

    /// Per-frame timer check. Returns [`Revert`] once, when the dwell expires.
    pub fn poll(&mut self, now: Instant) -> Option<Revert> {
        if self.flash_until.is_some_and(|d| d.is_due(now)) {
            self.flash_until = None;
        }
        if self.active.as_ref().is_some_and(|a| a.revert_at.is_due(now)) {
            self.active = None;
            log::debug!("photo dwell expired");
            return Some(Revert);
        }
        None
    }

    /// Run [`poll`](Self::poll) and apply its result to `mode`.
    pub fn apply_timers(&mut self, now: Instant, mode: &mut Mode) {
        if self.poll(now).is_some() && *mode == Mode::Photo {
            *mode = Mode::Tree;
        }
    }

    /// Drop any active photo and pending timers.
    pub fn cancel(&mut self) {
        self.active = None;
        self.flash_until = None;
    }

    /// Current photo colors, if a capture is active.
    pub fn grid(&self) -> Option<&PhotoColorGrid> {
        self.active.as_ref().map(|a| &a.grid)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the capture flash should be drawn at `now`.
    pub fn flash_active(&self, now: Instant) -> bool {
        self.flash_until.is_some_and(|d| !d.is_due(now))
    }

    /// Time left before the photo reverts.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.active.as_ref().map(|a| a.revert_at.remaining(now))
    }

    /// Successful captures since creation.
    pub fn capture_count(&self) -> u64 {
        self.captures
    }
}
