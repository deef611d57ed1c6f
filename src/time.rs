//! Frame timing and deadlines.
//!
//! [`Time`] is the render loop's clock: it hands each tick an `Instant`, the
//! elapsed seconds fed to the shader, and a frame counter. [`Deadline`] is a
//! one-shot timer checked once per tick, used for the capture flash and the
//! photo dwell. Deadlines are values, not threads: replacing one cancels the
//! old one.
//!
//! # Example
//!
//! ```ignore
//! use tinsel::time::Time;
//!
//! let mut time = Time::new();
//!
//! // In your frame loop:
//! let frame = time.tick();
//! println!("t={:.2}s frame={} fps={:.1}", frame.elapsed, frame.index, time.fps());
//! ```

use std::time::{Duration, Instant};

/// Snapshot of the clock for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Wall-clock instant of this frame.
    pub now: Instant,
    /// Seconds since the clock started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Frames since start, counting this one.
    pub index: u64,
}

/// Render-loop clock.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl Time {
    /// Create a clock starting now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a clock with an explicit start instant.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            last_frame: start,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: start,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Advance to the current instant. Call once per frame.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advance to `now`. Instants earlier than the previous frame are clamped.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let now = now.max(self.last_frame);
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        FrameTime {
            now,
            elapsed: now.duration_since(self.start).as_secs_f32(),
            delta,
            index: self.frame_count,
        }
    }

    /// Frames counted so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// The instant the clock started.
    #[inline]
    pub fn start_instant(&self) -> Instant {
        self.start
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// A point in time after which something should happen once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `duration` after `now`.
    pub fn after(now: Instant, duration: Duration) -> Self {
        Self { at: now + duration }
    }

    /// Whether the deadline has been reached at `now`.
    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.at
    }

    /// Time left until the deadline, zero once due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.at.saturating_duration_since(now)
    }

    pub fn instant(&self) -> Instant {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_reports_elapsed_and_delta() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        let f1 = time.tick_at(t0 + Duration::from_millis(16));
        let f2 = time.tick_at(t0 + Duration::from_millis(48));

        assert_eq!(f1.index, 1);
        assert_eq!(f2.index, 2);
        assert!((f2.elapsed - 0.048).abs() < 1e-4);
        assert!((f2.delta - 0.032).abs() < 1e-4);
    }

    #[test]
    fn test_tick_clamps_backwards_instants() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        time.tick_at(t0 + Duration::from_millis(20));
        let f = time.tick_at(t0 + Duration::from_millis(10));
        assert_eq!(f.delta, 0.0);
        assert!((f.elapsed - 0.020).abs() < 1e-4);
    }

    #[test]
    fn test_fps_updates_after_interval() {
        let t0 = Instant::now();
        let mut time = Time::starting_at(t0);
        for i in 1..=30 {
            time.tick_at(t0 + Duration::from_millis(i * 20));
        }
        // 25 frames in the first 500ms window at 20ms each.
        assert!((time.fps() - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_deadline() {
        let t0 = Instant::now();
        let d = Deadline::after(t0, Duration::from_millis(200));
        assert!(!d.is_due(t0 + Duration::from_millis(199)));
        assert!(d.is_due(t0 + Duration::from_millis(200)));
        assert_eq!(d.remaining(t0 + Duration::from_millis(50)), Duration::from_millis(150));
        assert_eq!(d.remaining(t0 + Duration::from_secs(1)), Duration::ZERO);
    }
}
