//! Background hand detection.
//!
//! Landmark inference is too slow to run inside the render loop, so it runs
//! on its own thread. The thread loads the model, then repeatedly grabs a
//! frame, runs the model and publishes the result into a [`SnapshotSlot`].
//! The slot holds only the most recent record: a slow reader simply skips
//! stale results and never blocks the producer for longer than a copy.

use crate::error::ModelError;
use crate::gesture::HandLandmarks;
use crate::video::{VideoFrame, VideoFrameSource};
use glam::Vec2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A hand-pose model: one frame in, zero or more hands out.
pub trait HandLandmarkModel: Send {
    fn estimate(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, ModelError>;
}

/// Lifecycle of the detection model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready)
    }
}

/// A detected hand plus its normalized wrist position.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    pub landmarks: HandLandmarks,
    /// Wrist in `[-1, 1]²`, mirrored, `+y` up.
    pub position: Vec2,
}

/// One published detection result.
#[derive(Debug, Clone)]
pub struct DetectionRecord {
    /// First hand found in the frame, if any.
    pub hand: Option<HandObservation>,
    /// Increases by one per published record.
    pub sequence: u64,
    pub timestamp: Instant,
}

#[derive(Debug, Default)]
struct SlotState {
    latest: Option<DetectionRecord>,
    status: ModelStatus,
}

/// Single-slot, most-recent-wins buffer shared between the detection thread
/// and the render loop.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A panicking producer leaves the last record intact.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the stored record.
    pub fn publish(&self, record: DetectionRecord) {
        self.lock().latest = Some(record);
    }

    /// Copy of the most recent record.
    pub fn latest(&self) -> Option<DetectionRecord> {
        self.lock().latest.clone()
    }

    /// Forget the stored record.
    pub fn clear(&self) {
        self.lock().latest = None;
    }

    pub fn status(&self) -> ModelStatus {
        self.lock().status.clone()
    }

    pub fn set_status(&self, status: ModelStatus) {
        self.lock().status = status;
    }
}

/// Tuning for the detection thread.
#[derive(Debug, Clone, Copy)]
pub struct DetectionOptions {
    /// Pause between inference cycles.
    pub interval: Duration,
    /// Pause while the video source is not ready.
    pub idle: Duration,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(16),
            idle: Duration::from_millis(50),
        }
    }
}

/// Owner of the detection thread. Dropping it stops the thread.
pub struct DetectionHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DetectionHandle {
    /// Signal the thread and wait for it to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("detection thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for DetectionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the detection thread.
///
/// `loader` runs on the new thread. Its failure is recorded as
/// [`ModelStatus::Failed`] and the thread exits; the rest of the app keeps
/// running without hand input.
pub fn spawn_detection<F, M>(
    loader: F,
    source: Arc<dyn VideoFrameSource>,
    slot: SnapshotSlot,
    options: DetectionOptions,
) -> DetectionHandle
where
    F: FnOnce() -> Result<M, ModelError> + Send + 'static,
    M: HandLandmarkModel + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    slot.set_status(ModelStatus::Loading);

    let thread_stop = Arc::clone(&stop);
    let thread_slot = slot.clone();
    let spawned = thread::Builder::new()
        .name("hand-detection".into())
        .spawn(move || run(loader, source.as_ref(), &thread_slot, &thread_stop, options));

    let thread = match spawned {
        Ok(thread) => Some(thread),
        Err(e) => {
            log::warn!("could not start detection thread: {}", e);
            slot.set_status(ModelStatus::Failed(e.to_string()));
            None
        }
    };

    DetectionHandle { stop, thread }
}

fn run<F, M>(
    loader: F,
    source: &dyn VideoFrameSource,
    slot: &SnapshotSlot,
    stop: &AtomicBool,
    options: DetectionOptions,
) where
    F: FnOnce() -> Result<M, ModelError>,
    M: HandLandmarkModel,
{
    let mut model = match loader() {
        Ok(model) => model,
        Err(e) => {
            log::warn!("hand model unavailable, continuing without gestures: {}", e);
            slot.set_status(ModelStatus::Failed(e.to_string()));
            return;
        }
    };
    slot.set_status(ModelStatus::Ready);
    log::info!("hand model ready");

    let mut sequence = 0u64;
    let mut last_error: Option<ModelError> = None;

    while !stop.load(Ordering::Relaxed) {
        if !source.is_ready() {
            thread::sleep(options.idle);
            continue;
        }
        let frame = match source.current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::trace!("detection skipped frame: {}", e);
                thread::sleep(options.idle);
                continue;
            }
        };

        match model.estimate(&frame) {
            Ok(hands) => {
                last_error = None;
                let hand = hands.into_iter().find(|h| h.is_complete()).and_then(|landmarks| {
                    let position = landmarks.normalized_position(frame.width(), frame.height())?;
                    Some(HandObservation { landmarks, position })
                });
                sequence += 1;
                slot.publish(DetectionRecord {
                    hand,
                    sequence,
                    timestamp: Instant::now(),
                });
            }
            Err(e) => {
                // Log each distinct failure once.
                if last_error.as_ref() != Some(&e) {
                    log::warn!("hand inference failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        thread::sleep(options.interval);
    }
    log::debug!("detection thread stopped after {} records", sequence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::LANDMARK_COUNT;
    use crate::video::TestPatternSource;
    use glam::Vec3;

    struct FixedModel {
        hands: usize,
    }

    impl HandLandmarkModel for FixedModel {
        fn estimate(&mut self, frame: &VideoFrame) -> Result<Vec<HandLandmarks>, ModelError> {
            let center = Vec3::new(frame.width() as f32 / 2.0, frame.height() as f32 / 2.0, 0.0);
            Ok(vec![HandLandmarks::new(vec![center; LANDMARK_COUNT]); self.hands])
        }
    }

    fn fast() -> DetectionOptions {
        DetectionOptions {
            interval: Duration::from_millis(1),
            idle: Duration::from_millis(1),
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    fn record(sequence: u64) -> DetectionRecord {
        DetectionRecord {
            hand: None,
            sequence,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_slot_keeps_only_latest() {
        let slot = SnapshotSlot::new();
        assert!(slot.latest().is_none());
        slot.publish(record(1));
        slot.publish(record(2));
        assert_eq!(slot.latest().map(|r| r.sequence), Some(2));
        slot.clear();
        assert!(slot.latest().is_none());
    }

    #[test]
    fn test_thread_publishes_and_stops() {
        let slot = SnapshotSlot::new();
        let source = Arc::new(TestPatternSource::new(32, 24));
        let mut handle = spawn_detection(|| Ok(FixedModel { hands: 1 }), source, slot.clone(), fast());

        assert!(wait_for(|| slot.latest().is_some_and(|r| r.sequence >= 3)));
        assert_eq!(slot.status(), ModelStatus::Ready);
        let hand = slot.latest().and_then(|r| r.hand).unwrap();
        assert!(hand.position.length() < 1e-6);

        handle.stop();
        assert!(!handle.is_running());
        let after = slot.latest().map(|r| r.sequence);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(slot.latest().map(|r| r.sequence), after);
    }

    #[test]
    fn test_no_hand_publishes_empty_record() {
        let slot = SnapshotSlot::new();
        let source = Arc::new(TestPatternSource::new(32, 24));
        let _handle = spawn_detection(|| Ok(FixedModel { hands: 0 }), source, slot.clone(), fast());
        assert!(wait_for(|| slot.latest().is_some()));
        assert!(slot.latest().unwrap().hand.is_none());
    }

    #[test]
    fn test_failed_load_sets_status() {
        let slot = SnapshotSlot::new();
        let source = Arc::new(TestPatternSource::new(32, 24));
        let handle = spawn_detection(
            || Err::<FixedModel, _>(ModelError::Load("weights missing".into())),
            source,
            slot.clone(),
            fast(),
        );
        assert!(wait_for(|| !handle.is_running()));
        assert!(matches!(slot.status(), ModelStatus::Failed(msg) if msg.contains("weights missing")));
        assert!(slot.latest().is_none());
    }

    #[test]
    fn test_not_ready_source_publishes_nothing() {
        let slot = SnapshotSlot::new();
        let source = Arc::new(TestPatternSource::new(32, 24));
        source.set_ready(false);
        let mut handle = spawn_detection(|| Ok(FixedModel { hands: 1 }), source.clone(), slot.clone(), fast());
        assert!(wait_for(|| slot.status().is_ready()));
        thread::sleep(Duration::from_millis(20));
        assert!(slot.latest().is_none());

        source.set_ready(true);
        assert!(wait_for(|| slot.latest().is_some()));
        handle.stop();
    }
}
