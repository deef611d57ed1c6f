//! Integration tests for the per-frame scene tick.
//!
//! Hands are published straight into the snapshot slot, the same way the
//! detection thread would, so every test runs on one thread with explicit
//! timestamps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tinsel::detection::{DetectionRecord, HandObservation, ModelStatus, SnapshotSlot};
use tinsel::gesture::FingerPose;
use tinsel::simulated::{SimulatedHand, SimulatedPose};
use tinsel::{CaptureOutcome, Config, Mode, Scene, TestPatternSource, Vec2};

const FRAME: Duration = Duration::from_millis(16);
const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

struct Harness {
    scene: Scene,
    slot: SnapshotSlot,
    source: Arc<TestPatternSource>,
    start: Instant,
    frame: u32,
    sequence: u64,
}

impl Harness {
    fn new() -> Self {
        let config = Config {
            rows: 10,
            snow_count: 50,
            ..Config::default()
        };
        let slot = SnapshotSlot::new();
        slot.set_status(ModelStatus::Ready);
        let source = Arc::new(TestPatternSource::new(WIDTH, HEIGHT));
        let scene = Scene::with_rng(
            config,
            source.clone(),
            slot.clone(),
            &mut SmallRng::seed_from_u64(2024),
            Instant::now(),
        );
        let start = scene.time().start_instant();
        Self {
            scene,
            slot,
            source,
            start,
            frame: 0,
            sequence: 0,
        }
    }

    /// Publish a detection as the hand thread would; `None` means no hand.
    fn show(&mut self, fingers: Option<FingerPose>, wrist: Vec2) {
        let pose = SimulatedPose { fingers, wrist };
        let hand = SimulatedHand::synthesize(&pose, WIDTH, HEIGHT).map(|landmarks| {
            let position = landmarks
                .normalized_position(WIDTH, HEIGHT)
                .unwrap_or(Vec2::ZERO);
            HandObservation { landmarks, position }
        });
        self.sequence += 1;
        self.slot.publish(DetectionRecord {
            hand,
            sequence: self.sequence,
            timestamp: self.now(),
        });
    }

    fn now(&self) -> Instant {
        self.start + FRAME * self.frame
    }

    fn tick(&mut self) -> tinsel::FrameContext {
        self.frame += 1;
        let now = self.now();
        self.scene.tick_at(now)
    }

    /// Tick until at least `duration` has passed.
    fn run_for(&mut self, duration: Duration) -> Vec<tinsel::FrameContext> {
        let end = self.now() + duration;
        let mut frames = Vec::new();
        while self.now() < end {
            frames.push(self.tick());
        }
        frames
    }
}

fn center() -> Vec2 {
    Vec2::new(0.5, 0.5)
}

#[test]
fn test_peace_held_through_dwell_captures_once() {
    let mut h = Harness::new();
    h.show(Some(FingerPose::PEACE), center());

    let first = h.tick();
    assert_eq!(first.capture, Some(CaptureOutcome::Captured));
    assert_eq!(first.mode, Mode::Photo);

    // Stop just short of the dwell deadline.
    let frames = h.run_for(Duration::from_millis(6000) - FRAME * 2);
    assert!(frames.iter().all(|f| f.mode == Mode::Photo));
    assert!(frames.iter().all(|f| f.capture.is_none()));
    assert_eq!(h.scene.pipeline().capture_count(), 1);
}

#[test]
fn test_photo_reverts_to_tree_after_dwell() {
    let mut h = Harness::new();
    h.show(Some(FingerPose::PEACE), center());
    h.tick();
    h.show(None, center());

    let frames = h.run_for(Duration::from_millis(6100));
    let last = frames.last().map(|f| f.mode);
    assert_eq!(last, Some(Mode::Tree));
    assert!(h.scene.pipeline().grid().is_none());
    assert!(h.scene.star().is_visible());
}

#[test]
fn test_open_palm_explodes_and_release_returns_to_tree() {
    let mut h = Harness::new();
    h.show(Some(FingerPose::OPEN_PALM), center());
    let ctx = h.tick();
    assert_eq!(ctx.mode, Mode::Explode);
    assert!(ctx.capture.is_none());

    // Particles start moving off the cone.
    let tree = h.scene.engine().layouts().get(Mode::Tree).positions.clone();
    h.run_for(Duration::from_millis(500));
    let moved = h
        .scene
        .engine()
        .positions()
        .iter()
        .zip(&tree)
        .filter(|(p, t)| p.distance(**t) > 0.5)
        .count();
    assert!(moved > tree.len() / 2, "only {} particles moved", moved);

    h.show(None, center());
    assert_eq!(h.tick().mode, Mode::Tree);

    h.show(Some(FingerPose::OPEN_PALM), center());
    assert_eq!(h.tick().mode, Mode::Explode);
    h.show(Some(FingerPose::FIST), center());
    assert_eq!(h.tick().mode, Mode::Tree);
}

#[test]
fn test_open_palm_does_not_interrupt_photo() {
    let mut h = Harness::new();
    h.show(Some(FingerPose::PEACE), center());
    assert_eq!(h.tick().mode, Mode::Photo);

    h.show(Some(FingerPose::OPEN_PALM), center());
    let frames = h.run_for(Duration::from_millis(3000));
    assert!(frames.iter().all(|f| f.mode == Mode::Photo));

    // Once the photo ends the palm takes effect on the next frame.
    h.run_for(Duration::from_millis(3100));
    assert_eq!(h.tick().mode, Mode::Explode);
}

#[test]
fn test_photo_mix_follows_photo_mode() {
    let mut h = Harness::new();
    h.show(Some(FingerPose::PEACE), center());
    h.tick();
    h.show(None, center());
    h.run_for(Duration::from_millis(2000));
    assert!(h.scene.engine().photo_mix() > 0.9);

    h.run_for(Duration::from_millis(6000));
    assert_eq!(h.scene.mode(), Mode::Tree);
    assert!(h.scene.engine().photo_mix() < 0.1);
}

#[test]
fn test_not_ready_source_aborts_but_flashes() {
    let mut h = Harness::new();
    h.source.set_ready(false);
    h.show(Some(FingerPose::PEACE), center());

    let ctx = h.tick();
    assert_eq!(ctx.capture, Some(CaptureOutcome::Aborted));
    assert_eq!(ctx.mode, Mode::Tree);
    assert!(ctx.flash);
    assert!(h.scene.pipeline().grid().is_none());

    // The flash is brief.
    let frames = h.run_for(Duration::from_millis(300));
    assert!(!frames.last().is_some_and(|f| f.flash));
}

#[test]
fn test_model_failure_falls_back_to_pointer() {
    let mut h = Harness::new();
    h.slot.set_status(ModelStatus::Failed("no weights".to_string()));
    h.scene.set_pointer(Vec2::new(-1.0, 0.5));

    let frames = h.run_for(Duration::from_millis(2000));
    let last = frames.last().cloned();
    let Some(ctx) = last else {
        panic!("no frames ran");
    };
    assert_eq!(ctx.mode, Mode::Tree);
    assert!(ctx.hand.is_none());
    assert!(matches!(ctx.model_status, ModelStatus::Failed(_)));

    let camera = h.scene.camera().position;
    assert!(camera.x < -4.0, "camera x {}", camera.x);
    assert!(camera.y > 1.0, "camera y {}", camera.y);
}

#[test]
fn test_hand_position_pans_camera() {
    let mut h = Harness::new();
    // Wrist on the left of the image is the user's right after mirroring.
    h.show(Some(FingerPose::FIST), Vec2::new(0.1, 0.5));
    h.scene.set_pointer(Vec2::new(-1.0, 0.0));
    h.run_for(Duration::from_millis(2000));

    let ctx = h.tick();
    let Some(hand) = ctx.hand else {
        panic!("hand not observed");
    };
    assert!(hand.position.x > 0.5);
    assert!(h.scene.camera().position.x > 5.0);
}

#[test]
fn test_manual_capture_without_hand() {
    let mut h = Harness::new();
    h.scene.request_capture();
    let ctx = h.tick();
    assert_eq!(ctx.capture, Some(CaptureOutcome::Captured));
    assert_eq!(ctx.mode, Mode::Photo);

    // A second request while the photo is up is ignored.
    h.scene.request_capture();
    assert_eq!(h.tick().capture, Some(CaptureOutcome::Ignored));
    assert_eq!(h.scene.pipeline().capture_count(), 1);
}
