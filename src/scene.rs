//! The per-frame tick that ties everything together.
//!
//! [`Scene::tick`] runs once per displayed frame, in this order:
//!
//! 1. read the latest hand detection from the [`SnapshotSlot`],
//! 2. classify it into a mode change and a capture request,
//! 3. run the capture (entering photo mode on success),
//! 4. morph particles toward the active layout,
//! 5. check the capture timers (leaving photo mode when the dwell ends),
//! 6. move the camera and the decorations.
//!
//! Everything the frame decided is returned as a [`FrameContext`].

use crate::camera::CameraRig;
use crate::capture::{CaptureOutcome, PhotoCapturePipeline};
use crate::config::Config;
use crate::detection::{HandObservation, ModelStatus, SnapshotSlot};
use crate::gesture::GestureClassifier;
use crate::layout::Mode;
use crate::morph::MorphEngine;
use crate::shader::{ParticleInstance, SpriteInstance, Uniforms};
use crate::snow::Snowfall;
use crate::star::TreeStar;
use crate::time::Time;
use crate::video::VideoFrameSource;
use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What one tick saw and decided.
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub now: Instant,
    /// Seconds since the scene started.
    pub elapsed: f32,
    /// Mode at the end of the tick.
    pub mode: Mode,
    /// Hand used for this tick, if any.
    pub hand: Option<HandObservation>,
    /// Pointer in `[-1, 1]²`.
    pub pointer: Vec2,
    pub model_status: ModelStatus,
    /// Result of a capture attempted this tick.
    pub capture: Option<CaptureOutcome>,
    /// Whether the capture flash is showing.
    pub flash: bool,
}

/// Complete scene state.
pub struct Scene {
    config: Config,
    time: Time,
    mode: Mode,
    classifier: GestureClassifier,
    pipeline: PhotoCapturePipeline,
    engine: MorphEngine,
    camera: CameraRig,
    snow: Snowfall,
    star: TreeStar,
    source: Arc<dyn VideoFrameSource>,
    slot: SnapshotSlot,
    pointer: Vec2,
    capture_requested: bool,
    sprites: Vec<SpriteInstance>,
}

impl Scene {
    /// Build a scene with non-reproducible layouts.
    pub fn new(config: Config, source: Arc<dyn VideoFrameSource>, slot: SnapshotSlot) -> Self {
        let mut rng = SmallRng::from_entropy();
        Self::with_rng(config, source, slot, &mut rng, Instant::now())
    }

    /// Build a scene from a given RNG and start instant.
    pub fn with_rng<R: Rng + ?Sized>(
        config: Config,
        source: Arc<dyn VideoFrameSource>,
        slot: SnapshotSlot,
        rng: &mut R,
        start: Instant,
    ) -> Self {
        let engine = MorphEngine::new(&config, rng);
        let snow = Snowfall::new(config.snow_count as usize, rng);
        log::info!(
            "scene ready: {} particles, {} snowflakes",
            engine.count(),
            snow.len()
        );

        Self {
            time: Time::starting_at(start),
            mode: Mode::Tree,
            classifier: GestureClassifier::new(),
            pipeline: PhotoCapturePipeline::new(&config),
            camera: CameraRig::new(&config),
            star: TreeStar::new(config.scene_offset),
            engine,
            snow,
            source,
            slot,
            pointer: Vec2::ZERO,
            capture_requested: false,
            sprites: Vec::new(),
            config,
        }
    }

    /// Pointer position in `[-1, 1]²`, `+y` up. Used when no hand is seen.
    pub fn set_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Ask for a capture on the next tick, as if the capture gesture was made.
    pub fn request_capture(&mut self) {
        self.capture_requested = true;
    }

    /// Drop any photo and return to the tree.
    pub fn reset(&mut self) {
        self.pipeline.cancel();
        if self.mode != Mode::Tree {
            log::debug!("mode {} -> {} (reset)", self.mode.as_str(), Mode::Tree.as_str());
        }
        self.mode = Mode::Tree;
        self.capture_requested = false;
    }

    pub fn tick(&mut self) -> FrameContext {
        self.tick_at(Instant::now())
    }

    /// Advance one frame at `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameContext {
        let frame = self.time.tick_at(now);
        let now = frame.now;

        let hand = self.slot.latest().and_then(|record| record.hand);
        let model_status = self.slot.status();
        let pose = hand
            .as_ref()
            .and_then(|h| h.landmarks.finger_pose(self.config.vertical_axis));

        let classification = self.classifier.classify(pose, self.mode);
        self.mode = classification.mode;

        let mut capture = None;
        if classification.capture || std::mem::take(&mut self.capture_requested) {
            let outcome = self.pipeline.trigger(now, self.source.as_ref());
            if outcome == CaptureOutcome::Captured {
                log::debug!("mode {} -> {}", self.mode.as_str(), Mode::Photo.as_str());
                self.mode = Mode::Photo;
            }
            capture = Some(outcome);
        }

        self.engine.update(self.mode, self.pipeline.grid(), frame.elapsed);
        self.pipeline.apply_timers(now, &mut self.mode);

        self.camera.update(hand.as_ref().map(|h| h.position), self.pointer);
        self.snow.update();
        self.star.update(self.mode, frame.elapsed);

        self.sprites.clear();
        self.snow.sprites(&mut self.sprites);
        self.star.sprites(&mut self.sprites);

        FrameContext {
            now,
            elapsed: frame.elapsed,
            mode: self.mode,
            hand,
            pointer: self.pointer,
            model_status,
            capture,
            flash: self.pipeline.flash_active(now),
        }
    }

    /// Instance data for every particle, in index order.
    pub fn particle_instances(&self, out: &mut Vec<ParticleInstance>) {
        let frame = self.engine.frame();
        out.clear();
        out.extend(
            frame
                .transforms
                .iter()
                .zip(frame.colors)
                .zip(frame.atlas_indices)
                .map(|((&m, &c), &a)| ParticleInstance::new(m, c, a)),
        );
    }

    /// Sprites collected by the last tick.
    pub fn sprites(&self) -> &[SpriteInstance] {
        &self.sprites
    }

    /// Shader uniforms for a viewport with the given aspect ratio.
    pub fn uniforms(&self, aspect: f32, flash: bool) -> Uniforms {
        let (right, up) = self.camera.basis();
        let frame = self.engine.frame();
        let bg = Vec3::from(self.config.background);
        Uniforms {
            view_proj: self.camera.view_proj(aspect).to_cols_array_2d(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
            camera_position: self.camera.position.extend(1.0).to_array(),
            fog_color: bg.extend(1.0).to_array(),
            time: frame.elapsed,
            photo_mix: frame.photo_mix,
            fog_near: self.config.fog[0],
            fog_far: self.config.fog[1],
            item_size: self.config.item_size,
            scene_offset: self.config.scene_offset,
            flash: if flash { 1.0 } else { 0.0 },
            _pad: 0.0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn engine(&self) -> &MorphEngine {
        &self.engine
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn pipeline(&self) -> &PhotoCapturePipeline {
        &self.pipeline
    }

    pub fn star(&self) -> &TreeStar {
        &self.star
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Time left in photo mode.
    pub fn photo_remaining(&self, now: Instant) -> Option<Duration> {
        self.pipeline.remaining(now)
    }
}
