//! Window and event loop.
//!
//! [`run`] opens a window, starts the detection thread with a keyboard-driven
//! [`SimulatedHand`], and ticks the [`Scene`] once per redraw.

use std::sync::Arc;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::atlas::{AtlasTexture, FileImageFetcher, TextureAtlasBuilder};
use crate::config::Config;
use crate::detection::{spawn_detection, DetectionHandle, DetectionOptions, ModelStatus, SnapshotSlot};
use crate::error::AppError;
use crate::gpu::GpuState;
use crate::input::{Command, Input};
use crate::layout::Mode;
use crate::scene::Scene;
use crate::shader::{ParticleInstance, SpriteInstance};
use crate::simulated::SimulatedHand;
use crate::video::{StillImageSource, TestPatternSource, VideoFrameSource};

/// Where frames come from.
pub enum VideoInput {
    /// Animated test pattern; `R` toggles its readiness.
    Pattern(Arc<TestPatternSource>),
    /// A fixed image.
    Still(Arc<StillImageSource>),
}

impl VideoInput {
    fn source(&self) -> Arc<dyn VideoFrameSource> {
        match self {
            VideoInput::Pattern(p) => p.clone() as Arc<dyn VideoFrameSource>,
            VideoInput::Still(s) => s.clone() as Arc<dyn VideoFrameSource>,
        }
    }
}

/// Open the viewer and block until it closes.
pub fn run(config: Config, video: VideoInput) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, video);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    scene: Scene,
    atlas: AtlasTexture,
    input: Input,
    video: VideoInput,
    hand: SimulatedHand,
    detection: DetectionHandle,
    particles: Vec<ParticleInstance>,
    sprites: Vec<SpriteInstance>,
    title: (Mode, bool),
    error: Option<AppError>,
}

impl App {
    fn new(config: Config, video: VideoInput) -> Self {
        let atlas = TextureAtlasBuilder::new().build(&config.atlas_images, &FileImageFetcher);

        let slot = SnapshotSlot::new();
        let hand = SimulatedHand::new();
        let model = hand.clone();
        let detection = spawn_detection(
            move || Ok(model),
            video.source(),
            slot.clone(),
            DetectionOptions::default(),
        );

        let scene = Scene::new(config, video.source(), slot);

        Self {
            window: None,
            gpu_state: None,
            scene,
            atlas,
            input: Input::new(),
            video,
            hand,
            detection,
            particles: Vec::new(),
            sprites: Vec::new(),
            title: (Mode::Tree, false),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(title(Mode::Tree, false))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.scene.engine().count(),
            &self.atlas,
        ))?;
        self.gpu_state = Some(gpu);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop) {
        for command in self.input.drain_commands() {
            log::debug!("command {:?}", command);
            match command {
                Command::SimulateHand(fingers) => self.hand.set_fingers(fingers),
                Command::Capture => self.scene.request_capture(),
                Command::ToggleSourceReady => match &self.video {
                    VideoInput::Pattern(pattern) => {
                        let ready = !pattern.is_ready();
                        pattern.set_ready(ready);
                        log::info!("video source {}", if ready { "ready" } else { "not ready" });
                    }
                    VideoInput::Still(_) => log::info!("still image source is always ready"),
                },
                Command::Reset => self.scene.reset(),
                Command::Quit => event_loop.exit(),
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.apply_commands(event_loop);

        // The simulated wrist follows the pointer, undoing the selfie mirror.
        let pointer = self.input.pointer();
        self.hand.set_wrist(Vec2::new(0.5 - pointer.x * 0.5, 0.5 - pointer.y * 0.5));
        self.scene.set_pointer(pointer);

        let ctx = self.scene.tick();

        let failed = matches!(ctx.model_status, ModelStatus::Failed(_));
        if self.title != (ctx.mode, failed) {
            self.title = (ctx.mode, failed);
            if let Some(window) = &self.window {
                window.set_title(&title(ctx.mode, failed));
            }
        }

        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        self.scene.particle_instances(&mut self.particles);
        self.sprites.clear();
        self.sprites.extend_from_slice(self.scene.sprites());
        let uniforms = self.scene.uniforms(gpu_state.aspect(), ctx.flash);

        match gpu_state.render(&uniforms, &self.particles, &self.sprites, self.scene.config().background) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        let frame = self.scene.time().frame();
        if frame % 600 == 0 {
            log::debug!("frame {} at {:.1} fps", frame, self.scene.time().fps());
        }
    }
}

fn title(mode: Mode, model_failed: bool) -> String {
    if model_failed {
        format!("tinsel | {} | gestures unavailable", mode.as_str())
    } else {
        format!("tinsel | {}", mode.as_str())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.input.set_window_size(physical_size.width, physical_size.height);
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.detection.stop();
        log::info!(
            "exiting after {} frames, {} photos",
            self.scene.time().frame(),
            self.scene.pipeline().capture_count()
        );
    }
}
