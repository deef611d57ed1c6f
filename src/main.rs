//! Viewer binary.
//!
//! ```text
//! tinsel [config.json] [frame-image]
//! ```
//!
//! Without an image the animated test pattern stands in for the webcam.

use std::process::ExitCode;
use std::sync::Arc;

use tinsel::config::Config;
use tinsel::error::AppError;
use tinsel::video::{StillImageSource, TestPatternSource};
use tinsel::window::{run, VideoInput};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn start() -> Result<(), AppError> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => {
            log::info!("loading config from {}", path);
            Config::load(&path)?
        }
        None => Config::default(),
    };

    let video = match args.next() {
        Some(path) => match StillImageSource::open(&path) {
            Ok(still) => {
                log::info!("using {} as the video frame", path);
                VideoInput::Still(Arc::new(still))
            }
            Err(e) => {
                log::warn!("cannot use {} as video frame ({}), falling back to test pattern", path, e);
                VideoInput::Pattern(Arc::new(TestPatternSource::new(640, 480)))
            }
        },
        None => VideoInput::Pattern(Arc::new(TestPatternSource::new(640, 480))),
    };

    run(config, video)
}
