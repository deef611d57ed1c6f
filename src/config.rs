//! Runtime configuration.
//!
//! Every tunable constant of the scene lives in [`Config`]. The defaults
//! reproduce the stock look; a JSON file can override any subset of fields:
//!
//! ```ignore
//! let config = Config::load("tinsel.json")?;
//! ```

use crate::error::ConfigError;
use crate::gesture::VerticalAxis;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Number of atlas columns (and rows). The atlas always holds `ATLAS_COLUMNS²` cells.
pub const ATLAS_COLUMNS: u32 = 4;

/// Number of cells in the decorative atlas.
pub const ATLAS_CELLS: u32 = ATLAS_COLUMNS * ATLAS_COLUMNS;

/// Complete scene configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Side length of the photo grid. The particle count is `rows * rows`.
    pub rows: u32,
    /// Edge length of one particle quad in world units.
    pub item_size: f32,
    /// Per-frame interpolation factor for positions and colors.
    pub morph_smoothing: f32,
    /// Per-frame interpolation factor for the photo mix scalar.
    pub photo_mix_smoothing: f32,
    /// Inner radius of the explosion shell.
    pub explode_min_radius: f32,
    /// Radial thickness of the explosion shell.
    pub explode_radius_span: f32,
    /// How long a captured photo stays on screen, in milliseconds.
    pub photo_dwell_ms: u64,
    /// Duration of the capture flash, in milliseconds.
    pub flash_ms: u64,
    /// Mirror captured frames horizontally, matching a selfie preview.
    pub mirror_capture: bool,
    /// Direction in which landmark `y` grows.
    pub vertical_axis: VerticalAxis,
    /// Per-frame camera smoothing factor.
    pub camera_smoothing: f32,
    /// Camera pan range when a hand drives the view.
    pub hand_pan: [f32; 2],
    /// Camera pan range when the pointer drives the view.
    pub pointer_pan: [f32; 2],
    /// Fixed camera distance along +Z.
    pub camera_distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Vertical offset applied to the tree group (particles and star).
    pub scene_offset: f32,
    /// Number of snow flakes.
    pub snow_count: u32,
    /// Linear fog range for decorative sprites.
    pub fog: [f32; 2],
    /// Clear color (linear RGB).
    pub background: [f32; 3],
    /// Image files for the decorative atlas, in cell order.
    pub atlas_images: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: 50,
            item_size: 0.42,
            morph_smoothing: 0.1,
            photo_mix_smoothing: 0.08,
            explode_min_radius: 2.0,
            explode_radius_span: 16.0,
            photo_dwell_ms: 6000,
            flash_ms: 200,
            mirror_capture: true,
            vertical_axis: VerticalAxis::Down,
            camera_smoothing: 0.05,
            hand_pan: [14.0, 7.0],
            pointer_pan: [8.0, 4.0],
            camera_distance: 18.0,
            fov_degrees: 55.0,
            scene_offset: -1.0,
            snow_count: 2000,
            fog: [15.0, 40.0],
            background: [0.0, 0.0, 24.0 / 255.0],
            atlas_images: Vec::new(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check value ranges that the rest of the crate relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::Invalid("rows must be at least 1".into()));
        }
        if self.item_size <= 0.0 {
            return Err(ConfigError::Invalid("item_size must be positive".into()));
        }
        for (name, factor) in [
            ("morph_smoothing", self.morph_smoothing),
            ("photo_mix_smoothing", self.photo_mix_smoothing),
            ("camera_smoothing", self.camera_smoothing),
        ] {
            if !(factor > 0.0 && factor < 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie strictly between 0 and 1, got {factor}"
                )));
            }
        }
        if self.explode_min_radius < 0.0 || self.explode_radius_span <= 0.0 {
            return Err(ConfigError::Invalid(
                "explosion radii must be non-negative with a positive span".into(),
            ));
        }
        if self.fog[0] >= self.fog[1] {
            return Err(ConfigError::Invalid("fog near must be below fog far".into()));
        }
        Ok(())
    }

    /// Total number of particles.
    #[inline]
    pub fn count(&self) -> usize {
        (self.rows * self.rows) as usize
    }

    pub fn photo_dwell(&self) -> Duration {
        Duration::from_millis(self.photo_dwell_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }
}
