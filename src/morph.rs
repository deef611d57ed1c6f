//! The morph engine: per-particle state and its per-frame update.
//!
//! Every frame each particle moves a fixed fraction of the way toward the
//! active layout's target, and its color moves toward either the captured
//! photo or the tree's intrinsic color. With a factor `k` the distance to a
//! fixed target shrinks as `(1 - k)^n`, so particles glide in without
//! overshooting no matter how far away they start.
//!
//! State is stored struct-of-arrays and only mutated here; the renderer reads
//! the resulting slices through [`MorphFrame`].

use crate::capture::PhotoColorGrid;
use crate::config::{Config, ATLAS_CELLS};
use crate::layout::{Layouts, Mode};
use glam::{Mat4, Vec3};
use rand::Rng;

/// Read-only view of one frame's output.
#[derive(Debug, Clone, Copy)]
pub struct MorphFrame<'a> {
    /// World transform per particle.
    pub transforms: &'a [Mat4],
    /// RGB color per particle (may exceed 1.0 for bright ornaments).
    pub colors: &'a [Vec3],
    /// Atlas cell per particle.
    pub atlas_indices: &'a [u32],
    /// How photo-like the shading should be, in `[0, 1]`.
    pub photo_mix: f32,
    /// Seconds since the scene started.
    pub elapsed: f32,
}

/// Owns every particle's current position and color.
pub struct MorphEngine {
    layouts: Layouts,
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
    atlas_indices: Vec<u32>,
    transforms: Vec<Mat4>,
    photo_mix: f32,
    elapsed: f32,
    smoothing: f32,
    photo_mix_smoothing: f32,
}

impl MorphEngine {
    /// Create the particle set in the tree layout with tree colors.
    pub fn new<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Self {
        let layouts = Layouts::generate(config, rng);
        let count = layouts.count();
        let atlas_indices = (0..count).map(|_| rng.gen_range(0..ATLAS_CELLS)).collect();
        Self::with_layouts(config, layouts, atlas_indices)
    }

    /// Create from pre-built layouts and atlas assignment.
    ///
    /// # Panics
    ///
    /// Panics if `atlas_indices` does not have one entry per particle.
    pub fn with_layouts(config: &Config, layouts: Layouts, atlas_indices: Vec<u32>) -> Self {
        let count = layouts.count();
        assert_eq!(atlas_indices.len(), count, "one atlas index per particle");

        let positions = layouts.get(Mode::Tree).positions.clone();
        let colors = layouts.tree_colors().to_vec();
        let transforms = positions
            .iter()
            .map(|&p| particle_transform(p, Mode::Tree))
            .collect();

        Self {
            layouts,
            positions,
            colors,
            atlas_indices,
            transforms,
            photo_mix: 0.0,
            elapsed: 0.0,
            smoothing: config.morph_smoothing,
            photo_mix_smoothing: config.photo_mix_smoothing,
        }
    }

    /// Advance one frame toward the layout selected by `mode`.
    ///
    /// A missing `photo` simply falls back to tree colors.
    pub fn update(&mut self, mode: Mode, photo: Option<&PhotoColorGrid>, elapsed: f32) -> MorphFrame<'_> {
        self.elapsed = elapsed;

        let target_mix = if mode == Mode::Photo { 1.0 } else { 0.0 };
        self.photo_mix += (target_mix - self.photo_mix) * self.photo_mix_smoothing;
        self.photo_mix = self.photo_mix.clamp(0.0, 1.0);

        let k = self.smoothing;
        let targets = &self.layouts.get(mode).positions;
        let tree_colors = self.layouts.tree_colors();
        let photo = photo.filter(|g| mode == Mode::Photo && g.len() == self.positions.len());

        for (i, position) in self.positions.iter_mut().enumerate() {
            *position += (targets[i] - *position) * k;
            self.transforms[i] = particle_transform(*position, mode);

            let target_color = match photo {
                Some(grid) => grid.color(i),
                None => tree_colors[i],
            };
            let current = self.colors[i];
            self.colors[i] += (target_color - current) * k;
        }

        self.frame()
    }

    /// The most recent output without advancing.
    pub fn frame(&self) -> MorphFrame<'_> {
        MorphFrame {
            transforms: &self.transforms,
            colors: &self.colors,
            atlas_indices: &self.atlas_indices,
            photo_mix: self.photo_mix,
            elapsed: self.elapsed,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn atlas_indices(&self) -> &[u32] {
        &self.atlas_indices
    }

    pub fn photo_mix(&self) -> f32 {
        self.photo_mix
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }
}

/// Transform for a particle at `position`.
///
/// In tree and explode modes the quad turns its +Z axis toward the vertical
/// axis at its own height. In photo mode it stays flat so the grid reads as
/// an image.
pub fn particle_transform(position: Vec3, mode: Mode) -> Mat4 {
    if mode == Mode::Photo {
        return Mat4::from_translation(position);
    }
    let forward = Vec3::new(-position.x, 0.0, -position.z);
    if forward.length_squared() < 1e-12 {
        return Mat4::from_translation(position);
    }
    let z = forward.normalize();
    let x = Vec3::Y.cross(z).normalize();
    let y = z.cross(x);
    Mat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), position.extend(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{StillImageSource, VideoFrameSource};
    use image::{Rgba, RgbaImage};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn small_config() -> Config {
        Config {
            rows: 6,
            ..Config::default()
        }
    }

    fn engine(config: &Config) -> MorphEngine {
        MorphEngine::new(config, &mut SmallRng::seed_from_u64(3))
    }

    #[test]
    fn test_starts_in_tree_layout() {
        let config = small_config();
        let engine = engine(&config);
        assert_eq!(engine.count(), 36);
        assert_eq!(engine.positions(), engine.layouts().get(Mode::Tree).positions.as_slice());
        assert_eq!(engine.colors(), engine.layouts().tree_colors());
        assert!(engine.atlas_indices().iter().all(|&i| i < ATLAS_CELLS));
        assert_eq!(engine.photo_mix(), 0.0);
    }

    #[test]
    fn test_convergence_is_geometric() {
        let config = small_config();
        let mut engine = engine(&config);
        let start: Vec<f32> = engine
            .positions()
            .iter()
            .zip(&engine.layouts().get(Mode::Explode).positions)
            .map(|(p, t)| (*p - *t).length())
            .collect();

        let mut previous = start.clone();
        for n in 1..=20 {
            engine.update(Mode::Explode, None, 0.0);
            let targets = &engine.layouts().get(Mode::Explode).positions;
            for (i, (p, t)) in engine.positions().iter().zip(targets).enumerate() {
                let d = (*p - *t).length();
                let expected = 0.9f32.powi(n) * start[i];
                assert!((d - expected).abs() <= 1e-3 * start[i].max(1.0));
                assert!(d <= previous[i] + 1e-6);
                previous[i] = d;
            }
        }
    }

    #[test]
    fn test_photo_mix_after_ten_frames() {
        let config = small_config();
        let mut engine = engine(&config);
        for _ in 0..10 {
            engine.update(Mode::Photo, None, 0.0);
        }
        let expected = 1.0 - 0.92f32.powi(10);
        assert!((engine.photo_mix() - expected).abs() < 1e-5);
        assert!((engine.photo_mix() - 0.566).abs() < 1e-3);
    }

    #[test]
    fn test_photo_mix_stays_bounded() {
        let config = small_config();
        let mut engine = engine(&config);
        for frame in 0..500 {
            let mode = if (frame / 37) % 2 == 0 { Mode::Photo } else { Mode::Tree };
            let mix = engine.update(mode, None, 0.0).photo_mix;
            assert!((0.0..=1.0).contains(&mix));
        }
    }

    #[test]
    fn test_photo_colors_only_apply_in_photo_mode() {
        let config = small_config();
        let mut engine = engine(&config);
        let white = StillImageSource::from_image(RgbaImage::from_pixel(12, 12, Rgba([255, 255, 255, 255])))
            .unwrap()
            .current_frame()
            .unwrap();
        let grid = PhotoColorGrid::from_frame(&white, config.rows, false);

        // Explode ignores the grid and keeps tree colors.
        engine.update(Mode::Explode, Some(&grid), 0.0);
        assert_eq!(engine.colors(), engine.layouts().tree_colors());

        for _ in 0..200 {
            engine.update(Mode::Photo, Some(&grid), 0.0);
        }
        for c in engine.colors() {
            assert!((*c - Vec3::ONE).length() < 1e-3);
        }
    }

    #[test]
    fn test_photo_without_grid_falls_back_to_tree_colors() {
        let config = small_config();
        let mut engine = engine(&config);
        let before = engine.colors().to_vec();
        engine.update(Mode::Photo, None, 0.0);
        assert_eq!(engine.colors(), before.as_slice());
    }

    #[test]
    fn test_transform_faces_axis_outside_photo() {
        let p = Vec3::new(3.0, 2.0, 0.0);
        let m = particle_transform(p, Mode::Tree);
        assert!((m.w_axis.truncate() - p).length() < 1e-6);
        // Local +Z points from the particle toward (0, y, 0).
        assert!((m.z_axis.truncate() - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-6);
        assert!((m.y_axis.truncate() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_transform_is_flat_in_photo_mode() {
        let p = Vec3::new(3.0, 2.0, 0.0);
        assert_eq!(particle_transform(p, Mode::Photo), Mat4::from_translation(p));
        // On the axis there is no direction to face.
        let on_axis = Vec3::new(0.0, 4.0, 0.0);
        assert_eq!(particle_transform(on_axis, Mode::Explode), Mat4::from_translation(on_axis));
    }

    #[test]
    fn test_elapsed_is_forwarded() {
        let config = small_config();
        let mut engine = engine(&config);
        assert_eq!(engine.update(Mode::Tree, None, 1.25).elapsed, 1.25);
        assert_eq!(engine.frame().elapsed, 1.25);
    }
}
