//! Target layouts the particles morph between.
//!
//! Three layouts are generated once at startup:
//!
//! | Mode | Shape | Colors |
//! |------|-------|--------|
//! | [`Mode::Tree`] | Tiered spiral cone | Intrinsic (foliage, ornaments, lights) |
//! | [`Mode::Explode`] | Thick spherical shell | Borrowed from the tree |
//! | [`Mode::Photo`] | Flat row-major grid | Captured photo |
//!
//! Randomness only affects colors and the explosion; the tree and grid
//! positions depend on the particle index alone.

use crate::config::Config;
use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

/// Number of tiers stacked along the tree's height.
const TREE_TIERS: f32 = 7.0;
/// Lowest point of the tree.
const TREE_BASE: f32 = -6.0;
/// Height of the tree from base to tip.
const TREE_HEIGHT: f32 = 11.0;
/// Radius of the cone at the base, excluding tier bulge.
const TREE_TAPER: f32 = 7.0;
/// Extra radius at the bottom of each tier.
const TREE_TIER_BULGE: f32 = 2.0;
/// Angular increment per particle index, in radians.
const TREE_ANGLE_STEP: f32 = 0.4;

const ORNAMENT_RED: Vec3 = Vec3::new(3.0, 0.1, 0.1);
const ORNAMENT_GOLD: Vec3 = Vec3::new(3.0, 2.0, 0.2);
const FAIRY_LIGHT: Vec3 = Vec3::new(2.0, 2.0, 2.5);

/// The active layout selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Tiered tree, the resting state.
    #[default]
    Tree,
    /// Spherical burst, held while an open palm is shown.
    Explode,
    /// Photo mosaic, shown for a fixed dwell after a capture.
    Photo,
}

impl Mode {
    /// Short upper-case name for logs and window titles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Tree => "TREE",
            Mode::Explode => "EXPLODE",
            Mode::Photo => "PHOTO",
        }
    }
}

/// A target configuration for every particle.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Target position per particle.
    pub positions: Vec<Vec3>,
    /// Target color per particle, if the layout carries its own colors.
    pub colors: Option<Vec<Vec3>>,
}

impl Layout {
    /// Number of particles this layout targets.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the layout is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// The three layouts, generated together for one particle count.
#[derive(Debug, Clone)]
pub struct Layouts {
    tree: Layout,
    explode: Layout,
    photo: Layout,
}

impl Layouts {
    /// Generate all three layouts for `config.count()` particles.
    pub fn generate<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Self {
        let count = config.count();
        Self {
            tree: tree_layout(count, rng),
            explode: explode_layout(
                count,
                config.explode_min_radius,
                config.explode_radius_span,
                rng,
            ),
            photo: photo_layout(config.rows, config.item_size),
        }
    }

    /// Layout targeted in the given mode.
    pub fn get(&self, mode: Mode) -> &Layout {
        match mode {
            Mode::Tree => &self.tree,
            Mode::Explode => &self.explode,
            Mode::Photo => &self.photo,
        }
    }

    /// The tree's intrinsic colors, used whenever no photo overrides them.
    pub fn tree_colors(&self) -> &[Vec3] {
        self.tree.colors.as_deref().unwrap_or(&[])
    }

    /// Number of particles.
    #[inline]
    pub fn count(&self) -> usize {
        self.tree.len()
    }
}

/// Position of particle `index` on the tree (no randomness).
pub fn tree_position(index: usize, count: usize) -> Vec3 {
    let p = index as f32 / count as f32;
    let height = TREE_BASE + p * TREE_HEIGHT;
    let level_phase = (p * TREE_TIERS).fract();
    let radius = (1.0 - p) * TREE_TAPER + (1.0 - level_phase) * TREE_TIER_BULGE;
    let angle = index as f32 * TREE_ANGLE_STEP;
    Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
}

/// Pick a tree color from a uniform draw `u` in `[0, 1)`.
///
/// Ornament and light colors exceed 1.0 so they bloom after the shader's gain.
/// `brightness` only affects foliage.
pub fn tree_color(u: f32, brightness: f32) -> Vec3 {
    if u > 0.85 {
        ORNAMENT_RED
    } else if u > 0.75 {
        ORNAMENT_GOLD
    } else if u > 0.7 {
        FAIRY_LIGHT
    } else {
        Vec3::new(0.1, (0.5 + brightness) * 1.5, 0.2)
    }
}

/// Tiered spiral cone with randomly bucketed colors.
pub fn tree_layout<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Layout {
    let mut positions = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);
    for i in 0..count {
        positions.push(tree_position(i, count));
        let u: f32 = rng.gen();
        let brightness: f32 = rng.gen();
        colors.push(tree_color(u, brightness));
    }
    Layout {
        positions,
        colors: Some(colors),
    }
}

/// Uniform directions on a sphere with radius in `[min_radius, min_radius + span)`.
pub fn explode_layout<R: Rng + ?Sized>(
    count: usize,
    min_radius: f32,
    span: f32,
    rng: &mut R,
) -> Layout {
    let positions = (0..count)
        .map(|_| {
            let theta = rng.gen_range(0.0..TAU);
            let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
            let r = min_radius + rng.gen::<f32>() * span;
            Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            )
        })
        .collect();
    Layout {
        positions,
        colors: None,
    }
}

/// Row-major grid in the `z = 0` plane, row 0 at the top.
pub fn photo_layout(rows: u32, item_size: f32) -> Layout {
    let spacing = item_size * 1.5;
    let half = rows as f32 / 2.0;
    let count = (rows * rows) as usize;
    let positions = (0..count)
        .map(|i| {
            let col = (i % rows as usize) as f32;
            let row = (i / rows as usize) as f32;
            Vec3::new((col - half) * spacing, -(row - half) * spacing, 0.0)
        })
        .collect();
    Layout {
        positions,
        colors: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn layouts() -> Layouts {
        Layouts::generate(&Config::default(), &mut SmallRng::seed_from_u64(7))
    }

    #[test]
    fn test_first_tree_particle() {
        let p = tree_position(0, 2500);
        assert!((p - Vec3::new(9.0, -6.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_tree_height_bounds() {
        let layouts = layouts();
        for p in &layouts.get(Mode::Tree).positions {
            assert!(p.y >= -6.0 && p.y <= 5.0, "height {} out of range", p.y);
        }
    }

    #[test]
    fn test_tree_tapers_toward_tip() {
        let base = tree_position(0, 2500);
        let near_tip = tree_position(2499, 2500);
        let r = |v: Vec3| Vec3::new(v.x, 0.0, v.z).length();
        assert!(r(near_tip) < r(base));
        assert!(r(near_tip) < 2.1);
    }

    #[test]
    fn test_explode_radius_bounds() {
        let layouts = layouts();
        let explode = layouts.get(Mode::Explode);
        assert!(explode.colors.is_none());
        for p in &explode.positions {
            let r = p.length();
            assert!(r >= 2.0 - 1e-4 && r < 18.0 + 1e-4, "radius {} out of range", r);
        }
    }

    #[test]
    fn test_tree_color_buckets() {
        assert_eq!(tree_color(0.9, 0.0), ORNAMENT_RED);
        assert_eq!(tree_color(0.85, 0.0), ORNAMENT_GOLD);
        assert_eq!(tree_color(0.8, 0.0), ORNAMENT_GOLD);
        assert_eq!(tree_color(0.75, 0.0), FAIRY_LIGHT);
        assert_eq!(tree_color(0.72, 0.0), FAIRY_LIGHT);
        assert_eq!(tree_color(0.7, 0.0), Vec3::new(0.1, 0.75, 0.2));
        assert_eq!(tree_color(0.1, 1.0), Vec3::new(0.1, 2.25, 0.2));
    }

    #[test]
    fn test_photo_grid_is_row_major() {
        let layout = photo_layout(50, 0.42);
        let spacing = 0.42 * 1.5;
        assert_eq!(layout.len(), 2500);
        assert!((layout.positions[0] - Vec3::new(-25.0 * spacing, 25.0 * spacing, 0.0)).length() < 1e-4);
        // Next column moves right, next row moves down.
        assert!((layout.positions[1].x - layout.positions[0].x - spacing).abs() < 1e-4);
        assert!((layout.positions[50].y - layout.positions[0].y + spacing).abs() < 1e-4);
        assert!(layout.positions.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn test_all_layouts_share_count() {
        let layouts = layouts();
        assert_eq!(layouts.count(), 2500);
        assert_eq!(layouts.get(Mode::Explode).len(), 2500);
        assert_eq!(layouts.get(Mode::Photo).len(), 2500);
        assert_eq!(layouts.tree_colors().len(), 2500);
    }
}
