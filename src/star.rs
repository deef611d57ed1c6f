//! Star on top of the tree.

use crate::layout::Mode;
use crate::shader::{SpriteInstance, SpriteShape};
use glam::{Vec3, Vec4};

/// Height of the star above the scene origin, before the scene offset.
pub const STAR_HEIGHT: f32 = 6.2;

const STAR_SIZE: f32 = 1.6;
const HALO_SIZE: f32 = 2.4;
const GOLD: Vec4 = Vec4::new(1.0, 0.84, 0.0, 1.0);
const HALO: Vec4 = Vec4::new(1.0, 0.84, 0.0, 0.2);

/// A spinning, gently pulsing star with a faint halo.
#[derive(Debug, Clone)]
pub struct TreeStar {
    position: Vec3,
    spin: f32,
    tilt: f32,
    scale: f32,
    visible: bool,
}

impl TreeStar {
    /// `offset` is the scene's vertical offset.
    pub fn new(offset: f32) -> Self {
        Self {
            position: Vec3::new(0.0, STAR_HEIGHT + offset, 0.0),
            spin: 0.0,
            tilt: 0.0,
            scale: 1.0,
            visible: true,
        }
    }

    /// Advance one frame at `elapsed` seconds.
    pub fn update(&mut self, mode: Mode, elapsed: f32) {
        self.visible = mode == Mode::Tree;
        self.spin += 0.01;
        self.tilt = (elapsed * 2.0).sin() * 0.1;
        self.scale = 1.0 + (elapsed * 3.0).sin() * 0.1;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Append the halo and the star when visible.
    pub fn sprites(&self, out: &mut Vec<SpriteInstance>) {
        if !self.visible {
            return;
        }
        out.push(SpriteInstance::new(self.position, HALO_SIZE, HALO, 0.0, SpriteShape::Halo));
        out.push(SpriteInstance::new(
            self.position,
            STAR_SIZE * self.scale,
            GOLD,
            self.spin + self.tilt,
            SpriteShape::Star,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_only_in_tree() {
        let mut star = TreeStar::new(-1.0);
        let mut sprites = Vec::new();

        star.update(Mode::Tree, 0.0);
        star.sprites(&mut sprites);
        assert_eq!(sprites.len(), 2);

        for mode in [Mode::Explode, Mode::Photo] {
            sprites.clear();
            star.update(mode, 0.0);
            assert!(!star.is_visible());
            star.sprites(&mut sprites);
            assert!(sprites.is_empty());
        }
    }

    #[test]
    fn test_animation() {
        let mut star = TreeStar::new(-1.0);
        assert_eq!(star.position(), Vec3::new(0.0, 5.2, 0.0));
        for _ in 0..10 {
            star.update(Mode::Tree, 0.5);
        }
        assert!((star.spin() - 0.1).abs() < 1e-5);
        assert!((star.tilt() - 0.1 * 1.0f32.sin()).abs() < 1e-6);
        assert!((star.scale() - (1.0 + 0.1 * 1.5f32.sin())).abs() < 1e-6);
    }
}
