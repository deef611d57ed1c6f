//! Falling snow around the scene.

use crate::shader::{SpriteInstance, SpriteShape};
use glam::{Vec3, Vec4};
use rand::Rng;

/// Half the edge of the cube the flakes live in.
pub const SNOW_EXTENT: f32 = 20.0;

const FLAKE_SIZE: f32 = 0.06;
const FLAKE_COLOR: Vec4 = Vec4::new(1.0, 1.0, 1.0, 0.8);

/// A field of flakes drifting downward at individual speeds.
#[derive(Debug, Clone)]
pub struct Snowfall {
    positions: Vec<Vec3>,
    speeds: Vec<f32>,
}

impl Snowfall {
    /// Scatter `count` flakes uniformly in the cube.
    pub fn new<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let positions = (0..count)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-SNOW_EXTENT..SNOW_EXTENT),
                    rng.gen_range(-SNOW_EXTENT..SNOW_EXTENT),
                    rng.gen_range(-SNOW_EXTENT..SNOW_EXTENT),
                )
            })
            .collect();
        let speeds = (0..count).map(|_| rng.gen_range(0.02..0.07)).collect();
        Self { positions, speeds }
    }

    /// Advance one frame. Flakes that fall below the cube re-enter at the top.
    pub fn update(&mut self) {
        for (p, speed) in self.positions.iter_mut().zip(&self.speeds) {
            p.y -= speed;
            if p.y < -SNOW_EXTENT {
                p.y = SNOW_EXTENT;
            }
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append one sprite per flake.
    pub fn sprites(&self, out: &mut Vec<SpriteInstance>) {
        out.extend(
            self.positions
                .iter()
                .map(|&p| SpriteInstance::new(p, FLAKE_SIZE, FLAKE_COLOR, 0.0, SpriteShape::Disc)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_flakes_start_inside_cube() {
        let snow = Snowfall::new(500, &mut SmallRng::seed_from_u64(1));
        assert_eq!(snow.len(), 500);
        assert!(snow
            .positions()
            .iter()
            .all(|p| p.abs().max_element() <= SNOW_EXTENT));
    }

    #[test]
    fn test_flakes_fall_and_wrap() {
        let mut snow = Snowfall {
            positions: vec![Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, -19.99, 0.0)],
            speeds: vec![0.05, 0.05],
        };
        snow.update();
        assert!((snow.positions()[0].y + 0.05).abs() < 1e-6);
        assert_eq!(snow.positions()[0].x, 1.0);
        assert_eq!(snow.positions()[1].y, SNOW_EXTENT);
    }

    #[test]
    fn test_speeds_in_range() {
        let snow = Snowfall::new(1000, &mut SmallRng::seed_from_u64(2));
        assert!(snow.speeds.iter().all(|s| (0.02..0.07).contains(s)));
    }

    #[test]
    fn test_sprites_match_flakes() {
        let snow = Snowfall::new(10, &mut SmallRng::seed_from_u64(3));
        let mut sprites = Vec::new();
        snow.sprites(&mut sprites);
        assert_eq!(sprites.len(), 10);
        assert_eq!(sprites[3].position, snow.positions()[3].to_array());
    }
}
