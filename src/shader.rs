//! GPU-side data layouts and the shading rules they feed.
//!
//! Every struct here is `#[repr(C)]` and `Pod` so it can be written to a
//! buffer as-is; the matching WGSL declarations live in `shader.wgsl`.
//! [`shade_fragment`] mirrors the particle fragment shader on the CPU.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::config::ATLAS_COLUMNS;

pub const SHADER_SOURCE: &str = include_str!("shader.wgsl");

/// Per-frame uniforms shared by every pipeline.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub camera_position: [f32; 4],
    pub fog_color: [f32; 4],
    pub time: f32,
    pub photo_mix: f32,
    pub fog_near: f32,
    pub fog_far: f32,
    pub item_size: f32,
    pub scene_offset: f32,
    /// Strength of the capture flash overlay, 0 when inactive.
    pub flash: f32,
    pub _pad: f32,
}

/// One morphing particle.
///
/// Vertex locations: 0-3 model matrix columns, 4 color, 5 atlas index.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 3],
    pub atlas_index: u32,
}

impl ParticleInstance {
    pub fn new(model: Mat4, color: Vec3, atlas_index: u32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.to_array(),
            atlas_index,
        }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        0 => Float32x4,
        1 => Float32x4,
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x3,
        5 => Uint32,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Outline drawn by the sprite fragment shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SpriteShape {
    /// Soft round dot.
    Disc = 0,
    /// Spinning diamond.
    Star = 1,
    /// Faint glow that fades toward the rim.
    Halo = 2,
}

/// A camera-facing decorative sprite.
///
/// Vertex locations: 0 position, 1 size, 2 color, 3 rotation, 4 shape.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpriteInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
    pub rotation: f32,
    pub shape: u32,
    pub _pad: [f32; 2],
}

impl SpriteInstance {
    pub fn new(position: Vec3, size: f32, color: Vec4, rotation: f32, shape: SpriteShape) -> Self {
        Self {
            position: position.to_array(),
            size,
            color: color.to_array(),
            rotation,
            shape: shape as u32,
            _pad: [0.0; 2],
        }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
        2 => Float32x4,
        3 => Float32,
        4 => Uint32,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Texture coordinate inside the atlas for `uv` on a particle's quad.
///
/// `uv` has its origin at the quad's top-left corner; row 0 of the atlas is
/// its top row.
pub fn atlas_uv(atlas_index: u32, uv: Vec2) -> Vec2 {
    let cols = ATLAS_COLUMNS as f32;
    let col = (atlas_index % ATLAS_COLUMNS) as f32;
    let row = (atlas_index / ATLAS_COLUMNS) as f32;
    uv / cols + Vec2::new(col / cols, row / cols)
}

/// Particle fragment color for a texel `tex`, or `None` if discarded.
pub fn shade_fragment(tex: Vec4, color: Vec3, photo_mix: f32) -> Option<Vec4> {
    let animal = (tex.truncate() * 1.5).powf(1.1);
    let pixel = color * 2.5;
    let mut rgb = animal.lerp(pixel, photo_mix);
    let alpha = tex.w + (1.0 - tex.w) * photo_mix;

    if photo_mix < 0.5 && alpha < 0.9 {
        rgb = rgb.lerp(rgb * color * 2.0, 0.5);
    }
    if alpha < 0.1 {
        return None;
    }
    Some(rgb.extend(alpha))
}
