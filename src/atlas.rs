//! Decorative texture atlas.
//!
//! Up to 16 images are framed and packed into a single 1024×1024 RGBA texture,
//! four tiles across. Each tile is a translucent plate with a white border and
//! the image (center-cropped to a square) in the middle. Images that cannot be
//! fetched get a dark placeholder so the atlas is always complete.
//!
//! Row 0 is the top row of the texture, so atlas index `k` lives at column
//! `k % 4`, row `k / 4` with the origin in the top-left corner.
//!
//! # Example
//!
//! ```ignore
//! use tinsel::atlas::{FileImageFetcher, TextureAtlasBuilder};
//!
//! let atlas = TextureAtlasBuilder::new().build(&["assets/owl.png"], &FileImageFetcher);
//! assert_eq!(atlas.width, 1024);
//! ```

use crate::config::{ATLAS_CELLS, ATLAS_COLUMNS};
use crate::error::AtlasError;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Side length of one tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Side length of the whole atlas in pixels.
pub const ATLAS_SIZE: u32 = TILE_SIZE * ATLAS_COLUMNS;

const PLATE_INSET: u32 = 5;
const PLATE_COLOR: Rgba<u8> = Rgba([10, 20, 30, 128]);
const BORDER_INSET: u32 = 8;
const BORDER_WIDTH: u32 = 5;
const BORDER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const FRAME_COLOR: Rgba<u8> = Rgba([255, 255, 255, 77]);
const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 255]);

/// Padding between the tile edge and the image square.
pub const IMAGE_PADDING: u32 = 65;

/// Side length of the image square inside a tile.
pub const IMAGE_SIZE: u32 = TILE_SIZE - IMAGE_PADDING * 2;

/// Retrieves one image per source string.
pub trait ImageFetcher {
    fn fetch(&self, source: &str) -> Result<RgbaImage, AtlasError>;
}

/// Reads images from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageFetcher;

impl ImageFetcher for FileImageFetcher {
    fn fetch(&self, source: &str) -> Result<RgbaImage, AtlasError> {
        let path = Path::new(source);
        if !path.exists() {
            return Err(AtlasError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", source),
            )));
        }
        Ok(image::open(path)?.into_rgba8())
    }
}

/// Finished atlas pixels, ready for upload.
#[derive(Debug, Clone)]
pub struct AtlasTexture {
    /// Raw RGBA pixel data (width * height * 4 bytes), top row first.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Number of tiles that received a real image.
    pub loaded: usize,
}

impl AtlasTexture {
    /// Pixel origin of the tile for `index`.
    pub fn tile_origin(index: u32) -> (u32, u32) {
        let col = index % ATLAS_COLUMNS;
        let row = index / ATLAS_COLUMNS;
        (col * TILE_SIZE, row * TILE_SIZE)
    }

    /// Read back one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

/// Packs images into an [`AtlasTexture`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureAtlasBuilder {
    filter: Option<FilterType>,
}

impl TextureAtlasBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resampling filter used when scaling images into tiles.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Build the atlas. Sources beyond the 16th are ignored; missing ones
    /// become placeholders.
    pub fn build<S: AsRef<str>>(&self, sources: &[S], fetcher: &dyn ImageFetcher) -> AtlasTexture {
        if sources.len() > ATLAS_CELLS as usize {
            log::warn!(
                "{} atlas images given, only the first {} are used",
                sources.len(),
                ATLAS_CELLS
            );
        }

        let mut canvas = RgbaImage::new(ATLAS_SIZE, ATLAS_SIZE);
        let mut loaded = 0;
        for index in 0..ATLAS_CELLS {
            let image = sources.get(index as usize).and_then(|source| {
                let source = source.as_ref();
                fetcher
                    .fetch(source)
                    .map_err(|e| log::warn!("atlas image '{}' unavailable: {}", source, e))
                    .ok()
            });
            if image.is_some() {
                loaded += 1;
            }
            self.draw_tile(&mut canvas, index, image.as_ref());
        }
        log::debug!("atlas built with {}/{} images", loaded, ATLAS_CELLS);

        AtlasTexture {
            data: canvas.into_raw(),
            width: ATLAS_SIZE,
            height: ATLAS_SIZE,
            loaded,
        }
    }

    fn draw_tile(&self, canvas: &mut RgbaImage, index: u32, image: Option<&RgbaImage>) {
        let (x, y) = AtlasTexture::tile_origin(index);

        let plate = TILE_SIZE - PLATE_INSET * 2;
        fill_rect(canvas, x + PLATE_INSET, y + PLATE_INSET, plate, plate, PLATE_COLOR);

        let border = TILE_SIZE - BORDER_INSET * 2;
        stroke_rect(canvas, x + BORDER_INSET, y + BORDER_INSET, border, BORDER_WIDTH, BORDER_COLOR);

        let (ix, iy) = (x + IMAGE_PADDING, y + IMAGE_PADDING);
        match image {
            Some(image) if image.width() > 0 && image.height() > 0 => {
                let filter = self.filter.unwrap_or(FilterType::Triangle);
                let square = center_square(image);
                let scaled = imageops::resize(&square, IMAGE_SIZE, IMAGE_SIZE, filter);
                imageops::overlay(canvas, &scaled, ix as i64, iy as i64);
                stroke_rect(canvas, ix, iy, IMAGE_SIZE, 1, FRAME_COLOR);
            }
            _ => fill_rect(canvas, ix, iy, IMAGE_SIZE, IMAGE_SIZE, PLACEHOLDER_COLOR),
        }
    }
}

/// Largest centered square of `image`.
fn center_square(image: &RgbaImage) -> RgbaImage {
    let side = image.width().min(image.height());
    let x = (image.width() - side) / 2;
    let y = (image.height() - side) / 2;
    imageops::crop_imm(image, x, y, side, side).to_image()
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for py in y..y + h {
        for px in x..x + w {
            blend(canvas, px, py, color);
        }
    }
}

/// Square outline of side `size` whose outer edge starts at `(x, y)`.
fn stroke_rect(canvas: &mut RgbaImage, x: u32, y: u32, size: u32, width: u32, color: Rgba<u8>) {
    let width = width.min(size / 2);
    fill_rect(canvas, x, y, size, width, color);
    fill_rect(canvas, x, y + size - width, size, width, color);
    fill_rect(canvas, x, y + width, width, size - width * 2, color);
    fill_rect(canvas, x + size - width, y + width, width, size - width * 2, color);
}

/// Source-over compositing of `color` onto one pixel.
fn blend(canvas: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    let dst = canvas.get_pixel_mut(x, y);
    let sa = color[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let s = color[c] as f32;
        let d = dst[c] as f32;
        dst[c] = ((s * sa + d * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Serves solid-color images by name.
    struct MapFetcher(HashMap<&'static str, RgbaImage>);

    impl ImageFetcher for MapFetcher {
        fn fetch(&self, source: &str) -> Result<RgbaImage, AtlasError> {
            self.0.get(source).cloned().ok_or_else(|| {
                AtlasError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, source.to_string()))
            })
        }
    }

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn center(index: u32) -> (u32, u32) {
        let (x, y) = AtlasTexture::tile_origin(index);
        (x + TILE_SIZE / 2, y + TILE_SIZE / 2)
    }

    #[test]
    fn test_tile_origin_is_row_major_from_top() {
        assert_eq!(AtlasTexture::tile_origin(0), (0, 0));
        assert_eq!(AtlasTexture::tile_origin(3), (768, 0));
        assert_eq!(AtlasTexture::tile_origin(4), (0, 256));
        assert_eq!(AtlasTexture::tile_origin(15), (768, 768));
    }

    #[test]
    fn test_images_land_in_their_tiles() {
        let fetcher = MapFetcher(HashMap::from([
            ("red", solid(300, 200, [255, 0, 0])),
            ("green", solid(64, 64, [0, 255, 0])),
        ]));
        let atlas = TextureAtlasBuilder::new().build(&["red", "missing", "green"], &fetcher);

        assert_eq!((atlas.width, atlas.height), (1024, 1024));
        assert_eq!(atlas.data.len(), 1024 * 1024 * 4);
        assert_eq!(atlas.loaded, 2);

        let (x, y) = center(0);
        assert_eq!(atlas.pixel(x, y), [255, 0, 0, 255]);
        let (x, y) = center(2);
        assert_eq!(atlas.pixel(x, y), [0, 255, 0, 255]);
    }

    #[test]
    fn test_missing_images_get_placeholders() {
        let atlas = TextureAtlasBuilder::new().build::<&str>(&[], &MapFetcher(HashMap::new()));
        assert_eq!(atlas.loaded, 0);
        for index in 0..ATLAS_CELLS {
            let (x, y) = center(index);
            assert_eq!(atlas.pixel(x, y), [0x33, 0x33, 0x33, 255]);
        }
    }

    #[test]
    fn test_tile_decorations() {
        let atlas = TextureAtlasBuilder::new().build::<&str>(&[], &MapFetcher(HashMap::new()));
        let (x, y) = AtlasTexture::tile_origin(5);
        // Outside the plate stays transparent.
        assert_eq!(atlas.pixel(x + 2, y + 2)[3], 0);
        // Plate only.
        assert_eq!(atlas.pixel(x + 6, y + 6), [10, 20, 30, 128]);
        // Border.
        assert_eq!(atlas.pixel(x + 10, y + 128), [255, 255, 255, 255]);
        // Between border and image.
        assert_eq!(atlas.pixel(x + 30, y + 30), [10, 20, 30, 128]);
    }

    #[test]
    fn test_file_fetcher_reports_missing_file() {
        assert!(FileImageFetcher.fetch("/no/such/image.png").is_err());
    }
}
