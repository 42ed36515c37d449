//! Sticker content kinds and the decoded stamp image

use crate::error::ModelError;
use crate::geometry::{Point, Size};
use image::RgbaImage;
use std::sync::Arc;

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Decoded raster image carried by an image sticker and its committed stamp
///
/// Pixels are decoded once and shared; cloning a `StampImage` is cheap.
#[derive(Debug, Clone)]
pub struct StampImage {
    pixels: Arc<RgbaImage>,
}

impl StampImage {
    /// Decode an encoded image (PNG, JPEG)
    pub fn decode(bytes: &[u8]) -> Result<Self, ModelError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_rgba(decoded)
    }

    /// Wrap already decoded pixels
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, ModelError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ModelError::EmptyImage);
        }
        Ok(Self { pixels: Arc::new(pixels) })
    }

    /// Natural size, one point per pixel
    pub fn size(&self) -> Size {
        Size::new(self.pixels.width() as f32, self.pixels.height() as f32)
    }

    pub fn width_px(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height_px(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Packed RGB samples, row-major, alpha dropped
    pub fn rgb_samples(&self) -> Vec<u8> {
        self.pixels.pixels().flat_map(|pixel| [pixel[0], pixel[1], pixel[2]]).collect()
    }

    /// Alpha channel as 8-bit gray samples, `None` when every pixel is opaque
    pub fn alpha_samples(&self) -> Option<Vec<u8>> {
        if self.pixels.pixels().all(|pixel| pixel[3] == u8::MAX) {
            return None;
        }
        Some(self.pixels.pixels().map(|pixel| pixel[3]).collect())
    }

    /// Whether two handles share the same decoded pixels
    pub fn ptr_eq(&self, other: &StampImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

/// What a sticker carries
///
/// Only `Image` commits to a page annotation; the other kinds can be placed and
/// manipulated but produce nothing when committed.
#[derive(Debug, Clone)]
pub enum StickerContent {
    Image(StampImage),
    Text { text: String, font_size: f32 },
    Shape { path: Vec<Point>, color: Color },
    Line { start: Point, end: Point, color: Color, width: f32 },
}

impl StickerContent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            StickerContent::Image(_) => "image",
            StickerContent::Text { .. } => "text",
            StickerContent::Shape { .. } => "shape",
            StickerContent::Line { .. } => "line",
        }
    }

    pub fn as_image(&self) -> Option<&StampImage> {
        match self {
            StickerContent::Image(image) => Some(image),
            _ => None,
        }
    }
}
