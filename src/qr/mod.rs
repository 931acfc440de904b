//! QR code rendering, export and verification
//!
//! Rendering turns a resolved payload plus [`StyleParameters`](crate::style::StyleParameters)
//! into a [`RenderOutcome`]; export pads a rendered bitmap onto a white canvas
//! and encodes it as PNG; the decoder reads images back for verification.

mod decoder;
pub mod export;
pub mod render;

pub use decoder::{decode_bytes, decode_image};
pub use export::{DEFAULT_FILENAME, compose, export_png, padding_for, save_png};
pub use render::{RenderOutcome, Renderer, render};

use image::RgbImage;

/// A rendered QR code: an RGB raster exactly `size × size`, no quiet zone
#[derive(Debug, Clone, PartialEq)]
pub struct QrBitmap {
    image: RgbImage,
    modules: usize,
}

impl QrBitmap {
    pub(crate) fn new(image: RgbImage, modules: usize) -> Self {
        Self { image, modules }
    }

    /// Edge length in pixels
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Number of modules per side of the underlying symbol
    pub fn modules(&self) -> usize {
        self.modules
    }

    /// Borrow the raster
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Take ownership of the raster
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}
