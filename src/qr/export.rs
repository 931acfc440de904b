//! Padded PNG composition for saving a rendered QR code

use crate::error::{Error, Result};
use crate::qr::QrBitmap;
use crate::style::{Color, MAX_SIZE, MIN_SIZE};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// File name used when the caller does not pick one
pub const DEFAULT_FILENAME: &str = "qrcode.png";

/// Padding added on every side: 20% of the QR edge, rounded down.
pub fn padding_for(size: u32) -> u32 {
    size / 5
}

/// Compose the bitmap onto a white, padded square canvas.
///
/// The canvas is always filled opaque white; `_background` is accepted for
/// interface compatibility and does not affect the fill. `logo` overlays are
/// not implemented and are ignored.
pub fn compose(
    bitmap: Option<&QrBitmap>,
    size: u32,
    _background: Color,
    logo: Option<&RgbaImage>,
) -> Result<RgbImage> {
    let bitmap = bitmap.ok_or(Error::SourceNotFound)?;
    if logo.is_some() {
        tracing::debug!("Logo overlay requested but not supported, ignoring");
    }

    let size = size.clamp(MIN_SIZE, MAX_SIZE);
    let padding = padding_for(size);
    let total = size + padding * 2;
    let mut canvas = RgbImage::from_pixel(total, total, Color::WHITE.to_pixel());

    if bitmap.size() == size {
        imageops::replace(&mut canvas, bitmap.image(), padding as i64, padding as i64);
    } else {
        let scaled = imageops::resize(bitmap.image(), size, size, FilterType::Nearest);
        imageops::replace(&mut canvas, &scaled, padding as i64, padding as i64);
    }

    Ok(canvas)
}

/// Compose and encode as PNG bytes.
pub fn export_png(
    bitmap: Option<&QrBitmap>,
    size: u32,
    background: Color,
    logo: Option<&RgbaImage>,
) -> Result<Vec<u8>> {
    let canvas = compose(bitmap, size, background, logo)?;
    let mut bytes = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    tracing::debug!(
        edge = canvas.width(),
        bytes = bytes.len(),
        "Encoded padded QR code as PNG"
    );
    Ok(bytes)
}

/// Write PNG bytes to `dir/filename` (default [`DEFAULT_FILENAME`]), returning the path.
pub fn save_png(bytes: &[u8], dir: &Path, filename: Option<&str>) -> Result<PathBuf> {
    let name = filename.unwrap_or(DEFAULT_FILENAME);
    if name.trim().is_empty() {
        return Err(Error::Config("Export filename must not be empty".to_string()));
    }

    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)?;
    }
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), "Saved QR code");
    Ok(path)
}
