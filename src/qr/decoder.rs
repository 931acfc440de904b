//! Read rendered QR codes back with rqrr, for verifying exported output

use crate::error::{Error, Result};
use image::DynamicImage;

/// Decode the first QR code found in an image into text.
pub fn decode_image(img: &DynamicImage) -> Result<String> {
    let gray = img.to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare(gray);

    let grids = prepared.detect_grids();
    let grid = grids.first().ok_or(Error::NoQrCodeFound)?;

    match grid.decode() {
        Ok((meta, content)) => {
            tracing::debug!(
                "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                meta.version,
                meta.ecc_level,
                content.len()
            );
            Ok(content)
        }
        Err(e) => Err(Error::QrDecode(format!("Decode failed: {:?}", e))),
    }
}

/// Decode encoded image bytes (PNG or any format `image` can guess).
pub fn decode_bytes(bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(bytes)?;
    decode_image(&img)
}
