//! Render pipeline: resolved payload + style → [`RenderOutcome`]

use crate::capacity::{self, HARD_LIMIT};
use crate::error::{Error, Result};
use crate::qr::QrBitmap;
use crate::style::{MAX_SIZE, MIN_SIZE, StyleParameters};
use image::RgbImage;
use qrcode::QrCode;

/// User-facing message for the failure states
pub const FAILURE_MESSAGE: &str = "Data too large or invalid";

static EMPTY: RenderOutcome = RenderOutcome::Empty;

/// Result of one render attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Nothing to encode
    Empty,
    /// Payload exceeds the hard character limit; the library was not invoked
    TooLarge,
    /// The QR library refused the payload
    RenderFailure(String),
    /// Rendered bitmap
    Ready(QrBitmap),
}

impl RenderOutcome {
    /// The bitmap, if rendering succeeded
    pub fn bitmap(&self) -> Option<&QrBitmap> {
        match self {
            RenderOutcome::Ready(bitmap) => Some(bitmap),
            _ => None,
        }
    }

    /// Whether a bitmap is available
    pub fn is_ready(&self) -> bool {
        matches!(self, RenderOutcome::Ready(_))
    }

    /// Whether the outcome should be shown as "too large or invalid"
    pub fn is_failure(&self) -> bool {
        matches!(self, RenderOutcome::TooLarge | RenderOutcome::RenderFailure(_))
    }

    /// Convert into a `Result`, mapping every non-ready state to an error.
    pub fn into_result(self, payload_len: usize) -> Result<QrBitmap> {
        match self {
            RenderOutcome::Ready(bitmap) => Ok(bitmap),
            RenderOutcome::Empty => Err(Error::EmptyPayload),
            RenderOutcome::TooLarge => Err(Error::CapacityExceeded {
                char_count: payload_len,
                limit: HARD_LIMIT,
            }),
            RenderOutcome::RenderFailure(reason) => Err(Error::RenderFailure(reason)),
        }
    }
}

/// Render a resolved payload with the given style.
pub fn render(resolved_payload: &str, style: &StyleParameters) -> RenderOutcome {
    if resolved_payload.is_empty() {
        return RenderOutcome::Empty;
    }

    let char_count = capacity::char_count(resolved_payload);
    if char_count > HARD_LIMIT {
        tracing::debug!(char_count, "Payload over hard limit, not rendering");
        return RenderOutcome::TooLarge;
    }

    let code = match QrCode::with_error_correction_level(
        resolved_payload.as_bytes(),
        style.error_correction.to_ec_level(),
    ) {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!(
                char_count,
                level = %style.error_correction,
                "QR encoder rejected payload: {e}"
            );
            return RenderOutcome::RenderFailure(e.to_string());
        }
    };

    let bitmap = paint(&code, style);
    tracing::debug!(
        modules = bitmap.modules(),
        size = bitmap.size(),
        level = %style.error_correction,
        "Rendered QR code"
    );
    RenderOutcome::Ready(bitmap)
}

/// Paint the module matrix onto an exact `size × size` raster using nearest-module sampling.
///
/// `size` is clamped into the supported range since style fields are public.
fn paint(code: &QrCode, style: &StyleParameters) -> QrBitmap {
    let modules = code.width();
    let size = style.size.clamp(MIN_SIZE, MAX_SIZE);
    let colors = code.to_colors();
    let dark = style.foreground.to_pixel();
    let light = style.background.to_pixel();

    let image = RgbImage::from_fn(size, size, |x, y| {
        let mx = x as usize * modules / size as usize;
        let my = y as usize * modules / size as usize;
        match colors[my * modules + mx] {
            qrcode::Color::Dark => dark,
            qrcode::Color::Light => light,
        }
    });

    QrBitmap::new(image, modules)
}

/// Keeps the latest render outcome and re-renders only when inputs change
#[derive(Debug, Default)]
pub struct Renderer {
    last: Option<Rendered>,
}

#[derive(Debug)]
struct Rendered {
    payload: String,
    style: StyleParameters,
    outcome: RenderOutcome,
}

impl Renderer {
    /// Create an empty renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the outcome for the given inputs.
    ///
    /// Identical inputs return the cached outcome. A cached `RenderFailure`
    /// is only kept while payload and error correction level are unchanged;
    /// size or color changes alone still repaint a ready bitmap.
    pub fn update(&mut self, payload: &str, style: &StyleParameters) -> &RenderOutcome {
        let reuse = match &self.last {
            Some(last) if last.payload == payload => {
                if last.style == *style {
                    true
                } else {
                    // Failure state survives size/color tweaks with the same level.
                    matches!(last.outcome, RenderOutcome::RenderFailure(_))
                        && last.style.error_correction == style.error_correction
                }
            }
            _ => false,
        };

        if reuse {
            if let Some(last) = self.last.as_mut() {
                last.style = *style;
            }
        } else {
            self.last = Some(Rendered {
                payload: payload.to_string(),
                style: *style,
                outcome: render(payload, style),
            });
        }

        match &self.last {
            Some(last) => &last.outcome,
            None => &EMPTY,
        }
    }

    /// Latest outcome, `Empty` before the first update
    pub fn outcome(&self) -> &RenderOutcome {
        match &self.last {
            Some(last) => &last.outcome,
            None => &EMPTY,
        }
    }
}
