//! Character-count heuristics that gate QR rendering and cloud upload
//!
//! The thresholds approximate real QR byte capacity and are used purely for
//! UX gating: above [`WARN_THRESHOLD`] an upload is offered, above
//! [`HARD_LIMIT`] rendering is refused outright.

use crate::error::{Error, Result};
use serde::Serialize;

/// Above this many characters an upload is recommended.
pub const WARN_THRESHOLD: usize = 2000;

/// Above this many characters rendering is refused.
pub const HARD_LIMIT: usize = 2500;

/// Above this many characters the counter is highlighted.
pub const ELEVATED_THRESHOLD: usize = 1500;

/// Classification of a payload against the capacity thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    /// Fits comfortably
    Ok,
    /// Renderable, but uploading is recommended
    Warn,
    /// Too large to render
    OverLimit,
}

impl CapacityStatus {
    /// Reject payloads that must not reach the renderer.
    pub fn ensure_renderable(self, char_count: usize) -> Result<()> {
        match self {
            CapacityStatus::OverLimit => Err(Error::CapacityExceeded {
                char_count,
                limit: HARD_LIMIT,
            }),
            CapacityStatus::Ok | CapacityStatus::Warn => Ok(()),
        }
    }
}

/// Display tier for the character counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    /// Plain counter
    Normal,
    /// Approaching the warning threshold
    Elevated,
    /// Upload recommended
    Critical,
}

/// Result of [`classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityReport {
    /// Threshold classification
    pub status: CapacityStatus,
    /// Measured length of the payload
    pub char_count: usize,
}

impl CapacityReport {
    /// Fill ratio against the hard limit. Exceeds 1.0 for oversized payloads.
    pub fn ratio(&self) -> f32 {
        self.char_count as f32 / HARD_LIMIT as f32
    }

    /// Counter highlight tier.
    pub fn emphasis(&self) -> Emphasis {
        if self.char_count > WARN_THRESHOLD {
            Emphasis::Critical
        } else if self.char_count > ELEVATED_THRESHOLD {
            Emphasis::Elevated
        } else {
            Emphasis::Normal
        }
    }

    /// Whether offloading the payload to a cloud host should be offered.
    pub fn upload_recommended(&self) -> bool {
        !matches!(self.status, CapacityStatus::Ok)
    }

    /// Counter label, e.g. `Characters: 19 / 2500`.
    pub fn label(&self) -> String {
        let prefix = if self.char_count > WARN_THRESHOLD {
            "Cloud Recommended: "
        } else {
            ""
        };
        format!("{prefix}Characters: {} / {HARD_LIMIT}", self.char_count)
    }
}

/// Length as the capacity policy measures it (UTF-16 code units).
pub fn char_count(payload: &str) -> usize {
    payload.encode_utf16().count()
}

/// Classify a payload against the capacity thresholds.
pub fn classify(payload: &str) -> CapacityReport {
    let char_count = char_count(payload);
    let status = if char_count > HARD_LIMIT {
        CapacityStatus::OverLimit
    } else if char_count > WARN_THRESHOLD {
        CapacityStatus::Warn
    } else {
        CapacityStatus::Ok
    };

    CapacityReport { status, char_count }
}
