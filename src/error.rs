//! Error types for qrforge operations

use thiserror::Error;

/// Result type alias using qrforge's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrforge operations
#[derive(Error, Debug)]
pub enum Error {
    /// Payload is too large for reliable QR encoding
    #[error("Payload too large for a QR code: {char_count} characters (limit {limit})")]
    CapacityExceeded {
        /// Measured payload length
        char_count: usize,
        /// Hard limit that was exceeded
        limit: usize,
    },

    /// Every configured upload service failed
    #[error("{0}")]
    AllServicesUnreachable(String),

    /// The QR library refused the payload
    #[error("Data too large or invalid: {0}")]
    RenderFailure(String),

    /// Export was requested before anything was rendered
    #[error("No rendered QR code available, generate a QR code first")]
    SourceNotFound,

    /// Operation needs a non-empty payload
    #[error("Payload is empty")]
    EmptyPayload,

    /// An upload for this session is already running
    #[error("An upload is already in progress")]
    UploadInProgress,

    /// Color string could not be parsed
    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    /// Style parameters out of range or malformed
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// HTTP client setup error
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure should be shown as the generic "too large or invalid" state.
    pub fn is_capacity_related(&self) -> bool {
        matches!(self, Error::CapacityExceeded { .. } | Error::RenderFailure(_))
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_includes_counts() {
        let err = Error::CapacityExceeded {
            char_count: 2600,
            limit: 2500,
        };
        let message = err.to_string();
        assert!(message.contains("2600"));
        assert!(message.contains("2500"));
        assert!(err.is_capacity_related());
    }

    #[test]
    fn test_source_not_found_is_not_capacity() {
        assert!(!Error::SourceNotFound.is_capacity_related());
    }
}
