//! qrforge - capacity-aware QR code generator
//!
//! Turns a URL or free text into a styled QR code and a padded PNG. Payloads
//! too large for a reliable QR symbol can be offloaded to an anonymous file
//! host, in which case the returned link is encoded instead.
//!
//! # Features
//!
//! - **Capacity policy**: character thresholds that flag oversized payloads
//! - **Upload fallback chain**: ordered anonymous hosts, first success wins
//! - **Render pipeline**: explicit [`RenderOutcome`] instead of panics
//! - **Export**: white-padded PNG ready to print or share
//!
//! # Example
//!
//! ```no_run
//! use qrforge::{PayloadInput, Session, StyleParameters, UploadChain, UploadOptions};
//!
//! #[tokio::main]
//! async fn main() -> qrforge::Result<()> {
//!     let mut session = Session::new(StyleParameters::default());
//!     session.set_input(PayloadInput::text("a very long note ..."));
//!
//!     if session.input_capacity().upload_recommended() {
//!         let chain = UploadChain::from_options(&UploadOptions::default())?;
//!         session.upload_with(&chain).await?;
//!     }
//!
//!     session.render();
//!     let png = session.export()?;
//!     std::fs::write("qrcode.png", png)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod capacity;
pub mod config;
pub mod error;
pub mod logging;
pub mod qr;
pub mod session;
pub mod style;
pub mod upload;

// Re-exports for convenience
pub use error::{Error, Result};

pub use capacity::{CapacityReport, CapacityStatus, classify};
pub use config::{ExportOptions, LogRotation, LoggingOptions, QrForgeConfig, UploadOptions};
pub use qr::{QrBitmap, RenderOutcome, Renderer, export_png, render};
pub use session::{PayloadInput, PayloadKind, Session};
pub use style::{Color, ErrorCorrection, StyleParameters};
pub use upload::{UploadChain, UploadResult, UploadService};
