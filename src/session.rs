//! Single-user generator session
//!
//! A [`Session`] owns the raw input, the style and the latest upload result.
//! The payload that actually gets encoded is always derived from those, never
//! stored separately: the upload link wins while it still belongs to the
//! current raw content, otherwise the raw content is used.

use crate::capacity::{self, CapacityReport};
use crate::error::{Error, Result};
use crate::qr::{RenderOutcome, Renderer, export_png};
use crate::style::StyleParameters;
use crate::upload::{UploadChain, UploadResult};
use serde::{Deserialize, Serialize};

/// What the user is encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// A link
    #[default]
    Url,
    /// Free text
    Text,
}

/// Raw user input
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayloadInput {
    /// Input mode
    pub kind: PayloadKind,
    /// Content as typed
    pub raw_content: String,
}

impl PayloadInput {
    /// URL input
    pub fn url(raw: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Url,
            raw_content: raw.into(),
        }
    }

    /// Text input
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Text,
            raw_content: raw.into(),
        }
    }

    /// Whether the content parses as an absolute URL. Advisory only.
    pub fn looks_like_url(&self) -> bool {
        url::Url::parse(self.raw_content.trim()).is_ok()
    }
}

/// Snapshot of the content an upload was started for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    content: String,
}

impl UploadTicket {
    /// Content to upload
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone)]
struct StoredUpload {
    source: String,
    result: UploadResult,
}

/// One generator session
#[derive(Debug, Default)]
pub struct Session {
    input: PayloadInput,
    style: StyleParameters,
    upload: Option<StoredUpload>,
    upload_in_flight: bool,
    renderer: Renderer,
}

impl Session {
    /// New session with the given style and empty input
    pub fn new(style: StyleParameters) -> Self {
        Self {
            style: style.with_size(style.size),
            ..Self::default()
        }
    }

    /// Current input
    pub fn input(&self) -> &PayloadInput {
        &self.input
    }

    /// Current style
    pub fn style(&self) -> &StyleParameters {
        &self.style
    }

    /// Replace the input. Any previous upload result is discarded.
    pub fn set_input(&mut self, input: PayloadInput) {
        if input.raw_content != self.input.raw_content {
            self.upload = None;
        }
        self.input = input;
    }

    /// Replace the style. The size is clamped into the supported range.
    pub fn set_style(&mut self, style: StyleParameters) {
        self.style = style.with_size(style.size);
    }

    /// Latest upload result, if it still applies
    pub fn upload_result(&self) -> Option<&UploadResult> {
        self.upload
            .as_ref()
            .filter(|stored| stored.source == self.input.raw_content)
            .map(|stored| &stored.result)
    }

    /// Forget the upload link and go back to encoding the raw content.
    pub fn clear_upload(&mut self) {
        self.upload = None;
    }

    /// Whether an upload is running
    pub fn is_uploading(&self) -> bool {
        self.upload_in_flight
    }

    /// The string that gets encoded.
    pub fn resolved_payload(&self) -> &str {
        match self.upload_result() {
            Some(result) => &result.link,
            None => &self.input.raw_content,
        }
    }

    /// Capacity classification of the raw content
    pub fn input_capacity(&self) -> CapacityReport {
        capacity::classify(&self.input.raw_content)
    }

    /// Capacity classification of the resolved payload
    pub fn payload_capacity(&self) -> CapacityReport {
        capacity::classify(self.resolved_payload())
    }

    /// Mark an upload as started for the current raw content.
    pub fn begin_upload(&mut self) -> Result<UploadTicket> {
        if self.upload_in_flight {
            return Err(Error::UploadInProgress);
        }
        if self.input.raw_content.is_empty() {
            return Err(Error::EmptyPayload);
        }

        self.upload_in_flight = true;
        Ok(UploadTicket {
            content: self.input.raw_content.clone(),
        })
    }

    /// Record the result of an upload started with `ticket`.
    ///
    /// Returns `Ok(true)` when the link was applied and `Ok(false)` when it
    /// was discarded because the input changed meanwhile. Upload errors are
    /// passed through after the busy flag is cleared.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadResult>,
    ) -> Result<bool> {
        self.upload_in_flight = false;
        let result = result?;

        if ticket.content != self.input.raw_content {
            tracing::info!(
                service = %result.service_name,
                "Discarding stale upload result, input changed"
            );
            return Ok(false);
        }

        self.upload = Some(StoredUpload {
            source: ticket.content,
            result,
        });
        Ok(true)
    }

    /// Upload the current raw content through `chain` and apply the link.
    pub async fn upload_with(&mut self, chain: &UploadChain) -> Result<UploadResult> {
        let ticket = self.begin_upload()?;
        match chain.upload(ticket.content()).await {
            Ok(result) => {
                self.finish_upload(ticket, Ok(result.clone()))?;
                Ok(result)
            }
            Err(err) => {
                self.upload_in_flight = false;
                Err(err)
            }
        }
    }

    /// Render the resolved payload with the current style.
    pub fn render(&mut self) -> &RenderOutcome {
        let payload = self.resolved_payload().to_string();
        self.renderer.update(&payload, &self.style)
    }

    /// Latest render outcome
    pub fn outcome(&self) -> &RenderOutcome {
        self.renderer.outcome()
    }

    /// Export the current payload and style as padded PNG bytes.
    ///
    /// The outcome is brought up to date first, so edits made since the
    /// last [`render`](Self::render) are never exported stale.
    pub fn export(&mut self) -> Result<Vec<u8>> {
        let size = self.style.size;
        let background = self.style.background;
        export_png(self.render().bitmap(), size, background, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::CapacityStatus;
    use crate::style::{Color, MAX_SIZE, MIN_SIZE};

    fn uploaded(link: &str) -> Result<UploadResult> {
        Ok(UploadResult {
            service_name: "test".to_string(),
            link: link.to_string(),
        })
    }

    #[test]
    fn test_resolved_payload_defaults_to_raw() {
        let mut session = Session::default();
        session.set_input(PayloadInput::url("https://example.com"));
        assert_eq!(session.resolved_payload(), "https://example.com");
        assert!(session.input().looks_like_url());
    }

    #[test]
    fn test_upload_link_replaces_payload_until_input_changes() {
        let mut session = Session::default();
        session.set_input(PayloadInput::text("x".repeat(2600)));
        assert_eq!(session.input_capacity().status, CapacityStatus::OverLimit);

        let ticket = session.begin_upload().unwrap();
        assert!(session.is_uploading());
        assert!(session.finish_upload(ticket, uploaded("https://0x0.st/a.txt")).unwrap());
        assert!(!session.is_uploading());
        assert_eq!(session.resolved_payload(), "https://0x0.st/a.txt");
        assert_eq!(session.payload_capacity().status, CapacityStatus::Ok);

        session.set_input(PayloadInput::text("changed"));
        assert!(session.upload_result().is_none());
        assert_eq!(session.resolved_payload(), "changed");
    }

    #[test]
    fn test_clear_upload_restores_raw() {
        let mut session = Session::default();
        session.set_input(PayloadInput::text("hello"));
        let ticket = session.begin_upload().unwrap();
        session.finish_upload(ticket, uploaded("https://host.test/1")).unwrap();
        session.clear_upload();
        assert_eq!(session.resolved_payload(), "hello");
    }

    #[test]
    fn test_reentrant_upload_rejected() {
        let mut session = Session::default();
        session.set_input(PayloadInput::text("hello"));
        let _ticket = session.begin_upload().unwrap();
        assert!(matches!(session.begin_upload(), Err(Error::UploadInProgress)));
    }

    #[test]
    fn test_empty_input_cannot_upload() {
        let mut session = Session::default();
        assert!(matches!(session.begin_upload(), Err(Error::EmptyPayload)));
        assert!(!session.is_uploading());
    }

    #[test]
    fn test_stale_upload_discarded() {
        let mut session = Session::default();
        session.set_input(PayloadInput::text("first"));
        let ticket = session.begin_upload().unwrap();
        session.set_input(PayloadInput::text("second"));

        let applied = session
            .finish_upload(ticket, uploaded("https://host.test/first"))
            .unwrap();
        assert!(!applied);
        assert_eq!(session.resolved_payload(), "second");
    }

    #[test]
    fn test_failed_upload_clears_busy_flag() {
        let mut session = Session::default();
        session.set_input(PayloadInput::text("hello"));
        let ticket = session.begin_upload().unwrap();
        let result = session.finish_upload(
            ticket,
            Err(Error::AllServicesUnreachable("down".to_string())),
        );
        assert!(matches!(result, Err(Error::AllServicesUnreachable(_))));
        assert!(!session.is_uploading());
        assert!(session.begin_upload().is_ok());
    }

    #[test]
    fn test_render_uses_resolved_payload() {
        let mut session = Session::default();
        session.set_input(PayloadInput::text("y".repeat(2600)));
        assert_eq!(*session.render(), RenderOutcome::TooLarge);

        let ticket = session.begin_upload().unwrap();
        session
            .finish_upload(ticket, uploaded("https://host.test/short"))
            .unwrap();
        assert!(session.render().is_ready());
    }

    #[test]
    fn test_export_renders_current_payload() {
        let mut session = Session::default();
        assert!(matches!(session.export(), Err(Error::SourceNotFound)));

        session.set_input(PayloadInput::url("https://example.com"));
        let bytes = session.export().unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (358, 358));
    }

    #[test]
    fn test_export_after_clearing_input_fails() {
        let mut session = Session::default();
        session.set_input(PayloadInput::url("https://example.com"));
        assert!(session.render().is_ready());

        session.set_input(PayloadInput::url(""));
        assert!(matches!(session.export(), Err(Error::SourceNotFound)));
        assert_eq!(*session.outcome(), RenderOutcome::Empty);
    }

    #[test]
    fn test_export_after_clearing_upload_uses_raw_content() {
        let mut session = Session::default();
        session.set_input(PayloadInput::text("z".repeat(2600)));
        let ticket = session.begin_upload().unwrap();
        session
            .finish_upload(ticket, uploaded("https://host.test/short"))
            .unwrap();
        assert!(session.render().is_ready());

        session.clear_upload();
        assert!(matches!(session.export(), Err(Error::SourceNotFound)));
        assert_eq!(*session.outcome(), RenderOutcome::TooLarge);
    }

    #[test]
    fn test_export_picks_up_color_change() {
        let red = Color::rgb(255, 0, 0);
        let mut session = Session::default();
        session.set_input(PayloadInput::url("https://example.com"));
        assert!(session.render().is_ready());

        let style = session.style().with_colors(red, Color::WHITE);
        session.set_style(style);
        let bytes = session.export().unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();
        // Top-left module of the finder pattern, just inside the padding
        assert_eq!(*img.get_pixel(51, 51), red.to_pixel());
    }

    #[test]
    fn test_oversized_style_is_clamped() {
        let huge = StyleParameters {
            size: 100_000,
            ..StyleParameters::default()
        };
        let mut session = Session::new(huge);
        assert_eq!(session.style().size, MAX_SIZE);

        session.set_style(StyleParameters {
            size: 1,
            ..StyleParameters::default()
        });
        assert_eq!(session.style().size, MIN_SIZE);
    }
}
