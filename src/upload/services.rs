//! Built-in HTTP upload hosts and their response parsers

use crate::config::ServiceEntry;
use crate::error::{Error, Result};
use crate::upload::{ServiceError, UPLOAD_FILENAME, UPLOAD_MIME, UploadService, validate_link};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method};
use serde::{Deserialize, Serialize};

/// How a service reports the uploaded link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// JSON object `{ "success": bool, "link": "...", "message": "..." }`
    #[serde(alias = "json_link")]
    Json,
    /// Plain-text body starting with `http`
    #[serde(alias = "plain", alias = "plain_text")]
    Text,
}

#[derive(Debug, Deserialize)]
struct JsonUploadResponse {
    #[serde(default)]
    success: bool,
    link: Option<String>,
    message: Option<String>,
}

impl ResponseShape {
    /// Extract the link from a response body.
    pub fn parse(self, body: &str) -> std::result::Result<String, ServiceError> {
        match self {
            ResponseShape::Json => {
                let parsed: JsonUploadResponse = serde_json::from_str(body)
                    .map_err(|e| ServiceError::InvalidResponse(format!("malformed JSON: {e}")))?;
                if !parsed.success {
                    return Err(ServiceError::Rejected(
                        parsed.message.unwrap_or_else(|| "Upload failed".to_string()),
                    ));
                }
                let link = parsed
                    .link
                    .ok_or_else(|| ServiceError::InvalidResponse("missing link".to_string()))?;
                validate_link(link.trim())
            }
            ResponseShape::Text => {
                if !body.starts_with("http") {
                    return Err(ServiceError::InvalidResponse(
                        "body does not start with a link".to_string(),
                    ));
                }
                validate_link(body.trim())
            }
        }
    }
}

/// A multipart-upload host described by endpoint, field name and response shape
#[derive(Debug, Clone)]
pub struct HttpUploadService {
    name: String,
    endpoint: String,
    method: Method,
    field_name: String,
    response: ResponseShape,
}

impl HttpUploadService {
    /// Describe a POST multipart service.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        field_name: impl Into<String>,
        response: ResponseShape,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            method: Method::POST,
            field_name: field_name.into(),
            response,
        }
    }

    /// Override the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Build from a configuration entry.
    pub fn from_entry(entry: &ServiceEntry) -> Result<Self> {
        url::Url::parse(&entry.endpoint).map_err(|e| {
            Error::Config(format!(
                "Invalid endpoint '{}' for service '{}': {e}",
                entry.endpoint, entry.name
            ))
        })?;

        let method = match entry.method.as_deref() {
            None => Method::POST,
            Some(raw) => Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|e| {
                Error::Config(format!("Invalid method '{raw}' for '{}': {e}", entry.name))
            })?,
        };

        Ok(Self::new(&entry.name, &entry.endpoint, &entry.field, entry.response).with_method(method))
    }

    /// Target endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Multipart field carrying the payload
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    fn form(&self, payload: &Bytes) -> std::result::Result<Form, ServiceError> {
        let part = Part::stream_with_length(Body::from(payload.clone()), payload.len() as u64)
            .file_name(UPLOAD_FILENAME)
            .mime_str(UPLOAD_MIME)?;
        Ok(Form::new().part(self.field_name.clone(), part))
    }
}

#[async_trait]
impl UploadService for HttpUploadService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(
        &self,
        client: &Client,
        payload: &Bytes,
    ) -> std::result::Result<String, ServiceError> {
        let response = client
            .request(self.method.clone(), &self.endpoint)
            .multipart(self.form(payload)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        self.response.parse(&body)
    }
}

/// The built-in hosts in attempt order.
pub fn default_services() -> Vec<HttpUploadService> {
    vec![
        HttpUploadService::new("file.io", "https://file.io", "file", ResponseShape::Json),
        HttpUploadService::new("0x0.st", "https://0x0.st", "file", ResponseShape::Text),
        HttpUploadService::new(
            "uguu.se",
            "https://uguu.se/api.php?d=upload-tool",
            "files[]",
            ResponseShape::Text,
        ),
    ]
}
