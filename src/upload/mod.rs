//! Anonymous cloud upload with ordered fallback across services
//!
//! Large payloads are offloaded to a public file host and replaced by the
//! returned link. Each host has its own multipart field name and response
//! schema; an [`UploadService`] normalizes one host into a single link. The
//! [`UploadChain`] tries services strictly in order, one attempt each, and
//! only fails once every service has failed.

mod services;

pub use services::{HttpUploadService, ResponseShape, default_services};

use crate::config::UploadOptions;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Message returned to the caller once every service has failed
pub const EXHAUSTED_MESSAGE: &str = "All cloud storage services are currently unreachable. \
Please try a smaller text or check your internet connection.";

/// File name given to the uploaded part
pub const UPLOAD_FILENAME: &str = "content.txt";

/// MIME type of the uploaded part
pub const UPLOAD_MIME: &str = "text/plain";

/// A completed upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Service that accepted the payload
    pub service_name: String,
    /// Public link to the uploaded content
    pub link: String,
}

/// Failure of a single service attempt. Never leaves the chain.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request could not be sent or the body could not be read
    #[error("transport error: {0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("returned status {0}")]
    Status(u16),

    /// Body did not contain a usable link
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Service reported an explicit failure
    #[error("upload rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Transport(e.to_string())
    }
}

/// One anonymous upload host
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Human-readable service name
    fn name(&self) -> &str;

    /// Upload `payload` once and return the public link.
    async fn attempt(
        &self,
        client: &Client,
        payload: &Bytes,
    ) -> std::result::Result<String, ServiceError>;
}

/// Ordered list of upload services sharing one HTTP client
pub struct UploadChain {
    client: Client,
    services: Vec<Box<dyn UploadService>>,
}

impl UploadChain {
    /// Build a chain from explicit services and a prepared client.
    pub fn new(client: Client, services: Vec<Box<dyn UploadService>>) -> Self {
        Self { client, services }
    }

    /// Build a chain from configuration: configured services, or the built-in hosts.
    pub fn from_options(options: &UploadOptions) -> Result<Self> {
        let client = build_client(options)?;
        let services: Vec<Box<dyn UploadService>> = match &options.services {
            Some(entries) => entries
                .iter()
                .map(|entry| {
                    HttpUploadService::from_entry(entry)
                        .map(|service| Box::new(service) as Box<dyn UploadService>)
                })
                .collect::<Result<_>>()?,
            None => default_services()
                .into_iter()
                .map(|service| Box::new(service) as Box<dyn UploadService>)
                .collect(),
        };

        Ok(Self::new(client, services))
    }

    /// Names of the configured services, in attempt order
    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    /// Upload `data`, falling back through the services in order.
    pub async fn upload(&self, data: &str) -> Result<UploadResult> {
        let payload = Bytes::copy_from_slice(data.as_bytes());
        tracing::info!(
            bytes = payload.len(),
            services = self.services.len(),
            "Starting cloud upload"
        );

        for service in &self.services {
            let name = service.name();
            tracing::info!(service = name, "Attempting upload");

            match service.attempt(&self.client, &payload).await {
                Ok(link) => {
                    tracing::info!(service = name, %link, "Upload successful");
                    return Ok(UploadResult {
                        service_name: name.to_string(),
                        link,
                    });
                }
                Err(err) => {
                    tracing::warn!(service = name, error = %err, "Upload attempt failed");
                }
            }
        }

        Err(Error::AllServicesUnreachable(EXHAUSTED_MESSAGE.to_string()))
    }
}

/// HTTP client with the configured per-request timeout.
pub fn build_client(options: &UploadOptions) -> Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout_secs.max(1)));
    if let Some(agent) = &options.user_agent {
        builder = builder.user_agent(agent.clone());
    }
    builder.build().map_err(Error::from)
}

/// Accept only absolute http(s) links.
pub(crate) fn validate_link(candidate: &str) -> std::result::Result<String, ServiceError> {
    let parsed = url::Url::parse(candidate)
        .map_err(|e| ServiceError::InvalidResponse(format!("'{candidate}' is not a URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(candidate.to_string()),
        other => Err(ServiceError::InvalidResponse(format!(
            "unsupported link scheme '{other}'"
        ))),
    }
}
