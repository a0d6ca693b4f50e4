//! Upstream content sources.
//!
//! The refresh loop only knows the [`ContentSource`] trait. Production uses
//! [`HttpContentSource`], which pulls the whole content directory from the
//! content service in one request.

use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use crate::error::FetchError;
use crate::types::ContentDirectory;

/// Endpoint (relative to the base endpoint) serving the full content directory.
pub const ALL_CONTENT_ENDPOINT: &str = "content";

/// Something that can produce a complete content directory.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self) -> Result<ContentDirectory, FetchError>;
}

/// Fetches the content directory from the content service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: reqwest::Client,
    url: String,
}

impl HttpContentSource {
    /// Build a source for `base_endpoint` with a per-request `timeout`.
    pub fn new(base_endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: endpoint_url(base_endpoint, ALL_CONTENT_ENDPOINT),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self) -> Result<ContentDirectory, FetchError> {
        debug!("Fetching content directory from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }

        let body = response.bytes().await?;
        let directory: ContentDirectory = serde_json::from_slice(&body)?;

        debug!(
            "Fetched content directory: {} rules, {} bytes",
            directory.rules.len(),
            body.len()
        );
        Ok(directory)
    }
}

/// Join a base endpoint and a relative endpoint with exactly one slash.
pub fn endpoint_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
