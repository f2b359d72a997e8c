//! HTTP transport seam
//!
//! The recorder only ever needs two request shapes: one GET for the stream
//! page and one POST per poll cycle. They sit behind a trait so the poller
//! and recorder can be exercised against a scripted transport in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{StreamlogError, StreamlogResult};

/// Endpoint the poll POST is issued against, parameterized by API key
pub const LIVE_CHAT_ENDPOINT: &str =
    "https://www.youtube.com/youtubei/v1/live_chat/get_live_chat";

/// Blocking-request primitive the recorder is built on.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Fetch a stream page; the body is opaque text for the bootstrap.
    async fn fetch_page(&self, url: &str) -> StreamlogResult<String>;

    /// Issue one poll request and return the structured response.
    async fn poll_chat(&self, api_key: &str, body: &Value) -> StreamlogResult<Value>;
}

/// Production transport backed by a shared reqwest client.
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn fetch_page(&self, url: &str) -> StreamlogResult<String> {
        debug!("Fetching stream page: {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| StreamlogError::transport(format!("page request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StreamlogError::transport(format!(
                "page request returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| StreamlogError::transport(format!("failed to read page body: {e}")))
    }

    async fn poll_chat(&self, api_key: &str, body: &Value) -> StreamlogResult<Value> {
        let url = format!("{LIVE_CHAT_ENDPOINT}?key={api_key}");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| StreamlogError::transport(format!("poll request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StreamlogError::transport(format!(
                "poll request returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StreamlogError::transport(format!("failed to parse poll response: {e}")))
    }
}
