//! HTTP client shared by the discovery stages and the page renderers
//!
//! Wraps `reqwest` with the crate's user agent and timeout, and maps
//! non-success statuses into [`FetchError`] so callers never have to inspect
//! a response by hand.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::error::Result;

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error returned by a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body decoding failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned {status_code}: {message}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body, if any
        message: String,
    },

    /// The response body was not the expected JSON shape
    #[error("unexpected response from {url}: {message}")]
    UnexpectedResponse {
        /// Requested URL
        url: String,
        /// Decoder message
        message: String,
    },
}

/// HTTP client for plain-text and JSON GET requests
#[derive(Debug, Clone)]
pub struct SiteClient {
    client: ReqwestClient,
}

impl SiteClient {
    /// Create a client with the given user agent and timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Create a client with the crate's default user agent and timeout
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            &format!("catalog-digest/{}", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// GET a URL and return its body as text
    #[instrument(skip(self), level = "debug")]
    pub async fn get_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        debug!("Sending GET request to {}", url);
        self.execute_request(url, self.client.get(url)).await
    }

    /// GET a URL with query parameters and decode the body as JSON
    #[instrument(skip(self, query), level = "debug")]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, FetchError> {
        debug!("Sending GET request to {}", url);
        let body = self
            .execute_request(url, self.client.get(url).query(query))
            .await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse response: {}", e);
            FetchError::UnexpectedResponse {
                url: url.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Execute a request and return the body of a successful response
    async fn execute_request(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> std::result::Result<String, FetchError> {
        let response = request.send().await?;

        let status = response.status();
        let response_text = response.text().await?;

        if status.is_success() {
            Ok(response_text)
        } else {
            error!("GET {} failed: {}", url, status);
            Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
                message: response_text,
            })
        }
    }
}
