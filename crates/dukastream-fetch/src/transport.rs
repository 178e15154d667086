//! The network seam of the fetch client.
//!
//! [`FetchClient`](crate::FetchClient) only sees status codes and bodies;
//! [`HttpTransport`] supplies them over HTTP, tests supply them from memory.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::path::{BASE_URL, url_for};

/// A raw response from the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, still compressed.
    pub body: Bytes,
}

impl RawResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `404 Not Found` with no body.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            status: 404,
            body: Bytes::new(),
        }
    }
}

/// Network-level failures, before any status code is known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other request failure.
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Performs a single GET of an archive path.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Requests the archive file at `path` (relative to the archive root).
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError>;
}

/// Configuration of the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Archive root URL.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Idle pooled connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 16,
            user_agent: format!("dukastream/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP transport with connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// Returns the archive root URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError> {
        let url = url_for(&self.base_url, path);
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url, BASE_URL);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("dukastream/"));
    }

    #[tokio::test]
    async fn test_transport_creation() {
        let transport = HttpTransport::new(HttpConfig::default()).unwrap();
        assert_eq!(transport.base_url(), BASE_URL);
    }

    #[test]
    fn test_not_found_response() {
        let response = RawResponse::not_found();
        assert_eq!(response.status, 404);
        assert!(response.body.is_empty());
    }
}
