//! Single-file fetching with retries, decompression and caching.

use async_trait::async_trait;
use bytes::Bytes;
use dukastream_types::{CachePolicy, FetchUnit, PriceSide, RetryPolicy, StreamOptions};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

use crate::cache::DiskCache;
use crate::decompress::{DecompressError, decompress_bi5_blocking};
use crate::path::unit_path;
use crate::stream::ArchiveSource;
use crate::transport::{HttpConfig, HttpTransport, RawResponse, Transport, TransportError};

/// Errors that can occur while fetching one archive file.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server kept answering with a non-success status.
    #[error("HTTP error: status {status}")]
    Http {
        /// Last status code received.
        status: u16,
    },

    /// Network-level failure on the last attempt.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The payload could not be decompressed. Never retried.
    #[error(transparent)]
    Decompress(#[from] DecompressError),

    /// The cache could not be read or written.
    #[error("Cache error at {}: {source}", path.display())]
    Cache {
        /// The cache file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<FetchError> for dukastream_types::Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http { status } => Self::Http { status },
            FetchError::Transport(e) => Self::Transport(e.to_string()),
            FetchError::Decompress(e) => Self::Decompress(e.to_string()),
            e @ FetchError::Cache { .. } => Self::Cache(e.to_string()),
        }
    }
}

/// Why the last attempt did not succeed.
enum Failure {
    Status(u16),
    Transport(TransportError),
}

/// Fetches archive files through a [`Transport`].
///
/// Each fetch consults the cache first, then performs up to
/// `max_retries + 1` attempts, decompresses the body and writes non-empty
/// payloads back to the cache.
pub struct FetchClient<T = HttpTransport> {
    transport: Arc<T>,
    retry: RetryPolicy,
    cache: Option<DiskCache>,
}

impl<T> Clone for FetchClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            retry: self.retry.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<T> std::fmt::Debug for FetchClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl FetchClient<HttpTransport> {
    /// Creates an HTTP-backed client using the retry and cache policies of
    /// `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn http(config: HttpConfig, options: &StreamOptions) -> Result<Self, reqwest::Error> {
        Ok(Self::from_options(HttpTransport::new(config)?, options))
    }
}

impl<T: Transport> FetchClient<T> {
    /// Creates a client over `transport`.
    #[must_use]
    pub fn new(transport: T, retry: RetryPolicy, cache: &CachePolicy) -> Self {
        Self {
            transport: Arc::new(transport),
            retry,
            cache: cache.enabled.then(|| DiskCache::new(&cache.folder)),
        }
    }

    /// Creates a client over `transport` using the policies of `options`.
    #[must_use]
    pub fn from_options(transport: T, options: &StreamOptions) -> Self {
        Self::new(transport, options.retry().clone(), options.cache())
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the cache, if enabled.
    #[must_use]
    pub const fn cache(&self) -> Option<&DiskCache> {
        self.cache.as_ref()
    }

    /// Fetches and decompresses the archive file at `path`.
    ///
    /// A `404` and, unless the retry policy fails on exhaustion, a file that
    /// never succeeded, both yield an empty payload.
    ///
    /// # Errors
    ///
    /// Returns an error when retries are exhausted and the policy says to
    /// fail, when the payload is not valid LZMA, or when the cache cannot be
    /// accessed.
    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        if let Some(cache) = &self.cache {
            let cached = cache.read(path).await.map_err(|source| FetchError::Cache {
                path: cache.file_for(path),
                source,
            })?;
            if let Some(payload) = cached {
                trace!(path, bytes = payload.len(), "cache hit");
                return Ok(payload);
            }
        }

        let Some(body) = self.download(path).await? else {
            return Ok(Vec::new());
        };

        let payload = decompress_bi5_blocking(body).await?;

        if let Some(cache) = &self.cache
            && !payload.is_empty()
        {
            cache
                .write(path, &payload)
                .await
                .map_err(|source| FetchError::Cache {
                    path: cache.file_for(path),
                    source,
                })?;
        }

        Ok(payload)
    }

    /// Runs the retry loop. `None` means "no data" (404, or exhaustion
    /// without failing).
    async fn download(&self, path: &str) -> Result<Option<Bytes>, FetchError> {
        let attempts = self.retry.max_retries.saturating_add(1);
        let mut last = Failure::Status(0);

        for attempt in 0..attempts {
            match self.transport.get(path).await {
                Ok(RawResponse { status: 404, .. }) => {
                    debug!(path, "not found");
                    return Ok(None);
                }
                Ok(RawResponse { status: 200, body })
                    if !body.is_empty() || !self.retry.retry_on_empty =>
                {
                    return Ok(Some(body));
                }
                Ok(RawResponse { status, .. }) => last = Failure::Status(status),
                Err(e) => last = Failure::Transport(e),
            }

            if attempt + 1 < attempts {
                let delay = self.retry.delay.delay_for_attempt(attempt);
                debug!(
                    attempt = attempt + 1,
                    max = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request to {}",
                    path
                );
                tokio::time::sleep(delay).await;
            }
        }

        if !self.retry.fail_after_retries {
            debug!(path, attempts, "giving up, yielding no data");
            return Ok(None);
        }
        Err(match last {
            Failure::Status(status) => FetchError::Http { status },
            Failure::Transport(e) => FetchError::Transport(e),
        })
    }
}

#[async_trait]
impl<T: Transport + 'static> ArchiveSource for FetchClient<T> {
    async fn fetch_unit(&self, unit: &FetchUnit, side: PriceSide) -> Result<Vec<u8>, FetchError> {
        self.fetch(&unit_path(unit, side)).await
    }
}
