//! HTTP fetchers and response decoding
//!
//! All network access goes through the [`Fetch`] trait. The production
//! implementation is [`http::RateLimitedFetcher`], which carries the shared
//! rate budget; [`listing::ListingWalker`] and [`gallery::GalleryResolver`]
//! decode Reddit's JSON on top of it.

use async_trait::async_trait;
use bytes::Bytes;

pub mod gallery;
pub mod http;
pub mod listing;
pub mod shared_resources;

pub use gallery::GalleryResolver;
pub use http::RateLimitedFetcher;
pub use listing::ListingWalker;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Transport failure (connection, DNS, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered 429 Too Many Requests
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Non-success status other than 429
    #[error("request failed with status: {0}")]
    HttpStatus(u16),

    /// Malformed JSON
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Well-formed JSON with an unexpected structure
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Every attempt of a retried request failed
    #[error("retries exceeded after {attempts} attempts")]
    RetriesExceeded {
        /// Number of attempts made
        attempts: u32,
        /// Error of the last attempt
        #[source]
        source: Box<FetcherError>,
    },
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Issues GET requests and returns the response body
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url`, optionally sending an `Accept` header
    ///
    /// # Errors
    /// Returns [`FetcherError::RateLimitExceeded`] on 429,
    /// [`FetcherError::HttpStatus`] on other non-success statuses and
    /// [`FetcherError::Network`] on transport failures.
    async fn fetch(&self, url: &str, accept: Option<&str>) -> FetcherResult<Bytes>;
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for &F {
    async fn fetch(&self, url: &str, accept: Option<&str>) -> FetcherResult<Bytes> {
        (**self).fetch(url, accept).await
    }
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for std::sync::Arc<F> {
    async fn fetch(&self, url: &str, accept: Option<&str>) -> FetcherResult<Bytes> {
        (**self).fetch(url, accept).await
    }
}
