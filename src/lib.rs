//! # Reddit Images Library
//!
//! Periodically polls subreddit listings, discovers image posts (including
//! multi-image galleries) and saves images that have not been downloaded yet.
//!
//! ## Features
//!
//! - **Rate Limiting**: A single shared budget driven by the server's
//!   `x-ratelimit-*` headers, sleeping until reset when exhausted
//! - **Incremental Downloads**: The output directory is the ledger; files
//!   already on disk are never fetched again
//! - **Gallery Support**: Multi-image gallery posts are expanded per image
//! - **Content Sniffing**: File extensions come from the downloaded bytes,
//!   not from upstream metadata
//!
//! ## Quick Start
//!
//! ```no_run
//! use reddit_images::community::CommunityName;
//! use reddit_images::downloader::DownloadReconciler;
//! use reddit_images::fetcher::http::RateLimitedFetcher;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = RateLimitedFetcher::new();
//! let reconciler = DownloadReconciler::new(&fetcher);
//!
//! let community = CommunityName::parse("EarthPorn")?;
//! let report = reconciler.reconcile(&community, Path::new("subreddits")).await;
//! println!("downloaded {} new images", report.downloaded);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`community`] - Community name validation
//! - [`fetcher`] - Rate-limited HTTP access, listing and gallery decoding
//! - [`downloader`] - Reconciliation against the filesystem and the polling loop
//! - [`output`] - Filename stems, sanitization and the on-disk ledger
//! - [`cli`] - Command line arguments and startup validation

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI argument parsing
pub mod cli;

/// Community name validation
pub mod community;

/// Download reconciliation and scheduling
pub mod downloader;

/// HTTP fetchers and response decoding
pub mod fetcher;

/// Prometheus metrics helpers
pub mod metrics;

/// File naming and the on-disk ledger
pub mod output;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

pub use community::CommunityName;

/// A link post taken from a subreddit listing
///
/// Immutable once decoded from a listing page.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Post {
    /// Post title as shown on the site
    #[serde(default)]
    pub title: String,
    /// Username of the submitter
    #[serde(default)]
    pub author: String,
    /// Link target of the post
    #[serde(rename = "url", default)]
    pub external_url: String,
    /// Destination URL after Reddit's own rewriting (direct image or gallery)
    #[serde(rename = "url_overridden_by_dest", default)]
    pub overridden_url: String,
    /// Creation time (Unix timestamp in seconds)
    #[serde(rename = "created", default)]
    pub created_at: f64,
    /// Base-36 post id
    pub id: String,
}

impl Post {
    /// Creation time truncated to whole seconds, as used in filename stems
    pub fn created_epoch_secs(&self) -> i64 {
        self.created_at as i64
    }
}

/// One image of a gallery post
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct GalleryItem {
    /// Media id, also the basename of the image on the media host
    #[serde(rename = "id", default)]
    pub media_id: String,
    /// MIME type reported by upstream ("type/subtype"), not always reliable
    #[serde(rename = "m", default)]
    pub mime_type: String,
}

impl GalleryItem {
    /// Subtype of a well-formed "type/subtype" MIME string
    ///
    /// Returns `None` unless the MIME type splits into exactly two parts.
    pub fn subtype(&self) -> Option<&str> {
        let mut parts = self.mime_type.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(subtype), None) => Some(subtype),
            _ => None,
        }
    }
}
