//! Download orchestration and rate limiting
//!
//! # Overview
//!
//! 1. **Rate Limiting**: [`rate_limit::RateBudget`] tracks the server-reported
//!    request budget used by [`crate::fetcher::RateLimitedFetcher`]
//! 2. **Reconciliation**: [`reconciler::DownloadReconciler`] downloads the
//!    images of one community that are not on disk yet
//! 3. **Scheduling**: [`scheduler::Scheduler`] sweeps all communities, then
//!    sleeps until the next run
//!
//! # Quick Start
//!
//! ```no_run
//! use reddit_images::community::CommunityName;
//! use reddit_images::downloader::{DownloadReconciler, Scheduler};
//! use reddit_images::fetcher::RateLimitedFetcher;
//! use reddit_images::shutdown::ShutdownCoordinator;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = RateLimitedFetcher::new();
//! let scheduler = Scheduler::new(
//!     DownloadReconciler::new(&fetcher),
//!     vec![CommunityName::parse("pics")?],
//!     "subreddits".into(),
//!     Duration::from_secs(1800),
//!     ShutdownCoordinator::shared(),
//! );
//! scheduler.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - Listing fetches are retried by [`crate::fetcher::ListingWalker`]
//! - Image and gallery failures are logged and skipped
//! - Directory failures end the pass for that community only

pub mod config;
pub mod rate_limit;
pub mod reconciler;
pub mod scheduler;

pub use rate_limit::RateBudget;
pub use reconciler::{DownloadReconciler, ReconcileReport};
pub use scheduler::Scheduler;

use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// Error downloading a single image
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Fetching the image failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetcherError),

    /// Storing the image failed
    #[error("output failed: {0}")]
    Output(#[from] OutputError),
}
