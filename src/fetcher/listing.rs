//! Subreddit listing pages
//!
//! Fetches one page of a subreddit's "hot" listing and keeps only link posts.

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::community::CommunityName;
use crate::downloader::config::{
    DEFAULT_API_BASE, LISTING_MAX_ATTEMPTS, LISTING_PAGE_SIZE, LISTING_RETRY_DELAY,
};
use crate::fetcher::{Fetch, FetcherError, FetcherResult};
use crate::Post;

/// Listing entry kind for link posts
const KIND_LINK: &str = "t3";

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    kind: String,
    data: serde_json::Value,
}

/// One decoded listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    /// Link posts in upstream order
    pub posts: Vec<Post>,
    /// Cursor for the following page, empty when there is none
    pub after: String,
}

/// Decode a listing page, keeping only link posts
///
/// Entries of other kinds are not decoded as posts at all, so their differing
/// shapes never cause errors. A link post that does not decode, or has no id,
/// is logged and skipped; only a malformed page envelope is an error.
pub fn parse_listing(body: &[u8]) -> FetcherResult<ListingPage> {
    let response: ListingResponse = serde_json::from_slice(body)?;

    let mut posts = Vec::with_capacity(response.data.children.len());
    for child in response.data.children {
        if child.kind != KIND_LINK {
            debug!(kind = %child.kind, "skipping non-link listing entry");
            continue;
        }
        match serde_json::from_value::<Post>(child.data) {
            Ok(post) if post.id.is_empty() => {
                warn!(title = %post.title, "skipping link post without id");
            }
            Ok(post) => posts.push(post),
            Err(e) => warn!(error = %e, "skipping undecodable link post"),
        }
    }

    Ok(ListingPage {
        posts,
        after: response.data.after.unwrap_or_default(),
    })
}

/// Walks a subreddit's hot listing
pub struct ListingWalker<F> {
    fetcher: F,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<F: Fetch> ListingWalker<F> {
    /// Create a walker against the public API
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_API_BASE.to_string(),
            max_attempts: LISTING_MAX_ATTEMPTS,
            retry_delay: LISTING_RETRY_DELAY,
        }
    }

    /// Use a different API root (e.g. a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the listing URL for a community and cursor
    pub fn listing_url(&self, community: &CommunityName, after: &str) -> FetcherResult<Url> {
        let base = format!("{}/r/{}/hot.json", self.base_url, community);
        let limit = LISTING_PAGE_SIZE.to_string();

        let mut params = vec![("raw_json", "1"), ("limit", limit.as_str())];
        if !after.is_empty() {
            params.push(("after", after));
        }

        Ok(Url::parse_with_params(&base, &params)?)
    }

    /// Fetch one page of posts after `after` (empty for the first page)
    ///
    /// Fetch failures are retried with a fixed delay between attempts. Decode
    /// failures are returned immediately.
    ///
    /// # Errors
    /// Returns [`FetcherError::RetriesExceeded`] carrying the last fetch error
    /// when every attempt fails.
    pub async fn next(&self, community: &CommunityName, after: &str) -> FetcherResult<ListingPage> {
        let url = self.listing_url(community, after)?;

        let mut attempt = 0;
        let body = loop {
            attempt += 1;
            match self.fetcher.fetch(url.as_str(), None).await {
                Ok(body) => break body,
                Err(e) => {
                    warn!(
                        community = %community,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "failed to fetch listing"
                    );
                    if attempt >= self.max_attempts {
                        return Err(FetcherError::RetriesExceeded {
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        };

        let page = parse_listing(&body)?;
        debug!(
            community = %community,
            posts = page.posts.len(),
            after = %page.after,
            "listing page decoded"
        );
        Ok(page)
    }
}
