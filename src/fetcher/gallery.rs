//! Gallery post metadata
//!
//! A gallery post's JSON is an array of listings: the post itself first,
//! then its comments. The post's `media_metadata` maps media ids to image
//! metadata.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::fetcher::{Fetch, FetcherError, FetcherResult};
use crate::GalleryItem;

#[derive(Debug, Deserialize)]
struct GalleryListing {
    data: GalleryListingData,
}

#[derive(Debug, Deserialize)]
struct GalleryListingData {
    #[serde(default)]
    children: Vec<GalleryChild>,
}

#[derive(Debug, Deserialize)]
struct GalleryChild {
    data: GalleryChildData,
}

#[derive(Debug, Deserialize)]
struct GalleryChildData {
    #[serde(default)]
    media_metadata: Option<HashMap<String, GalleryItem>>,
}

/// JSON endpoint for a gallery URL
pub fn gallery_json_url(gallery_url: &str) -> String {
    format!("{}.json?raw_json=1", gallery_url.trim_end_matches('/'))
}

/// Decode the gallery items from a gallery post's JSON
///
/// Items are sorted by media id; upstream map order carries no meaning.
pub fn parse_gallery(body: &[u8]) -> FetcherResult<Vec<GalleryItem>> {
    let listings: Vec<GalleryListing> = serde_json::from_slice(body)?;

    let post = listings
        .into_iter()
        .next()
        .ok_or_else(|| FetcherError::UnexpectedShape("gallery response has no listings".to_string()))?
        .data
        .children
        .into_iter()
        .next()
        .ok_or_else(|| FetcherError::UnexpectedShape("gallery listing has no children".to_string()))?;

    let mut items: Vec<GalleryItem> = post
        .data
        .media_metadata
        .unwrap_or_default()
        .into_iter()
        .map(|(key, mut item)| {
            if item.media_id.is_empty() {
                item.media_id = key;
            }
            item
        })
        .collect();
    items.sort_by(|a, b| a.media_id.cmp(&b.media_id));
    Ok(items)
}

/// Resolves gallery posts into their images
pub struct GalleryResolver<F> {
    fetcher: F,
}

impl<F: Fetch> GalleryResolver<F> {
    /// Create a resolver
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Fetch and decode the images of a gallery post
    ///
    /// Fetch and decode errors are returned as-is; nothing is retried.
    pub async fn resolve_gallery(&self, gallery_url: &str) -> FetcherResult<Vec<GalleryItem>> {
        let json_url = gallery_json_url(gallery_url);
        debug!(gallery_url = gallery_url, json_url = %json_url, "resolving gallery");

        let body = self.fetcher.fetch(&json_url, None).await?;
        let items = parse_gallery(&body)?;

        debug!(gallery_url = gallery_url, items = items.len(), "gallery resolved");
        Ok(items)
    }
}
