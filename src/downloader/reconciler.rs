//! Per-community download reconciliation
//!
//! Compares the first listing page of a community against the files already
//! in its directory and downloads whatever is missing. Single-item failures
//! are logged and skipped; only a directory that cannot be created or listed,
//! or a listing that cannot be fetched, ends the pass early.

use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::config::{DEFAULT_MEDIA_HOST, GALLERY_MARKER, IMAGE_ACCEPT};
use super::DownloadError;
use crate::community::CommunityName;
use crate::fetcher::{Fetch, GalleryResolver, ListingWalker};
use crate::metrics::CommunityMetrics;
use crate::output::{write_image, DownloadStem, ExistingSet};
use crate::{GalleryItem, Post};

/// Outcome counters of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Link posts on the listing page
    pub posts: usize,
    /// Images written to disk
    pub downloaded: usize,
    /// Images skipped because their stem already existed
    pub skipped_existing: usize,
    /// Images or galleries that failed
    pub failed: usize,
}

impl AddAssign for ReconcileReport {
    fn add_assign(&mut self, other: Self) {
        self.posts += other.posts;
        self.downloaded += other.downloaded;
        self.skipped_existing += other.skipped_existing;
        self.failed += other.failed;
    }
}

/// Downloads new images of a community into `{output_root}/{community}`
pub struct DownloadReconciler<F> {
    fetcher: F,
    walker: ListingWalker<F>,
    gallery: GalleryResolver<F>,
    media_host: String,
}

impl<F: Fetch + Clone> DownloadReconciler<F> {
    /// Create a reconciler against the public API and media host
    pub fn new(fetcher: F) -> Self {
        Self {
            walker: ListingWalker::new(fetcher.clone()),
            gallery: GalleryResolver::new(fetcher.clone()),
            fetcher,
            media_host: DEFAULT_MEDIA_HOST.to_string(),
        }
    }

    /// Use a different listing API root
    pub fn with_api_base(mut self, base_url: impl Into<String>) -> Self {
        self.walker = self.walker.with_base_url(base_url);
        self
    }

    /// Use a different host for gallery images
    pub fn with_media_host(mut self, media_host: impl Into<String>) -> Self {
        self.media_host = media_host.into().trim_end_matches('/').to_string();
        self
    }

    /// Direct image URL of a gallery item
    pub fn gallery_image_url(&self, item: &GalleryItem, subtype: &str) -> String {
        format!("{}/{}.{}", self.media_host, item.media_id, subtype)
    }

    /// Reconcile one community
    ///
    /// Never fails: every problem is logged and reflected in the report.
    pub async fn reconcile(&self, community: &CommunityName, output_root: &Path) -> ReconcileReport {
        let span = info_span!("reconcile", community = %community);
        self.reconcile_inner(community, output_root)
            .instrument(span)
            .await
    }

    async fn reconcile_inner(&self, community: &CommunityName, output_root: &Path) -> ReconcileReport {
        let metrics = CommunityMetrics::start(community.as_str());
        let mut report = ReconcileReport::default();

        let dir = output_root.join(community.as_str());
        if let Err(e) = ExistingSet::ensure_dir(&dir) {
            error!(error = %e, "couldn't create output directory");
            return report;
        }

        let mut existing = match ExistingSet::load(&dir) {
            Ok(existing) => existing,
            Err(e) => {
                error!(error = %e, "couldn't read output directory");
                return report;
            }
        };

        // Only the first page is fetched per pass
        let page = match self.walker.next(community, "").await {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, "couldn't fetch listing");
                return report;
            }
        };
        if !page.after.is_empty() {
            debug!(after = %page.after, "further listing pages not fetched");
        }

        report.posts = page.posts.len();
        for post in &page.posts {
            self.process_post(post, &dir, &mut existing, &mut report, &metrics)
                .await;
        }

        metrics.record_finished();
        info!(
            posts = report.posts,
            downloaded = report.downloaded,
            skipped = report.skipped_existing,
            failed = report.failed,
            "community reconciled"
        );
        report
    }

    async fn process_post(
        &self,
        post: &Post,
        dir: &Path,
        existing: &mut ExistingSet,
        report: &mut ReconcileReport,
        metrics: &CommunityMetrics,
    ) {
        info!(title = %post.title, id = %post.id, "post");

        if post.overridden_url.is_empty() {
            debug!(id = %post.id, "post has no link target, nothing to download");
            return;
        }

        if !post.overridden_url.contains(GALLERY_MARKER) {
            let stem = DownloadStem::for_post(post);
            self.download_if_new(&post.overridden_url, stem, dir, existing, report, metrics)
                .await;
            return;
        }

        let items = match self.gallery.resolve_gallery(&post.overridden_url).await {
            Ok(items) => items,
            Err(e) => {
                warn!(id = %post.id, url = %post.overridden_url, error = %e, "gallery handling error");
                report.failed += 1;
                metrics.record_failed();
                return;
            }
        };
        debug!(id = %post.id, items = ?items, "gallery items");

        for item in &items {
            let Some(subtype) = item.subtype() else {
                warn!(
                    media_id = %item.media_id,
                    mime_type = %item.mime_type,
                    "skipping gallery item with malformed mime type"
                );
                continue;
            };

            let url = self.gallery_image_url(item, subtype);
            let stem = DownloadStem::for_gallery_item(post, item);
            self.download_if_new(&url, stem, dir, existing, report, metrics)
                .await;
        }
    }

    async fn download_if_new(
        &self,
        url: &str,
        stem: DownloadStem,
        dir: &Path,
        existing: &mut ExistingSet,
        report: &mut ReconcileReport,
        metrics: &CommunityMetrics,
    ) {
        if existing.contains(&stem) {
            info!(stem = %stem, "already downloaded");
            report.skipped_existing += 1;
            metrics.record_skipped();
            return;
        }

        match self.download(url, &stem, dir).await {
            Ok(_) => {
                existing.insert(stem);
                report.downloaded += 1;
                metrics.record_downloaded();
            }
            Err(e) => {
                warn!(stem = %stem, url = url, error = %e, "download failed");
                report.failed += 1;
                metrics.record_failed();
            }
        }
    }

    /// Fetch an image and store it under its stem with a sniffed extension
    async fn download(&self, url: &str, stem: &DownloadStem, dir: &Path) -> Result<PathBuf, DownloadError> {
        let bytes = self.fetcher.fetch(url, Some(IMAGE_ACCEPT)).await?;
        Ok(write_image(dir, stem, &bytes).await?)
    }
}
