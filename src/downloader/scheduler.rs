//! Polling loop over all configured communities

use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use super::reconciler::{DownloadReconciler, ReconcileReport};
use crate::community::CommunityName;
use crate::fetcher::Fetch;
use crate::shutdown::SharedShutdown;

/// Runs a sweep over every community, then sleeps for `every`
pub struct Scheduler<F> {
    reconciler: DownloadReconciler<F>,
    communities: Vec<CommunityName>,
    output_root: PathBuf,
    every: Duration,
    shutdown: SharedShutdown,
}

impl<F: Fetch + Clone> Scheduler<F> {
    /// Create a scheduler
    pub fn new(
        reconciler: DownloadReconciler<F>,
        communities: Vec<CommunityName>,
        output_root: PathBuf,
        every: Duration,
        shutdown: SharedShutdown,
    ) -> Self {
        Self {
            reconciler,
            communities,
            output_root,
            every,
            shutdown,
        }
    }

    /// Reconcile every community once, in order
    ///
    /// Stops early, between communities, when shutdown is requested.
    pub async fn run_sweep(&self) -> ReconcileReport {
        let mut total = ReconcileReport::default();
        for community in &self.communities {
            if self.shutdown.is_shutdown_requested() {
                info!("shutdown requested, ending sweep early");
                break;
            }
            total += self.reconciler.reconcile(community, &self.output_root).await;
        }

        info!(
            communities = self.communities.len(),
            downloaded = total.downloaded,
            skipped = total.skipped_existing,
            failed = total.failed,
            "sweep finished"
        );
        total
    }

    /// Sweep forever until shutdown is requested
    ///
    /// The next sweep starts `every` after the previous one finished.
    pub async fn run(&self) {
        loop {
            self.run_sweep().await;
            if self.shutdown.is_shutdown_requested() {
                break;
            }

            let Some(deadline) = Instant::now().checked_add(self.every) else {
                warn!(
                    every_secs = self.every.as_secs(),
                    "interval too large to schedule, waiting for shutdown"
                );
                self.shutdown.wait_for_shutdown().await;
                break;
            };
            let wall_clock = chrono::Duration::from_std(self.every)
                .ok()
                .and_then(|every| Utc::now().checked_add_signed(every));
            match wall_clock {
                Some(until) => info!(until = %until, "sleep until next sweep"),
                None => info!(every_secs = self.every.as_secs(), "sleep until next sweep"),
            }

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = self.shutdown.wait_for_shutdown() => {
                    info!("shutdown requested while sleeping");
                    break;
                }
            }
        }
    }
}
