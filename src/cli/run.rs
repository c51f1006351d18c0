//! Command line arguments and the run command

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::CliError;
use crate::community::CommunityName;
use crate::downloader::config::{DEFAULT_EVERY_SECS, DEFAULT_OUT_DIR, MAX_EVERY_SECS};
use crate::downloader::{DownloadReconciler, Scheduler};
use crate::fetcher::RateLimitedFetcher;
use crate::shutdown::SharedShutdown;

/// Reddit image downloader CLI
#[derive(Parser, Debug)]
#[command(name = "reddit-images")]
#[command(about = "Periodically download new images from subreddits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subreddits to watch (e.g. pics or r/EarthPorn)
    #[arg(required = true, value_name = "COMMUNITY")]
    pub communities: Vec<String>,

    /// Run every N seconds (at most one year)
    #[arg(long, default_value_t = DEFAULT_EVERY_SECS, value_parser = clap::value_parser!(u64).range(1..=MAX_EVERY_SECS))]
    pub every: u64,

    /// Output directory; each subreddit gets its own subdirectory
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Run a single sweep and exit
    #[arg(long, default_value_t = false)]
    pub once: bool,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

/// Validated run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Communities in sweep order, without duplicates
    pub communities: Vec<CommunityName>,
    /// Output root
    pub out_dir: PathBuf,
    /// Pause between sweeps
    pub every: Duration,
    /// Stop after one sweep
    pub once: bool,
    /// Prometheus listener address
    pub metrics_addr: Option<SocketAddr>,
}

impl RunConfig {
    /// Validate parsed arguments
    ///
    /// # Errors
    /// Returns [`CliError::InvalidCommunity`] for the first malformed name and
    /// [`CliError::InvalidArgument`] for an interval outside `1..=MAX_EVERY_SECS`.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if !(1..=MAX_EVERY_SECS).contains(&cli.every) {
            return Err(CliError::InvalidArgument(format!(
                "--every must be between 1 and {MAX_EVERY_SECS} seconds, got {}",
                cli.every
            )));
        }

        let mut communities: Vec<CommunityName> = Vec::with_capacity(cli.communities.len());
        for raw in &cli.communities {
            let name = CommunityName::parse(raw).map_err(|source| CliError::InvalidCommunity {
                input: raw.clone(),
                source,
            })?;
            if communities.contains(&name) {
                warn!(community = %name, "community listed more than once, ignoring duplicate");
                continue;
            }
            communities.push(name);
        }

        if communities.is_empty() {
            return Err(CliError::InvalidArgument(
                "at least one community is required".to_string(),
            ));
        }

        Ok(Self {
            communities,
            out_dir: cli.out_dir.clone(),
            every: Duration::from_secs(cli.every),
            once: cli.once,
            metrics_addr: cli.metrics_addr,
        })
    }
}

impl Cli {
    /// Run the downloader until shutdown (or after one sweep with `--once`)
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = RunConfig::from_cli(self)?;

        if let Some(addr) = config.metrics_addr {
            crate::metrics::init_metrics(addr)
                .await
                .map_err(|e| CliError::ConfigurationError(e.to_string()))?;
        }

        let names: Vec<&str> = config.communities.iter().map(CommunityName::as_str).collect();
        info!(
            communities = ?names,
            out_dir = %config.out_dir.display(),
            every_secs = config.every.as_secs(),
            "starting"
        );

        let fetcher = RateLimitedFetcher::new();
        let scheduler = Scheduler::new(
            DownloadReconciler::new(&fetcher),
            config.communities,
            config.out_dir,
            config.every,
            shutdown,
        );

        if config.once {
            scheduler.run_sweep().await;
        } else {
            scheduler.run().await;
        }
        Ok(())
    }
}
