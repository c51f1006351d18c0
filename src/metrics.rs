//! Production observability metrics for the image downloader
//!
//! Tracks outbound requests, 429 responses, the server-reported rate budget
//! and per-community download outcomes.
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Optional Prometheus exporter for a scrape endpoint (`--metrics-addr`)
//! - Without an installed recorder every macro is a no-op

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::downloader::rate_limit::RateBudget;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

/// Correlation ID generator for request tracing
static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Initialize metrics system with Prometheus exporter
///
/// Call once at startup from within the tokio runtime. The function is
/// idempotent and will not reinitialize if already called.
///
/// # Arguments
/// * `addr` - Socket address to bind the Prometheus scrape endpoint
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made"
    );

    describe_counter!(
        "http_429_errors_total",
        Unit::Count,
        "Total number of 429 rate limit errors received"
    );

    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );

    describe_histogram!(
        "rate_limit_sleep_seconds",
        Unit::Seconds,
        "Time spent sleeping until the rate limit window reset"
    );

    describe_gauge!(
        "rate_budget_used",
        Unit::Count,
        "Requests used in the current rate limit window"
    );

    describe_gauge!(
        "rate_budget_remaining",
        Unit::Count,
        "Requests remaining in the current rate limit window"
    );

    describe_counter!(
        "images_downloaded_total",
        Unit::Count,
        "Total number of images written to disk"
    );

    describe_counter!(
        "images_skipped_total",
        Unit::Count,
        "Total number of images skipped because they already exist"
    );

    describe_counter!(
        "images_failed_total",
        Unit::Count,
        "Total number of images that failed to download or write"
    );

    describe_histogram!(
        "reconcile_duration_seconds",
        Unit::Seconds,
        "Duration of one community reconciliation pass"
    );

    *initialized = true;
    info!("Metrics system initialized successfully on {}", addr);
    Ok(())
}

/// Generate a new correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{:08x}", id)
}

/// Record an HTTP request with timing
pub struct HttpRequestMetrics {
    host: String,
    start_time: Instant,
    correlation_id: String,
}

impl HttpRequestMetrics {
    /// Start recording a new HTTP request
    ///
    /// Metrics are labelled by host only, full URLs would explode cardinality.
    pub fn start(url: &str) -> Self {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        let correlation_id = generate_correlation_id();

        debug!(
            correlation_id = %correlation_id,
            host = %host,
            "Starting HTTP request metrics"
        );

        Self {
            host,
            start_time: Instant::now(),
            correlation_id,
        }
    }

    /// Record completion of the HTTP request
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "host" => self.host.clone(),
            "status" => status_code.to_string(),
        )
        .increment(1);

        histogram!(
            "http_request_duration_seconds",
            "host" => self.host.clone(),
        )
        .record(duration.as_secs_f64());

        if status_code == 429 {
            counter!(
                "http_429_errors_total",
                "host" => self.host.clone(),
            )
            .increment(1);

            warn!(
                correlation_id = %self.correlation_id,
                host = %self.host,
                duration_ms = duration.as_millis(),
                "Rate limit error (429) recorded"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            host = %self.host,
            status = status_code,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    /// Record a network error (no status code)
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "host" => self.host.clone(),
            "status" => "network_error",
        )
        .increment(1);

        warn!(
            correlation_id = %self.correlation_id,
            host = %self.host,
            duration_ms = duration.as_millis(),
            "Network error recorded"
        );
    }
}

/// Publish the current rate budget as gauges
pub fn record_rate_budget(budget: &RateBudget) {
    gauge!("rate_budget_used").set(budget.used() as f64);
    gauge!("rate_budget_remaining").set(budget.remaining() as f64);
}

/// Record time spent sleeping for the rate limit window
pub fn record_rate_limit_sleep(seconds: f64) {
    histogram!("rate_limit_sleep_seconds").record(seconds);
}

/// Per-community reconciliation metrics
pub struct CommunityMetrics {
    community: String,
    start_time: Instant,
}

impl CommunityMetrics {
    /// Start tracking a reconciliation pass
    pub fn start(community: impl Into<String>) -> Self {
        Self {
            community: community.into(),
            start_time: Instant::now(),
        }
    }

    /// Record one image written to disk
    pub fn record_downloaded(&self) {
        counter!("images_downloaded_total", "community" => self.community.clone()).increment(1);
    }

    /// Record one image skipped because its stem already exists
    pub fn record_skipped(&self) {
        counter!("images_skipped_total", "community" => self.community.clone()).increment(1);
    }

    /// Record one image that failed
    pub fn record_failed(&self) {
        counter!("images_failed_total", "community" => self.community.clone()).increment(1);
    }

    /// Record the end of the pass
    pub fn record_finished(&self) {
        histogram!(
            "reconcile_duration_seconds",
            "community" => self.community.clone(),
        )
        .record(self.start_time.elapsed().as_secs_f64());
    }
}
