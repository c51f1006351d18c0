//! Rate-limited HTTP client
//!
//! Every request in the process goes through one [`RateLimitedFetcher`]. It
//! holds the [`RateBudget`] behind an async mutex, sleeps when the budget is
//! exhausted and folds the server's rate limit headers back into it after
//! each response.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{HeaderMap, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::downloader::config::{
    self, HEADER_RATELIMIT_REMAINING, HEADER_RATELIMIT_RESET, HEADER_RATELIMIT_USED,
};
use crate::downloader::rate_limit::RateBudget;
use crate::fetcher::shared_resources::global_http_client;
use crate::fetcher::{Fetch, FetcherError, FetcherResult};
use crate::metrics::{self, HttpRequestMetrics};

/// HTTP GET client that honours the server's rate limit headers
#[derive(Clone)]
pub struct RateLimitedFetcher {
    client: Arc<Client>,
    budget: Arc<Mutex<RateBudget>>,
}

impl RateLimitedFetcher {
    /// Create a fetcher on the process-wide HTTP client
    pub fn new() -> Self {
        Self::with_client(global_http_client())
    }

    /// Create a fetcher on a specific HTTP client
    pub fn with_client(client: Arc<Client>) -> Self {
        Self::with_budget(client, RateBudget::new(Utc::now()))
    }

    /// Create a fetcher starting from a given budget
    pub fn with_budget(client: Arc<Client>, budget: RateBudget) -> Self {
        Self {
            client,
            budget: Arc::new(Mutex::new(budget)),
        }
    }

    /// Snapshot of the current rate budget
    pub async fn budget(&self) -> RateBudget {
        self.budget.lock().await.clone()
    }

    /// Sleep until reset if no requests remain
    ///
    /// The lock is held for the whole sleep so concurrent callers queue up
    /// behind it instead of racing on `remaining`.
    async fn wait_for_budget(&self) {
        let budget = self.budget.lock().await;
        if let Some(wait) = budget.wait_duration(Utc::now()) {
            info!(
                reset_at = %budget.reset_at(),
                wait_secs = wait.as_secs(),
                "no requests remaining, sleeping until reset"
            );
            tokio::time::sleep(wait).await;
            metrics::record_rate_limit_sleep(wait.as_secs_f64());
        }
    }
}

impl Default for RateLimitedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold the rate limit headers of a response into the budget
pub fn apply_rate_headers(budget: &mut RateBudget, headers: &HeaderMap) {
    let now = Utc::now();
    budget.update_used(header_str(headers, HEADER_RATELIMIT_USED));
    budget.update_remaining(header_str(headers, HEADER_RATELIMIT_REMAINING));
    budget.update_reset(header_str(headers, HEADER_RATELIMIT_RESET), now);
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(header = name, error = %e, "rate limit header is not valid text");
            None
        }
    }
}

#[async_trait]
impl Fetch for RateLimitedFetcher {
    async fn fetch(&self, url: &str, accept: Option<&str>) -> FetcherResult<Bytes> {
        self.wait_for_budget().await;

        info!(url = url, "GET");
        let request_metrics = HttpRequestMetrics::start(url);

        let mut request = self.client.get(url).header(USER_AGENT, config::USER_AGENT);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                request_metrics.record_network_error();
                return Err(FetcherError::Network(e));
            }
        };

        let status = response.status();
        request_metrics.record_complete(status.as_u16());

        {
            let mut budget = self.budget.lock().await;
            apply_rate_headers(&mut budget, response.headers());

            if status == StatusCode::TOO_MANY_REQUESTS {
                budget.throttle(Utc::now());
                metrics::record_rate_budget(&budget);
                return Err(FetcherError::RateLimitExceeded);
            }

            metrics::record_rate_budget(&budget);
        }

        if !status.is_success() {
            return Err(FetcherError::HttpStatus(status.as_u16()));
        }

        Ok(response.bytes().await?)
    }
}
