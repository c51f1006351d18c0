//! Server-driven rate limit accounting
//!
//! Reddit reports its request budget on every response through the
//! `x-ratelimit-*` headers. [`RateBudget`] folds those values into a single
//! state that decides whether the next request has to wait.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::{INITIAL_REMAINING, THROTTLE_FALLBACK_SECS};

/// Rate limit state reported by the server
///
/// Invariants:
/// - `remaining` is never negative after an update
/// - `reset_at` never moves backwards
#[derive(Debug, Clone, PartialEq)]
pub struct RateBudget {
    used: i64,
    remaining: i64,
    reset_at: DateTime<Utc>,
}

impl RateBudget {
    /// Budget assumed before any response has been seen
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            used: 0,
            remaining: INITIAL_REMAINING,
            reset_at: now,
        }
    }

    /// Requests used in the current window
    pub fn used(&self) -> i64 {
        self.used
    }

    /// Requests left in the current window
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Time at which the window resets
    pub fn reset_at(&self) -> DateTime<Utc> {
        self.reset_at
    }

    /// Whether requests must wait for the window to reset
    pub fn is_exhausted(&self) -> bool {
        self.remaining <= 0
    }

    /// How long the next request has to wait, if at all
    ///
    /// Returns `None` while budget remains or once `reset_at` has passed.
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_exhausted() {
            return None;
        }
        (self.reset_at - now).to_std().ok().filter(|d| !d.is_zero())
    }

    /// Apply the `x-ratelimit-used` header value
    pub fn update_used(&mut self, raw: Option<&str>) {
        if let Some(used) = raw.and_then(|raw| parse_header_value("used", raw)) {
            self.used = used;
            debug!(used = self.used, "rate budget used updated");
        }
    }

    /// Apply the `x-ratelimit-remaining` header value
    ///
    /// Negative values are clamped to zero.
    pub fn update_remaining(&mut self, raw: Option<&str>) {
        if let Some(remaining) = raw.and_then(|raw| parse_header_value("remaining", raw)) {
            self.remaining = remaining.max(0);
            debug!(remaining = self.remaining, "rate budget remaining updated");
        }
    }

    /// Apply the `x-ratelimit-reset` header value (seconds from `now`)
    ///
    /// Values too large to represent as a timestamp are ignored.
    pub fn update_reset(&mut self, raw: Option<&str>, now: DateTime<Utc>) {
        let Some(secs) = raw.and_then(|raw| parse_header_value("reset", raw)) else {
            return;
        };
        match offset_by_secs(now, secs) {
            Some(candidate) => {
                self.advance_reset(candidate);
            }
            None => warn!(secs = secs, "ignoring out of range rate limit reset"),
        }
    }

    /// Move `reset_at` to `candidate` if it is strictly later
    ///
    /// Returns whether the reset time changed.
    pub fn advance_reset(&mut self, candidate: DateTime<Utc>) -> bool {
        if candidate > self.reset_at {
            self.reset_at = candidate;
            info!(reset_at = %self.reset_at, "rate budget reset advanced");
            true
        } else {
            false
        }
    }

    /// Record a 429 response
    ///
    /// Forces `remaining` to zero. When the known reset time has already
    /// passed the server gave nothing usable, so the reset is pushed out by
    /// the fallback delay.
    pub fn throttle(&mut self, now: DateTime<Utc>) {
        self.remaining = 0;
        if self.reset_at < now {
            match offset_by_secs(now, THROTTLE_FALLBACK_SECS) {
                Some(candidate) => {
                    self.advance_reset(candidate);
                }
                None => warn!(now = %now, "cannot push rate limit reset past the end of time"),
            }
        }
        warn!(
            reset_at = %self.reset_at,
            "rate limited by server (429), no requests until reset"
        );
    }
}

/// `now + secs`, or `None` when the result is not a representable timestamp
fn offset_by_secs(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    ChronoDuration::try_seconds(secs).and_then(|delta| now.checked_add_signed(delta))
}

/// Parse a rate limit header value
///
/// The server sends fractional values such as `"596.0"`; they are truncated.
fn parse_header_value(name: &str, raw: &str) -> Option<i64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value as i64),
        Ok(value) => {
            warn!(header = name, value = %value, "ignoring non-finite rate limit header");
            None
        }
        Err(e) => {
            warn!(header = name, raw = raw, error = %e, "failed to parse rate limit header");
            None
        }
    }
}
