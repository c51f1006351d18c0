//! Integration tests for logging and tracing
//!
//! Each test installs a scoped subscriber writing into a buffer, so the
//! assertions see exactly what a user would see on stdout.

use chrono::Utc;
use reddit_images::downloader::RateBudget;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Shared in-memory log sink
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_text(filter: &str, f: impl FnOnce()) -> String {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    sink.contents()
}

fn capture_json(filter: &str, f: impl FnOnce()) -> Vec<serde_json::Value> {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    sink.contents()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_default_filter_shows_library_warnings() {
    let output = capture_text("reddit_images=info", || {
        RateBudget::new(Utc::now()).throttle(Utc::now());
    });

    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("rate limited by server (429)"), "{output}");
    assert!(output.contains("reddit_images::downloader::rate_limit"), "{output}");
}

#[test]
fn test_default_filter_hides_debug() {
    let output = capture_text("reddit_images=info", || {
        debug!(target: "reddit_images::fetcher::listing", after = "t3_x", "further listing pages not fetched");
        info!(target: "reddit_images::downloader::scheduler", "sweep finished");
    });

    assert!(!output.contains("further listing pages"), "{output}");
    assert!(output.contains("sweep finished"), "{output}");
}

#[test]
fn test_other_crates_are_filtered_out() {
    let output = capture_text("reddit_images=info", || {
        info!(target: "hyper::client", "connection reused");
    });

    assert!(output.is_empty(), "{output}");
}

#[test]
fn test_structured_fields_in_text_output() {
    let output = capture_text("reddit_images=debug", || {
        let span = tracing::info_span!(target: "reddit_images::downloader::reconciler", "reconcile", community = "pics");
        let _guard = span.enter();
        info!(target: "reddit_images::downloader::reconciler", posts = 25, downloaded = 3, "community reconciled");
    });

    assert!(output.contains("community=\"pics\""), "{output}");
    assert!(output.contains("posts=25"), "{output}");
    assert!(output.contains("downloaded=3"), "{output}");
}

#[test]
fn test_json_output_is_one_object_per_event() {
    let events = capture_json("reddit_images=info", || {
        info!(target: "reddit_images::downloader::reconciler", downloaded = 3, "community reconciled");
        info!(target: "reddit_images::downloader::scheduler", "sweep finished");
    });

    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["level"], "INFO");
    assert_eq!(events[0]["target"], "reddit_images::downloader::reconciler");
    assert_eq!(events[0]["fields"]["message"], "community reconciled");
    assert_eq!(events[0]["fields"]["downloaded"], 3);
    assert_eq!(events[1]["fields"]["message"], "sweep finished");
}

#[test]
fn test_env_filter_directives_parse() {
    for directive in ["info", "reddit_images=debug", "warn,reddit_images=trace"] {
        assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
    }
    assert!(EnvFilter::try_new("reddit_images=notalevel").is_err());
}
