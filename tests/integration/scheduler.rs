//! Integration tests for the polling loop and graceful shutdown

use reddit_images::community::CommunityName;
use reddit_images::downloader::{DownloadReconciler, Scheduler};
use reddit_images::shutdown::ShutdownCoordinator;
use std::time::Duration;
use tempfile::TempDir;

use crate::support::fake_fetcher::FakeFetcher;

const EMPTY_LISTING: &str = r#"{"kind": "Listing", "data": {"after": null, "children": []}}"#;
const PICS_URL: &str = "http://api.test/r/pics/hot.json?raw_json=1&limit=100";
const AWW_URL: &str = "http://api.test/r/aww/hot.json?raw_json=1&limit=100";

fn communities() -> Vec<CommunityName> {
    vec![
        CommunityName::parse("pics").unwrap(),
        CommunityName::parse("aww").unwrap(),
    ]
}

fn fetcher() -> FakeFetcher {
    let fetcher = FakeFetcher::new();
    fetcher.respond_json(PICS_URL, EMPTY_LISTING);
    fetcher.respond_json(AWW_URL, EMPTY_LISTING);
    fetcher
}

#[tokio::test]
async fn test_sweep_visits_communities_in_order() {
    let root = TempDir::new().unwrap();
    let fetcher = fetcher();
    let scheduler = Scheduler::new(
        DownloadReconciler::new(&fetcher).with_api_base("http://api.test"),
        communities(),
        root.path().to_path_buf(),
        Duration::from_secs(60),
        ShutdownCoordinator::shared(),
    );

    let report = scheduler.run_sweep().await;

    assert_eq!(report.posts, 0);
    assert_eq!(fetcher.urls(), vec![PICS_URL.to_string(), AWW_URL.to_string()]);
    assert!(root.path().join("pics").is_dir());
    assert!(root.path().join("aww").is_dir());
}

#[tokio::test]
async fn test_sweep_stops_between_communities_on_shutdown() {
    let root = TempDir::new().unwrap();
    let fetcher = fetcher();
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();
    let scheduler = Scheduler::new(
        DownloadReconciler::new(&fetcher).with_api_base("http://api.test"),
        communities(),
        root.path().to_path_buf(),
        Duration::from_secs(60),
        shutdown,
    );

    scheduler.run_sweep().await;

    assert!(fetcher.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_sleeps_between_sweeps_until_shutdown() {
    let root = TempDir::new().unwrap();
    let fetcher = fetcher();
    let shutdown = ShutdownCoordinator::shared();
    let scheduler = Scheduler::new(
        DownloadReconciler::new(&fetcher).with_api_base("http://api.test"),
        communities(),
        root.path().to_path_buf(),
        Duration::from_secs(60),
        shutdown.clone(),
    );

    let stopper = async {
        tokio::time::sleep(Duration::from_secs(90)).await;
        shutdown.request_shutdown();
    };
    tokio::join!(scheduler.run(), stopper);

    // Sweeps at t=0 and t=60; shutdown at t=90 interrupts the next sleep
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls[2].at - calls[0].at >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_unschedulable_interval_waits_for_shutdown() {
    let root = TempDir::new().unwrap();
    let fetcher = fetcher();
    let shutdown = ShutdownCoordinator::shared();
    let scheduler = Scheduler::new(
        DownloadReconciler::new(&fetcher).with_api_base("http://api.test"),
        communities(),
        root.path().to_path_buf(),
        Duration::from_secs(u64::MAX),
        shutdown.clone(),
    );

    let stopper = async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown.request_shutdown();
    };
    tokio::join!(scheduler.run(), stopper);

    assert_eq!(fetcher.calls().len(), 2);
}
