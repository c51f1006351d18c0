//! Integration tests for the command line binary

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("reddit-images").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("LOG_FORMAT");
    cmd
}

#[test]
fn test_requires_a_community() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("COMMUNITY"));
}

#[test]
fn test_help_lists_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--every"))
        .stdout(predicate::str::contains("--out-dir"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn test_rejects_zero_interval() {
    cmd().args(["--every", "0", "pics"]).assert().failure();
}

#[test]
fn test_rejects_interval_longer_than_a_year() {
    cmd()
        .args(["--every", "18446744073709551615", "pics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--every"));
}

#[test]
fn test_invalid_community_exits_with_error() {
    let out = tempfile::TempDir::new().unwrap();
    cmd()
        .args(["--once", "--out-dir"])
        .arg(out.path())
        .arg("../etc")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invalid community"));

    // Nothing is created for a rejected run
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
