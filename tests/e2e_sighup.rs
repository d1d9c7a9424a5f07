//! SIGHUP reload E2E tests
//!
//! Signals are delivered to the whole test process, so these run serially.

#![cfg(unix)]

mod helper;

use std::time::Duration;

use helper::{TestExporter, up_to_date};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serial_test::serial;
use version_exporter::version::release::Release;
use version_exporter::version::sources::FakeSource;

fn send_hangup() {
    kill(Pid::this(), Signal::SIGHUP).unwrap();
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
#[serial]
async fn sighup_reloads_config() {
    let source = FakeSource::new()
        .with_releases("foo", vec![Release::new("v0.1.1")])
        .with_releases("bar", vec![Release::new("v1.0.0")]);
    let exporter = TestExporter::new("repositories:\n  foo: v0.1.1\n", source);
    exporter.scrape().await;
    assert_eq!(exporter.cache.len(), 1);

    let watcher = tokio::spawn(exporter.watch.clone().watch_signals());
    // Let the watcher install its handler before signalling
    tokio::time::sleep(Duration::from_millis(100)).await;

    exporter.rewrite_config("repositories:\n  foo: v0.1.1\n  bar: ^1.0.0\n");
    send_hangup();

    let watch = exporter.watch.clone();
    assert!(wait_until(|| watch.snapshot().repositories.len() == 2).await);
    assert!(exporter.cache.is_empty());

    let (_, body) = exporter.scrape().await;
    assert!(body.contains(&up_to_date("bar", "^1.0.0", "1.0.0", 1)));

    watcher.abort();
}

#[tokio::test]
#[serial]
async fn sighup_with_broken_config_stops_watcher() {
    let exporter = TestExporter::new("repositories:\n  foo: v0.1.1\n", FakeSource::new());

    let watcher = tokio::spawn(exporter.watch.clone().watch_signals());
    tokio::time::sleep(Duration::from_millis(100)).await;

    exporter.rewrite_config("repositories: [broken");
    send_hangup();

    let result = tokio::time::timeout(Duration::from_secs(2), watcher)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_err());
    assert_eq!(exporter.watch.snapshot().repositories.len(), 1);
}
