//! Connectivity probe timing.
//!
//! First attempt immediately, then one attempt per minute without limit,
//! until the runtime answers or the context ends.

#![allow(clippy::expect_used)]

use std::time::Duration;

use fleet_installer::application::services::probe::{PROBE_INTERVAL, probe};
use fleet_installer::application::InstallContext;
use fleet_installer::domain::ContextError;
use tokio::time::Instant;

use crate::mocks::{Event, RecordingObserver, ScriptedClient, server};

#[test]
fn interval_is_one_minute() {
    assert_eq!(PROBE_INTERVAL, Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn reachable_host_answers_first_attempt_without_delay() {
    let client = ScriptedClient::healthy();
    let observer = RecordingObserver::default();
    let start = Instant::now();

    probe(&InstallContext::background(), &client, &server(1), &observer)
        .await
        .expect("probe");

    let times = client.list_times();
    assert_eq!(times.len(), 1);
    assert_eq!(times[0], start);
    assert_eq!(observer.retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn failures_are_retried_once_per_minute() {
    let client = ScriptedClient::healthy().unreachable_for(3);
    let observer = RecordingObserver::default();
    let start = Instant::now();

    probe(&InstallContext::background(), &client, &server(1), &observer)
        .await
        .expect("probe");

    let offsets: Vec<u64> = client
        .list_times()
        .iter()
        .map(|t| t.duration_since(start).as_secs())
        .collect();
    assert_eq!(offsets, vec![0, 60, 120, 180]);
    assert_eq!(
        observer.events(),
        vec![Event::Retry("agent-1".into(), PROBE_INTERVAL); 3]
    );
}

#[tokio::test(start_paused = true)]
async fn long_outage_has_no_retry_limit() {
    let client = ScriptedClient::healthy().unreachable_for(500);
    let observer = RecordingObserver::default();

    probe(&InstallContext::background(), &client, &server(1), &observer)
        .await
        .expect("probe");

    assert_eq!(client.list_times().len(), 501);
    assert_eq!(observer.retries(), 500);
}

#[tokio::test(start_paused = true)]
async fn deadline_ends_the_connectivity_wait() {
    let client = ScriptedClient::healthy().never_reachable();
    let observer = RecordingObserver::default();
    let ctx = InstallContext::background().with_timeout(Duration::from_secs(150));
    let start = Instant::now();

    let err = probe(&ctx, &client, &server(1), &observer)
        .await
        .expect_err("must time out");

    assert_eq!(err, ContextError::DeadlineExceeded);
    assert_eq!(err.to_string(), "context deadline exceeded");
    assert_eq!(client.list_times().len(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(150));
}

#[tokio::test(start_paused = true)]
async fn cancellation_ends_the_connectivity_wait() {
    let client = ScriptedClient::healthy().never_reachable();
    let observer = RecordingObserver::default();
    let (ctx, cancel) = InstallContext::with_cancel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(90)).await;
        cancel.cancel();
    });
    let start = Instant::now();

    let err = probe(&ctx, &client, &server(1), &observer)
        .await
        .expect_err("must be cancelled");

    assert_eq!(err, ContextError::Cancelled);
    assert_eq!(client.list_times().len(), 2);
    assert_eq!(start.elapsed(), Duration::from_secs(90));
}

#[tokio::test]
async fn already_cancelled_context_makes_no_attempt() {
    let client = ScriptedClient::healthy();
    let observer = RecordingObserver::default();
    let (ctx, cancel) = InstallContext::with_cancel();
    cancel.cancel();

    let err = probe(&ctx, &client, &server(1), &observer)
        .await
        .expect_err("must be cancelled");

    assert_eq!(err, ContextError::Cancelled);
    assert!(client.list_times().is_empty());
}
