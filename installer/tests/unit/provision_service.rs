//! Agent provisioning: pull, create, start, stopping at the first failure.

#![allow(clippy::expect_used)]

use std::time::Duration;

use fleet_installer::application::InstallContext;
use fleet_installer::application::services::provision::Provisioner;
use fleet_installer::domain::{AGENT_CONTAINER_NAME, RestartPolicy, Step};

use crate::mocks::{Event, RecordingObserver, Script, ScriptedClient, config, server};

#[tokio::test]
async fn successful_provision_runs_every_step_in_order() {
    let cfg = config();
    let client = ScriptedClient::healthy();
    let observer = RecordingObserver::default();

    let id = Provisioner::new(&cfg, &observer)
        .provision(&InstallContext::background(), &client, &server(1))
        .await
        .expect("provision");

    assert_eq!(id, "4f2a9c");
    assert_eq!(client.calls(), vec!["pull", "create", "start"]);
    assert_eq!(
        observer.events(),
        vec![
            Event::Entered("agent-1".into(), Step::Pull),
            Event::Succeeded("agent-1".into(), Step::Pull),
            Event::Entered("agent-1".into(), Step::Create),
            Event::Succeeded("agent-1".into(), Step::Create),
            Event::Entered("agent-1".into(), Step::Start),
            Event::Succeeded("agent-1".into(), Step::Start),
        ]
    );
}

#[tokio::test]
async fn agent_container_uses_fixed_name_and_template() {
    let cfg = config().with_volumes(vec!["/cache:/cache".into()]);
    let client = ScriptedClient::healthy();
    let observer = RecordingObserver::default();

    Provisioner::new(&cfg, &observer)
        .provision(&InstallContext::background(), &client, &server(3))
        .await
        .expect("provision");

    let (spec, name) = client.created().expect("container created");
    assert_eq!(name, AGENT_CONTAINER_NAME);
    assert_eq!(spec.image, cfg.image);
    assert_eq!(spec.restart_policy, RestartPolicy::Always);
    assert!(spec.env.contains(&"DRONE_RPC_SERVER=http://ci.example.com".to_string()));
    assert!(spec.env.contains(&"DRONE_RUNNER_NAME=agent-3".to_string()));
    assert!(spec.env.contains(&"DRONE_RUNNER_CAPACITY=2".to_string()));
    assert_eq!(
        spec.labels.get("io.drone.agent.instance").map(String::as_str),
        Some("i-3")
    );
    assert!(spec.volumes.contains("/var/run/docker.sock"));
    assert!(spec.volumes.contains("/cache"));
}

#[tokio::test]
async fn refused_pull_stops_before_create() {
    let cfg = config();
    let client = ScriptedClient::healthy().pull(Script::Fail("manifest unknown"));
    let observer = RecordingObserver::default();

    let failure = Provisioner::new(&cfg, &observer)
        .provision(&InstallContext::background(), &client, &server(1))
        .await
        .expect_err("must fail");

    assert_eq!(failure.step, Step::Pull);
    assert_eq!(failure.to_string(), "manifest unknown");
    assert_eq!(client.calls(), vec!["pull"]);
    assert!(observer.failures().is_empty(), "failures are reported by the caller");
}

#[tokio::test]
async fn pull_stream_error_fails_pull_after_draining() {
    let cfg = config();
    let client =
        ScriptedClient::healthy().pull_event_error("unauthorized: authentication required");
    let observer = RecordingObserver::default();

    let failure = Provisioner::new(&cfg, &observer)
        .provision(&InstallContext::background(), &client, &server(1))
        .await
        .expect_err("must fail");

    assert_eq!(failure.step, Step::Pull);
    assert_eq!(failure.to_string(), "unauthorized: authentication required");
    assert_eq!(client.pull_events_read(), 3);
    assert_eq!(client.calls(), vec!["pull"]);
}

#[tokio::test]
async fn create_failure_stops_before_start() {
    let cfg = config();
    let client = ScriptedClient::healthy().create(Script::Fail(
        "Conflict. The container name \"/agent\" is already in use",
    ));
    let observer = RecordingObserver::default();

    let failure = Provisioner::new(&cfg, &observer)
        .provision(&InstallContext::background(), &client, &server(1))
        .await
        .expect_err("must fail");

    assert_eq!(failure.step, Step::Create);
    assert!(failure.to_string().contains("already in use"));
    assert_eq!(client.calls(), vec!["pull", "create"]);
}

#[tokio::test]
async fn start_failure_is_reported_with_step() {
    let cfg = config();
    let client = ScriptedClient::healthy().start(Script::Fail("port is already allocated"));
    let observer = RecordingObserver::default();

    let failure = Provisioner::new(&cfg, &observer)
        .provision(&InstallContext::background(), &client, &server(1))
        .await
        .expect_err("must fail");

    assert_eq!(failure.step, Step::Start);
    assert_eq!(failure.to_string(), "port is already allocated");
    assert_eq!(client.calls(), vec!["pull", "create", "start"]);
}

#[tokio::test(start_paused = true)]
async fn hung_call_is_bounded_by_batch_deadline() {
    let cfg = config();
    let client = ScriptedClient::healthy().create(Script::Hang);
    let observer = RecordingObserver::default();
    let ctx = InstallContext::background().with_timeout(Duration::from_secs(30));

    let failure = Provisioner::new(&cfg, &observer)
        .provision(&ctx, &client, &server(1))
        .await
        .expect_err("must time out");

    assert_eq!(failure.step, Step::Create);
    assert_eq!(failure.to_string(), "context deadline exceeded");
    assert_eq!(client.calls(), vec!["pull", "create"]);
}
