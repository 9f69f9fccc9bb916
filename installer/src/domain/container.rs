//! Agent container template.
//!
//! Pure mapping from install configuration and server record to the container
//! the runtime should create. Runtime adapters translate [`ContainerSpec`] into
//! their own API types.

use std::collections::{BTreeMap, BTreeSet};

use fleet_common::Server;

use crate::domain::config::InstallConfig;
use crate::domain::volume::{dedup_binds, to_bind_set};

/// Name of the single agent container on every host.
pub const AGENT_CONTAINER_NAME: &str = "agent";

/// Exposes the host runtime's control socket to the agent.
pub const DOCKER_SOCKET_BIND: &str = "/var/run/docker.sock:/var/run/docker.sock";

pub const ENV_RPC_SERVER: &str = "DRONE_RPC_SERVER";
pub const ENV_RPC_SECRET: &str = "DRONE_RPC_SECRET";
pub const ENV_RUNNER_CAPACITY: &str = "DRONE_RUNNER_CAPACITY";
pub const ENV_RUNNER_NAME: &str = "DRONE_RUNNER_NAME";
pub const ENV_RUNNER_VOLUMES: &str = "DRONE_RUNNER_VOLUMES";
pub const ENV_RUNNER_DEVICES: &str = "DRONE_RUNNER_DEVICES";
pub const ENV_RUNNER_PRIVILEGED_IMAGES: &str = "DRONE_RUNNER_PRIVILEGED_IMAGES";

pub const LABEL_AGENT_NAME: &str = "io.drone.agent.name";
pub const LABEL_AGENT_ZONE: &str = "io.drone.agent.zone";
pub const LABEL_AGENT_SIZE: &str = "io.drone.agent.size";
pub const LABEL_AGENT_INSTANCE: &str = "io.drone.agent.instance";
pub const LABEL_AGENT_CAPACITY: &str = "io.drone.agent.capacity";
pub const LABEL_WATCHTOWER_ENABLE: &str = "com.centurylinklabs.watchtower.enable";
pub const LABEL_WATCHTOWER_STOP_SIGNAL: &str = "com.centurylinklabs.watchtower.stop-signal";

/// Container restart behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    Always,
}

/// Runtime-neutral description of the agent container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    /// `KEY=value` pairs, in a fixed order.
    pub env: Vec<String>,
    pub labels: BTreeMap<String, String>,
    /// Declared mount targets.
    pub volumes: BTreeSet<String>,
    /// Host bind specs, one per target.
    pub binds: Vec<String>,
    pub restart_policy: RestartPolicy,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
}

/// Build the agent container for `server`.
///
/// Binds are the runtime socket followed by the configured volumes, one per
/// target. A configured volume aimed at the socket target is dropped.
#[must_use]
pub fn agent_container_spec(config: &InstallConfig, server: &Server) -> ContainerSpec {
    let capacity = server.capacity().to_string();

    let env = vec![
        format!("{ENV_RPC_SERVER}={}", config.rpc_server()),
        format!("{ENV_RPC_SECRET}={}", config.secret),
        format!("{ENV_RUNNER_CAPACITY}={capacity}"),
        format!("{ENV_RUNNER_NAME}={}", server.name),
        format!("{ENV_RUNNER_VOLUMES}={}", config.runner.volumes.join(",")),
        format!("{ENV_RUNNER_DEVICES}={}", config.runner.devices.join(",")),
        format!(
            "{ENV_RUNNER_PRIVILEGED_IMAGES}={}",
            config.runner.privileged.join(",")
        ),
    ];

    let labels = [
        (LABEL_WATCHTOWER_ENABLE, "true"),
        (LABEL_WATCHTOWER_STOP_SIGNAL, "SIGHUP"),
        (LABEL_AGENT_NAME, server.name.as_str()),
        (LABEL_AGENT_ZONE, server.region.as_str()),
        (LABEL_AGENT_SIZE, server.size.as_str()),
        (LABEL_AGENT_INSTANCE, server.id.as_str()),
        (LABEL_AGENT_CAPACITY, capacity.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    // The socket bind goes first so a configured volume cannot replace it.
    let binds = dedup_binds(
        std::iter::once(DOCKER_SOCKET_BIND).chain(config.volumes.iter().map(String::as_str)),
    );
    let volumes = to_bind_set(binds.iter().map(String::as_str));

    ContainerSpec {
        image: config.image.clone(),
        env,
        labels,
        volumes,
        binds,
        restart_policy: RestartPolicy::Always,
        attach_stdout: true,
        attach_stderr: true,
    }
}
