//! Docker Engine adapter for the `RuntimeClient` and `ClientFactory` ports.
//!
//! Talks to the remote daemon over plain HTTP with `bollard`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, RestartPolicy as DockerRestartPolicy, RestartPolicyNameEnum};
use fleet_common::Server;
use futures::StreamExt;
use regex::Regex;

use crate::application::ports::{
    ClientFactory, ContainerSummary, PullEvent, PullStream, RuntimeClient,
};
use crate::domain::{ContainerSpec, RestartPolicy};

/// Port the remote daemon listens on when none is configured.
pub const DEFAULT_DOCKER_PORT: u16 = 2375;
/// Per-request timeout when none is configured.
pub const DEFAULT_DOCKER_TIMEOUT: Duration = Duration::from_secs(120);

/// One DNS label (RFC 1123).
static HOST_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Constant pattern; cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("valid regex")
});

/// Daemon URL for a bare host address: an IP literal or a DNS name, with no
/// scheme, port, path or whitespace.
///
/// # Errors
///
/// Returns an error naming the address if it is not a bare host.
pub fn endpoint_url(address: &str, port: u16) -> Result<String> {
    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(match ip {
            IpAddr::V4(v4) => format!("http://{v4}:{port}"),
            IpAddr::V6(v6) => format!("http://[{v6}]:{port}"),
        });
    }
    let name = address.strip_suffix('.').unwrap_or(address);
    let valid = !name.is_empty()
        && name.len() <= 253
        && name.split('.').all(|label| HOST_LABEL_RE.is_match(label));
    if !valid {
        anyhow::bail!("invalid docker host address '{address}'");
    }
    Ok(format!("http://{name}:{port}"))
}

/// `RuntimeClient` backed by one remote Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Client for the daemon at `http://<address>:<port>`.
    ///
    /// No request is sent; an unreachable daemon only shows up on first use.
    /// `timeout` is applied in whole seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if `address` is not a bare host, if `timeout` is
    /// under one second, or if the endpoint cannot be turned into a client.
    pub fn connect(address: &str, port: u16, timeout: Duration) -> Result<Self> {
        let url = endpoint_url(address, port)?;
        let timeout_secs = timeout.as_secs();
        if timeout_secs == 0 {
            anyhow::bail!("docker request timeout must be at least one second");
        }
        let docker =
            Docker::connect_with_http(&url, timeout_secs, bollard::API_DEFAULT_VERSION)
                .with_context(|| format!("building docker client for {url}"))?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl RuntimeClient for DockerClient {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String>::default()))
            .await?;
        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
            })
            .collect())
    }

    async fn pull_image(&self, image: &str) -> Result<PullStream> {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let stream = self
            .docker
            .create_image(Some(options), None, None)
            .map(|event| -> Result<PullEvent> {
                let info = event?;
                if let Some(message) = info.error {
                    anyhow::bail!(message);
                }
                Ok(PullEvent {
                    status: info.status,
                    progress: info.progress,
                })
            });
        Ok(stream.boxed())
    }

    async fn create_container(&self, spec: &ContainerSpec, name: &str) -> Result<String> {
        let options = CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        };
        let response = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await?;
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }
}

/// Translate the runtime-neutral spec into the engine's create body.
fn container_config(spec: &ContainerSpec) -> Config<String> {
    let restart_policy = match spec.restart_policy {
        RestartPolicy::Always => DockerRestartPolicy {
            name: Some(RestartPolicyNameEnum::ALWAYS),
            maximum_retry_count: None,
        },
    };
    Config {
        image: Some(spec.image.clone()),
        env: Some(spec.env.clone()),
        labels: Some(
            spec.labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        volumes: Some(
            spec.volumes
                .iter()
                .map(|target| (target.clone(), HashMap::new()))
                .collect(),
        ),
        attach_stdout: Some(spec.attach_stdout),
        attach_stderr: Some(spec.attach_stderr),
        host_config: Some(HostConfig {
            binds: Some(spec.binds.clone()),
            restart_policy: Some(restart_policy),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds a [`DockerClient`] per server from its address.
#[derive(Debug, Clone)]
pub struct DockerClientFactory {
    port: u16,
    timeout: Duration,
}

impl DockerClientFactory {
    /// `timeout` is applied per request, in whole seconds.
    #[must_use]
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

impl Default for DockerClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_PORT, DEFAULT_DOCKER_TIMEOUT)
    }
}

impl ClientFactory for DockerClientFactory {
    fn connect(&self, server: &Server) -> Result<Arc<dyn RuntimeClient>> {
        if server.address.trim().is_empty() {
            anyhow::bail!("server '{}' has no address", server.name);
        }
        let client = DockerClient::connect(&server.address, self.port, self.timeout)
            .with_context(|| format!("server '{}'", server.name))?;
        Ok(Arc::new(client))
    }
}
