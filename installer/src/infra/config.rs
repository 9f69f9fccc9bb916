//! Environment configuration for the installer binary.
//!
//! Every setting maps to `FLEET_<FIELD>`; list values are comma-separated:
//!   - `FLEET_SECRET`                  (required)
//!   - `FLEET_HOST`                    (required, RPC server host[:port])
//!   - `FLEET_STORE_PATH`              (required, JSON server store file)
//!   - `FLEET_IMAGE`                   (default `drone/drone-runner-docker:1`)
//!   - `FLEET_PROTO`                   (default `http`)
//!   - `FLEET_VOLUMES`                 (extra agent bind specs)
//!   - `FLEET_KEEPALIVE_TIME_SECS`     (optional)
//!   - `FLEET_KEEPALIVE_TIMEOUT_SECS`  (optional)
//!   - `FLEET_RUNNER_VOLUMES`, `FLEET_RUNNER_DEVICES`, `FLEET_RUNNER_PRIVILEGED`
//!   - `FLEET_DOCKER_PORT`             (default `2375`)
//!   - `FLEET_DOCKER_TIMEOUT_SECS`     (default `120`, at least 1)
//!   - `FLEET_INSTALL_TIMEOUT_SECS`    (default `3600`, at least 1)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::config::{DEFAULT_AGENT_IMAGE, DEFAULT_RPC_PROTO};
use crate::domain::{ConfigError, InstallConfig, RunnerConfig};
use crate::infra::docker::{DEFAULT_DOCKER_PORT, DEFAULT_DOCKER_TIMEOUT};

pub const ENV_PREFIX: &str = "FLEET_";

/// Batch deadline when none is configured.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(3600);

/// Flat view of the `FLEET_*` variables.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    secret: String,
    host: String,
    store_path: PathBuf,

    #[serde(default = "default_image")]
    image: String,
    #[serde(default = "default_proto")]
    proto: String,
    #[serde(default)]
    volumes: Vec<String>,
    keepalive_time_secs: Option<u64>,
    keepalive_timeout_secs: Option<u64>,

    #[serde(default)]
    runner_volumes: Vec<String>,
    #[serde(default)]
    runner_devices: Vec<String>,
    #[serde(default)]
    runner_privileged: Vec<String>,

    #[serde(default = "default_docker_port")]
    docker_port: u16,
    #[serde(default = "default_docker_timeout_secs")]
    docker_timeout_secs: u64,
    #[serde(default = "default_install_timeout_secs")]
    install_timeout_secs: u64,
}

fn default_image() -> String {
    DEFAULT_AGENT_IMAGE.to_string()
}

fn default_proto() -> String {
    DEFAULT_RPC_PROTO.to_string()
}

fn default_docker_port() -> u16 {
    DEFAULT_DOCKER_PORT
}

fn default_docker_timeout_secs() -> u64 {
    DEFAULT_DOCKER_TIMEOUT.as_secs()
}

fn default_install_timeout_secs() -> u64 {
    DEFAULT_INSTALL_TIMEOUT.as_secs()
}

/// Everything the binary needs to run one batch.
#[derive(Debug, Clone)]
pub struct Settings {
    pub install: InstallConfig,
    pub store_path: PathBuf,
    pub docker_port: u16,
    pub docker_timeout: Duration,
    pub install_timeout: Duration,
}

impl From<EnvConfig> for Settings {
    fn from(env: EnvConfig) -> Self {
        let install = InstallConfig::new(env.secret, env.host)
            .with_image(env.image)
            .with_proto(env.proto)
            .with_volumes(non_empty(env.volumes))
            .with_keepalive(
                env.keepalive_time_secs.map(Duration::from_secs),
                env.keepalive_timeout_secs.map(Duration::from_secs),
            )
            .with_runner(RunnerConfig {
                volumes: non_empty(env.runner_volumes),
                devices: non_empty(env.runner_devices),
                privileged: non_empty(env.runner_privileged),
            });
        Self {
            install,
            store_path: env.store_path,
            docker_port: env.docker_port,
            docker_timeout: Duration::from_secs(env.docker_timeout_secs),
            install_timeout: Duration::from_secs(env.install_timeout_secs),
        }
    }
}

/// `FLEET_VOLUMES=` yields one empty item; drop those.
fn non_empty(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Load and validate settings from the process environment.
///
/// # Errors
///
/// Returns an error if a required variable is missing, a value does not
/// parse, or the resulting install configuration is invalid.
pub fn load_settings() -> Result<Settings> {
    settings_from_iter(std::env::vars())
}

/// Load and validate settings from explicit `(key, value)` pairs.
///
/// # Errors
///
/// Same as [`load_settings`].
pub fn settings_from_iter<I>(vars: I) -> Result<Settings>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env: EnvConfig = envy::prefixed(ENV_PREFIX).from_iter(vars).context(
        "failed to load config from FLEET_* env vars \
         (FLEET_SECRET, FLEET_HOST and FLEET_STORE_PATH are required)",
    )?;
    for (key, secs) in [
        ("docker_timeout_secs", env.docker_timeout_secs),
        ("install_timeout_secs", env.install_timeout_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::Invalid {
                key,
                reason: "must be at least one second".to_string(),
            }
            .into());
        }
    }
    let settings = Settings::from(env);
    settings
        .install
        .validate()
        .context("invalid install configuration")?;
    Ok(settings)
}
