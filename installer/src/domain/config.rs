//! Install configuration, built once at startup and shared read-only by every
//! worker.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_AGENT_IMAGE: &str = "drone/drone-runner-docker:1";
pub const DEFAULT_RPC_PROTO: &str = "http";
pub const VALID_RPC_PROTOS: &[&str] = &["http", "https"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Settings forwarded to the agent through its environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Extra volumes the agent mounts into every pipeline container.
    pub volumes: Vec<String>,
    /// Host devices exposed to pipeline containers.
    pub devices: Vec<String>,
    /// Images allowed to run privileged.
    pub privileged: Vec<String>,
}

/// Process-wide agent install configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Agent image reference.
    pub image: String,
    /// Shared secret the agent presents to the RPC server.
    pub secret: String,
    /// Base bind-mount specs for the agent container.
    pub volumes: Vec<String>,
    /// RPC server host, with optional port.
    pub host: String,
    /// RPC server scheme: `http` or `https`.
    pub proto: String,
    /// Accepted for the agent's RPC connection; the connectivity probe keeps
    /// its fixed interval regardless.
    pub keepalive_time: Option<Duration>,
    pub keepalive_timeout: Option<Duration>,
    pub runner: RunnerConfig,
}

impl InstallConfig {
    #[must_use]
    pub fn new(secret: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            image: DEFAULT_AGENT_IMAGE.to_string(),
            secret: secret.into(),
            volumes: Vec::new(),
            host: host.into(),
            proto: DEFAULT_RPC_PROTO.to_string(),
            keepalive_time: None,
            keepalive_timeout: None,
            runner: RunnerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    #[must_use]
    pub fn with_proto(mut self, proto: impl Into<String>) -> Self {
        self.proto = proto.into();
        self
    }

    #[must_use]
    pub fn with_volumes(mut self, volumes: Vec<String>) -> Self {
        self.volumes = volumes;
        self
    }

    #[must_use]
    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }

    #[must_use]
    pub fn with_keepalive(mut self, time: Option<Duration>, timeout: Option<Duration>) -> Self {
        self.keepalive_time = time;
        self.keepalive_timeout = timeout;
        self
    }

    /// RPC endpoint handed to the agent, `scheme://host`.
    #[must_use]
    pub fn rpc_server(&self) -> String {
        format!("{}://{}", self.proto, self.host)
    }

    /// Reject configurations that could never produce a working agent.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.trim().is_empty() {
            return Err(ConfigError::Missing("image"));
        }
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Missing("secret"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.host.contains("://") {
            return Err(ConfigError::Invalid {
                key: "host",
                reason: format!("'{}' must not include a scheme", self.host),
            });
        }
        if !VALID_RPC_PROTOS.contains(&self.proto.as_str()) {
            return Err(ConfigError::Invalid {
                key: "proto",
                reason: format!(
                    "'{}' is not one of {}",
                    self.proto,
                    VALID_RPC_PROTOS.join(", ")
                ),
            });
        }
        Ok(())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
