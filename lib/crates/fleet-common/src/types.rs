use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message recorded when a failure carries no text of its own.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Lifecycle state of a provisionable server.
///
/// `created` is written by the server-creation component; the installer moves
/// a server forward through `staging` into `running` or `error`, never back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    #[default]
    Created,
    Staging,
    Running,
    Error,
}

impl ServerState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Staging => "staging",
            Self::Running => "running",
            Self::Error => "error",
        }
    }

    /// `running` and `error` end a bootstrap.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Running | Self::Error)
    }

    /// Whether the installer may move a server from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: ServerState) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Staging) | (Self::Staging, Self::Running | Self::Error)
        )
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("server '{server}' cannot move from {from} to {to}")]
pub struct TransitionError {
    pub server: String,
    pub from: ServerState,
    pub to: ServerState,
}

/// One provisionable host as stored by the server store.
///
/// `state` and `error` only change through the transition methods, which keep
/// the message present exactly when the state is `error`. `capacity` is fixed
/// at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub name: String,
    /// Network address of the host's container runtime, without scheme or port.
    pub address: String,
    pub region: String,
    pub size: String,
    capacity: u32,
    state: ServerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Server {
    /// A freshly created server record in the `created` state.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        capacity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            region: String::new(),
            size: String::new(),
            capacity,
            state: ServerState::Created,
            error: None,
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Number of agent slots on this host.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Last recorded failure, present only in the `error` state.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `created` -> `staging`.
    pub fn stage(&mut self) -> Result<(), TransitionError> {
        self.transition(ServerState::Staging)?;
        Ok(())
    }

    /// `staging` -> `running`; clears any previous message.
    pub fn mark_running(&mut self) -> Result<(), TransitionError> {
        self.transition(ServerState::Running)?;
        self.error = None;
        Ok(())
    }

    /// `staging` -> `error`, recording `message`.
    ///
    /// An empty message is replaced with [`UNKNOWN_ERROR`].
    pub fn mark_error(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(ServerState::Error)?;
        let message = message.into();
        self.error = Some(if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        });
        Ok(())
    }

    fn transition(&mut self, next: ServerState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                server: self.name.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
