//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `fleet_common`, never from
//! `crate::infra`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use fleet_common::{Server, ServerState};
use futures::stream::BoxStream;

use crate::domain::{ContainerSpec, Step};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Minimal view of a container returned by the runtime's list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub state: String,
}

/// One progress message from an image pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullEvent {
    pub status: Option<String>,
    pub progress: Option<String>,
}

/// Progress stream of an image pull. Dropping it closes the pull.
pub type PullStream = BoxStream<'static, Result<PullEvent>>;

// ── Store Port ────────────────────────────────────────────────────────────────

/// Persistent server records, shared with the server-creation and
/// server-destruction components.
///
/// Implementations must be safe for concurrent use. Updates are
/// last-writer-wins per record; the installer never writes the same record
/// from two workers at once.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// All servers currently in `state`.
    async fn list_state(&self, state: ServerState) -> Result<Vec<Server>>;
    /// Replace the stored record with the same id.
    async fn update(&self, server: &Server) -> Result<()>;
}

// ── Runtime Ports ─────────────────────────────────────────────────────────────

/// Container-runtime API on one remote host.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// List running containers. Used as the reachability check.
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;
    /// Start pulling `image`; the pull completes when the stream ends.
    async fn pull_image(&self, image: &str) -> Result<PullStream>;
    /// Create a container named `name`, returning its id.
    async fn create_container(&self, spec: &ContainerSpec, name: &str) -> Result<String>;
    /// Start a created container.
    async fn start_container(&self, id: &str) -> Result<()>;
}

/// Builds the runtime client for a server's address.
///
/// Construction failures are not retried.
pub trait ClientFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no client can be built for the server's address.
    fn connect(&self, server: &Server) -> Result<Arc<dyn RuntimeClient>>;
}

// ── Observability Port ────────────────────────────────────────────────────────

/// Receives bootstrap step boundaries so services can report progress without
/// depending on a logging backend.
pub trait InstallObserver: Send + Sync {
    /// A step is about to run.
    fn step_entered(&self, server: &Server, step: Step);
    /// A step finished successfully.
    fn step_succeeded(&self, server: &Server, step: Step);
    /// A step failed; `error` is the text recorded for the server.
    fn step_failed(&self, server: &Server, step: Step, error: &str);
    /// The runtime was not reachable yet; the probe retries after `delay`.
    fn probe_retry(&self, server: &Server, error: &str, delay: std::time::Duration);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl InstallObserver for NoopObserver {
    fn step_entered(&self, _: &Server, _: Step) {}
    fn step_succeeded(&self, _: &Server, _: Step) {}
    fn step_failed(&self, _: &Server, _: Step, _: &str) {}
    fn probe_retry(&self, _: &Server, _: &str, _: std::time::Duration) {}
}
