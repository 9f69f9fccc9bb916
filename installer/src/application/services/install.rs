//! Installation use-case.
//!
//! Finds every server still in `created`, stages the whole batch, then hands
//! each server to its own worker. All I/O is routed through injected port
//! traits.

use std::sync::Arc;

use anyhow::{Context, Result};
use fleet_common::{Server, ServerState};

use crate::application::context::InstallContext;
use crate::application::ports::{ClientFactory, InstallObserver, ServerStore};
use crate::application::services::lifecycle;
use crate::application::services::probe::probe;
use crate::application::services::provision::Provisioner;
use crate::application::services::worker_group::WorkerGroup;
use crate::domain::{BootstrapError, InstallConfig, Step, StepFailure};

/// Installation orchestrator.
///
/// One worker is launched per staged server with no upper bound: the number
/// of servers in `created` is capped by the capacity policy that creates
/// them, not here.
pub struct Installer {
    worker: Worker,
    workers: WorkerGroup,
}

impl Installer {
    #[must_use]
    pub fn new(
        config: InstallConfig,
        store: Arc<dyn ServerStore>,
        clients: Arc<dyn ClientFactory>,
        observer: Arc<dyn InstallObserver>,
    ) -> Self {
        Self {
            worker: Worker {
                config: Arc::new(config),
                store,
                clients,
                observer,
            },
            workers: WorkerGroup::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &InstallConfig {
        &self.worker.config
    }

    /// Stage every `created` server and launch one bootstrap worker each.
    ///
    /// Returns once the workers are launched, with their count; use
    /// [`Installer::wait`] to await the bootstraps themselves. Every worker
    /// shares `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails or any staging write fails. In both
    /// cases no worker is launched.
    pub async fn install(&self, ctx: &InstallContext) -> Result<usize> {
        let store = self.worker.store.as_ref();
        let observer = self.worker.observer.as_ref();

        let mut servers = store
            .list_state(ServerState::Created)
            .await
            .context("listing created servers")?;

        for server in &mut servers {
            observer.step_entered(server, Step::Stage);
            if let Err(err) = lifecycle::stage(store, server).await {
                observer.step_failed(server, Step::Stage, &err.to_string());
                return Err(err.into());
            }
            observer.step_succeeded(server, Step::Stage);
        }

        let launched = servers.len();
        for server in servers {
            let worker = self.worker.clone();
            let ctx = ctx.clone();
            self.workers.spawn(async move {
                if let Err(err) = worker.run(&ctx, server).await {
                    tracing::error!(error = %err, "bootstrap worker stopped early");
                }
            });
        }
        Ok(launched)
    }

    /// Resolve once every launched worker has finished.
    pub async fn wait(&self) {
        self.workers.wait().await;
    }

    /// Number of workers still running.
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.workers.active()
    }
}

/// Everything one bootstrap needs, cheap to clone into a task.
#[derive(Clone)]
struct Worker {
    config: Arc<InstallConfig>,
    store: Arc<dyn ServerStore>,
    clients: Arc<dyn ClientFactory>,
    observer: Arc<dyn InstallObserver>,
}

impl Worker {
    /// Drive one staged server to `running` or `error`.
    async fn run(&self, ctx: &InstallContext, mut server: Server) -> Result<(), BootstrapError> {
        match self.bootstrap(ctx, &server).await {
            Ok(_) => self.complete(&mut server).await,
            Err(failure) => self.fail(&mut server, &failure).await,
        }
    }

    async fn bootstrap(
        &self,
        ctx: &InstallContext,
        server: &Server,
    ) -> Result<String, StepFailure> {
        let observer = self.observer.as_ref();

        observer.step_entered(server, Step::Connect);
        let client = self
            .clients
            .connect(server)
            .map_err(|err| StepFailure::new(Step::Connect, err))?;
        observer.step_succeeded(server, Step::Connect);

        observer.step_entered(server, Step::Probe);
        probe(ctx, client.as_ref(), server, observer)
            .await
            .map_err(|err| StepFailure::new(Step::Probe, err))?;
        observer.step_succeeded(server, Step::Probe);

        Provisioner::new(&self.config, observer)
            .provision(ctx, client.as_ref(), server)
            .await
    }

    async fn complete(&self, server: &mut Server) -> Result<(), BootstrapError> {
        self.observer.step_entered(server, Step::Complete);
        lifecycle::mark_running(self.store.as_ref(), server).await?;
        self.observer.step_succeeded(server, Step::Complete);
        Ok(())
    }

    /// The single failure routine: report, then record `error` in the store.
    async fn fail(&self, server: &mut Server, failure: &StepFailure) -> Result<(), BootstrapError> {
        let message = failure.to_string();
        self.observer.step_failed(server, failure.step, &message);
        lifecycle::mark_error(self.store.as_ref(), server, &message).await
    }
}
