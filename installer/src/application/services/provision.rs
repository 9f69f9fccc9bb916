//! Agent container provisioning on a reachable host: pull, create, start.
//!
//! Imports only from `crate::domain` and `crate::application`.

use std::future::Future;

use anyhow::Result;
use fleet_common::Server;
use futures::StreamExt;

use crate::application::context::InstallContext;
use crate::application::ports::{InstallObserver, RuntimeClient};
use crate::domain::{AGENT_CONTAINER_NAME, InstallConfig, Step, StepFailure, agent_container_spec};

/// Runs the provisioning steps for one server.
pub struct Provisioner<'a> {
    config: &'a InstallConfig,
    observer: &'a dyn InstallObserver,
}

impl<'a> Provisioner<'a> {
    #[must_use]
    pub fn new(config: &'a InstallConfig, observer: &'a dyn InstallObserver) -> Self {
        Self { config, observer }
    }

    /// Pull the agent image, then create and start the agent container.
    ///
    /// Steps run strictly in order; the first failure ends the sequence.
    /// Returns the id of the started container.
    ///
    /// # Errors
    ///
    /// Returns a [`StepFailure`] naming the step that failed, carrying the
    /// runtime's error (or the context error if the batch ended mid-step).
    pub async fn provision(
        &self,
        ctx: &InstallContext,
        client: &dyn RuntimeClient,
        server: &Server,
    ) -> Result<String, StepFailure> {
        self.step(ctx, server, Step::Pull, pull(client, &self.config.image))
            .await?;

        let spec = agent_container_spec(self.config, server);
        let id = self
            .step(
                ctx,
                server,
                Step::Create,
                client.create_container(&spec, AGENT_CONTAINER_NAME),
            )
            .await?;

        self.step(ctx, server, Step::Start, client.start_container(&id))
            .await?;
        Ok(id)
    }

    /// Report the step boundaries around `fut`, bounded by `ctx`.
    ///
    /// Failures are reported by the caller's error routine, not here.
    async fn step<T>(
        &self,
        ctx: &InstallContext,
        server: &Server,
        step: Step,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T, StepFailure> {
        self.observer.step_entered(server, step);
        let out = ctx
            .guard(fut)
            .await
            .map_err(|err| StepFailure::new(step, err))?
            .map_err(|err| StepFailure::new(step, err))?;
        self.observer.step_succeeded(server, step);
        Ok(out)
    }
}

/// Pull `image` and drain the whole progress stream.
///
/// Any error event fails the pull, but the stream is still read to its end
/// before it is closed.
async fn pull(client: &dyn RuntimeClient, image: &str) -> Result<()> {
    let mut stream = client.pull_image(image).await?;
    let mut first_err = None;
    while let Some(event) = stream.next().await {
        if let Err(err) = event {
            first_err.get_or_insert(err);
        }
    }
    drop(stream);
    first_err.map_or(Ok(()), Err)
}
