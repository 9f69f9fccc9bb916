//! fleet-installer entry point.
//!
//! Initialises tracing, loads configuration from `FLEET_*` environment
//! variables, installs the agent on every server still in `created`, and
//! exits once every bootstrap worker has finished.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use fleet_installer::application::{InstallContext, Installer};
use fleet_installer::infra::{DockerClientFactory, JsonServerStore, TracingObserver, load_settings};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialise tracing with RUST_LOG env filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load configuration from FLEET_* env vars.
    let settings = load_settings()?;

    tracing::info!(
        image = %settings.install.image,
        rpc_server = %settings.install.rpc_server(),
        store = %settings.store_path.display(),
        docker_port = settings.docker_port,
        install_timeout_secs = settings.install_timeout.as_secs(),
        "configuration loaded",
    );

    // 3. Wire adapters into the orchestrator.
    let store = Arc::new(JsonServerStore::new(settings.store_path.clone()));
    let clients = Arc::new(DockerClientFactory::new(
        settings.docker_port,
        settings.docker_timeout,
    ));
    let installer = Installer::new(settings.install, store, clients, Arc::new(TracingObserver));

    // 4. Stage and launch one worker per created server under the batch deadline.
    let ctx = InstallContext::background().with_timeout(settings.install_timeout);
    let launched = installer
        .install(&ctx)
        .await
        .context("install batch failed")?;
    tracing::info!(servers = launched, "install workers launched");

    // 5. Wait for every worker to reach a terminal state.
    installer.wait().await;
    tracing::info!("install batch finished");
    Ok(())
}
