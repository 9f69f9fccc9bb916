//! JSON-file implementation of the `ServerStore` port.
//!
//! The whole fleet lives in one file holding an array of server records.
//! Reads and writes run on the blocking pool; writes are atomic (temp file +
//! rename) and serialised through an async mutex so concurrent workers never
//! lose each other's updates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fleet_common::{Server, ServerState};
use tokio::sync::Mutex;

use crate::application::ports::ServerStore;

/// Server records persisted as a JSON array.
pub struct JsonServerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonServerStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file's contents with `servers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_all(&self, servers: Vec<Server>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_sync(&path, &servers))
            .await
            .context("server store write task panicked")?
    }

    async fn load_all(&self) -> Result<Vec<Server>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_sync(&path))
            .await
            .context("server store read task panicked")?
    }
}

#[async_trait]
impl ServerStore for JsonServerStore {
    async fn list_state(&self, state: ServerState) -> Result<Vec<Server>> {
        let _guard = self.lock.lock().await;
        let mut servers = self.load_all().await?;
        servers.retain(|s| s.state() == state);
        Ok(servers)
    }

    async fn update(&self, server: &Server) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut servers = self.load_all().await?;
        let slot = servers
            .iter_mut()
            .find(|s| s.id == server.id)
            .with_context(|| format!("server '{}' not found", server.id))?;
        *slot = server.clone();

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_sync(&path, &servers))
            .await
            .context("server store write task panicked")?
    }
}

/// A missing file is an empty fleet.
fn load_sync(path: &Path) -> Result<Vec<Server>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading server store {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content)
        .with_context(|| format!("parsing server store {}", path.display()))
}

fn save_sync(path: &Path, servers: &[Server]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(servers).context("serializing servers")?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &content)
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
    }

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("finalizing server store {}", path.display()))?;
    Ok(())
}
