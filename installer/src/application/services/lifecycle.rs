//! Persisted lifecycle transitions.
//!
//! Each transition is applied to a copy of the record, written to the store,
//! and only then copied back to the caller's record. A failed write leaves
//! the caller's record as it was.

use fleet_common::{Server, TransitionError};

use crate::application::ports::ServerStore;
use crate::domain::BootstrapError;

/// `created` -> `staging`.
///
/// # Errors
///
/// Returns an error if the transition is illegal or the store update fails.
pub async fn stage(store: &dyn ServerStore, server: &mut Server) -> Result<(), BootstrapError> {
    commit(store, server, Server::stage).await
}

/// `staging` -> `running`.
///
/// # Errors
///
/// Returns an error if the transition is illegal or the store update fails.
pub async fn mark_running(
    store: &dyn ServerStore,
    server: &mut Server,
) -> Result<(), BootstrapError> {
    commit(store, server, Server::mark_running).await
}

/// `staging` -> `error`, recording `message`.
///
/// # Errors
///
/// Returns an error if the transition is illegal or the store update fails.
pub async fn mark_error(
    store: &dyn ServerStore,
    server: &mut Server,
    message: &str,
) -> Result<(), BootstrapError> {
    commit(store, server, |next| next.mark_error(message)).await
}

async fn commit(
    store: &dyn ServerStore,
    server: &mut Server,
    apply: impl FnOnce(&mut Server) -> Result<(), TransitionError>,
) -> Result<(), BootstrapError> {
    let mut next = server.clone();
    apply(&mut next)?;
    store
        .update(&next)
        .await
        .map_err(|err| BootstrapError::Store {
            server: next.name.clone(),
            state: next.state(),
            message: format!("{err:#}"),
        })?;
    *server = next;
    Ok(())
}
