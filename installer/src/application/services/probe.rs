//! Connectivity probe against a freshly booted host's container runtime.

use std::time::Duration;

use fleet_common::Server;

use crate::application::context::InstallContext;
use crate::application::ports::{InstallObserver, RuntimeClient};
use crate::domain::ContextError;

/// Delay between probe attempts after the first.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(60);

/// Wait until the runtime on `server` answers a container listing.
///
/// The first attempt runs immediately, later attempts every
/// [`PROBE_INTERVAL`]. Listing errors are retried without limit; only the
/// context ends the loop early.
///
/// # Errors
///
/// Returns the context error once `ctx` is cancelled or past its deadline.
pub async fn probe(
    ctx: &InstallContext,
    client: &dyn RuntimeClient,
    server: &Server,
    observer: &dyn InstallObserver,
) -> Result<(), ContextError> {
    let mut delay = Duration::ZERO;
    loop {
        tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            () = tokio::time::sleep(delay) => {}
        }
        delay = PROBE_INTERVAL;

        match ctx.guard(client.list_containers()).await? {
            Ok(_) => return Ok(()),
            Err(err) => observer.probe_retry(server, &format!("{err:#}"), delay),
        }
    }
}
