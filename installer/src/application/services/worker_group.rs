//! Tracks fire-and-forget bootstrap workers so callers can await them.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;

/// Set of spawned workers.
///
/// A worker counts as active until its future has completed or panicked.
/// Spawning never blocks. Dropping the group detaches running workers; it
/// does not abort them.
#[derive(Debug)]
pub struct WorkerGroup {
    in_flight: Arc<watch::Sender<usize>>,
}

/// Holds one slot of the in-flight count; released on drop, unwinding
/// included.
struct Slot(Arc<watch::Sender<usize>>);

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Default for WorkerGroup {
    fn default() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            in_flight: Arc::new(tx),
        }
    }
}

impl WorkerGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `worker` on the current runtime and track it.
    pub fn spawn<F>(&self, worker: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.in_flight.send_modify(|n| *n += 1);
        let slot = Slot(Arc::clone(&self.in_flight));
        tokio::spawn(async move {
            let _slot = slot;
            if AssertUnwindSafe(worker).catch_unwind().await.is_err() {
                tracing::error!("bootstrap worker panicked");
            }
        });
    }

    /// Number of workers that have not finished yet.
    #[must_use]
    pub fn active(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Resolve once every tracked worker has finished, including workers
    /// spawned while waiting. Any number of callers may wait at once.
    pub async fn wait(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives as long as `self`, so this only ends at zero.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}
