//! `InstallObserver` that writes structured `tracing` events.

use std::time::Duration;

use fleet_common::Server;

use crate::application::ports::InstallObserver;
use crate::domain::Step;

/// Logs every step boundary with the server's name and address.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl InstallObserver for TracingObserver {
    fn step_entered(&self, server: &Server, step: Step) {
        tracing::debug!(server = %server.name, ip = %server.address, %step, "step started");
    }

    fn step_succeeded(&self, server: &Server, step: Step) {
        match step {
            Step::Stage => {
                tracing::debug!(server = %server.name, ip = %server.address, "server staged");
            }
            Step::Probe => {
                tracing::info!(server = %server.name, ip = %server.address, "runtime reachable");
            }
            Step::Pull => {
                tracing::debug!(server = %server.name, ip = %server.address, "agent image pulled");
            }
            Step::Start => {
                tracing::debug!(
                    server = %server.name,
                    ip = %server.address,
                    "agent container started"
                );
            }
            Step::Complete => {
                tracing::info!(server = %server.name, ip = %server.address, "agent installed");
            }
            Step::Connect | Step::Create => {
                tracing::debug!(
                    server = %server.name,
                    ip = %server.address,
                    %step,
                    "step finished"
                );
            }
        }
    }

    fn step_failed(&self, server: &Server, step: Step, error: &str) {
        tracing::error!(
            server = %server.name,
            ip = %server.address,
            %step,
            error,
            "install step failed"
        );
    }

    fn probe_retry(&self, server: &Server, error: &str, delay: Duration) {
        tracing::debug!(
            server = %server.name,
            ip = %server.address,
            error,
            retry_in_secs = delay.as_secs(),
            "runtime not reachable yet",
        );
    }
}
