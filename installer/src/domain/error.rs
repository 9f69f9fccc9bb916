//! Typed installer error enums.
//!
//! Ports and services speak `anyhow::Result`; these types mark the failures
//! the orchestrator has to tell apart.

use std::fmt;

use fleet_common::{ServerState, TransitionError};
use thiserror::Error;

use crate::domain::step::Step;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Invalid or incomplete install configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ── Context errors ────────────────────────────────────────────────────────────

/// Why an install context stopped.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

// ── Step failures ─────────────────────────────────────────────────────────────

/// A bootstrap step failed.
///
/// Displays as the underlying error text alone so that it can be stored in the
/// server record unchanged; the step travels beside it.
#[derive(Debug)]
pub struct StepFailure {
    pub step: Step,
    pub error: anyhow::Error,
}

impl StepFailure {
    pub fn new(step: Step, error: impl Into<anyhow::Error>) -> Self {
        Self {
            step,
            error: error.into(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl std::error::Error for StepFailure {}

// ── Worker errors ─────────────────────────────────────────────────────────────

/// Failure that ends a worker without the server reaching its terminal state
/// in the store.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to record state {state} for server '{server}': {message}")]
    Store {
        server: String,
        state: ServerState,
        message: String,
    },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
