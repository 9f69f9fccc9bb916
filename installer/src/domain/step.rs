//! Named bootstrap steps, reported at every step boundary.

use std::fmt;

/// One step of a server bootstrap, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Persist `created` -> `staging`.
    Stage,
    /// Build the runtime client for the server's address.
    Connect,
    /// Wait for the runtime API to answer.
    Probe,
    /// Pull the agent image.
    Pull,
    /// Create the agent container.
    Create,
    /// Start the agent container.
    Start,
    /// Persist `staging` -> `running`.
    Complete,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Connect => "connect",
            Self::Probe => "probe",
            Self::Pull => "pull",
            Self::Create => "create",
            Self::Start => "start",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
