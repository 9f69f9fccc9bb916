//! Domain layer: pure installer logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, or `std::net`. All functions are synchronous and take
//! data in, returning data out.

pub mod config;
pub mod container;
pub mod error;
pub mod step;
pub mod volume;

pub use config::{InstallConfig, RunnerConfig};
pub use container::{AGENT_CONTAINER_NAME, ContainerSpec, RestartPolicy, agent_container_spec};
pub use error::{BootstrapError, ConfigError, ContextError, StepFailure};
pub use step::Step;
pub use volume::{dedup_binds, split_volume_parts, to_bind_set};
