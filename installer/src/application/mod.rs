//! Application layer: port traits, the install context, and services.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`.

pub mod context;
pub mod ports;
pub mod services;

pub use context::{CancelHandle, InstallContext};
pub use ports::{
    ClientFactory, ContainerSummary, InstallObserver, NoopObserver, PullEvent, PullStream,
    RuntimeClient, ServerStore,
};
pub use services::install::Installer;
