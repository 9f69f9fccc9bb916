//! Infrastructure layer: concrete implementations of the application ports.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.

pub mod config;
pub mod docker;
pub mod observer;
pub mod store;

pub use config::{Settings, load_settings};
pub use docker::{DockerClient, DockerClientFactory};
pub use observer::TracingObserver;
pub use store::JsonServerStore;
