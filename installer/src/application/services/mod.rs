//! Application services: the installer use-cases.
//!
//! Each service composes domain logic with port trait calls and imports only
//! from `crate::domain` and `crate::application`.

pub mod install;
pub mod lifecycle;
pub mod probe;
pub mod provision;
pub mod worker_group;
