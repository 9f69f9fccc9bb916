//! Fleet agent installer library: turns freshly created servers into running
//! agent hosts.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod domain;
pub mod infra;
