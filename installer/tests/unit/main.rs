//! Unit tests for the fleet installer services.
//!
//! These tests use in-memory stores and scripted runtime clients and run
//! without network access. Timing-sensitive tests run on tokio's paused clock.

mod connectivity_service;
mod provision_service;
