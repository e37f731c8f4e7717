//! Shared test utilities for fnship tests.
//!
//! This crate provides:
//! - [`ScriptedRunner`]: a command runner that replays canned replies and
//!   records every invocation
//! - [`ScriptedPrompter`]: answers prompts from a queue
//! - [`RecordingProvider`]: a provider that records capability calls
//! - Fixture builders for targets and JSON bodies

// Panics are acceptable in test helpers
#![allow(clippy::unwrap_used)]

pub mod fixtures;
pub mod prompter;
pub mod provider;
pub mod runner;

pub use fixtures::*;
pub use prompter::*;
pub use provider::*;
pub use runner::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::new("fnship=debug"))
        .with_test_writer()
        .try_init();
}
