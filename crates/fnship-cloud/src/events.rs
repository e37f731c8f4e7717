//! Deploy progress events
//!
//! The deployer reports what it is doing through a [`DeployEventSink`], so
//! the CLI can render progress without the orchestrator printing anything.

use crate::deploy::{ProvisioningPath, Step};
use crate::resource::RemoteResource;
use std::time::Duration;

/// Event emitted during a deploy
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// Deploy started
    Started { target: String, provider: String },

    /// A step is about to run
    StepStarted { step: Step },

    /// A step completed
    StepFinished {
        step: Step,
        detail: Option<String>,
        duration: Duration,
    },

    /// A step failed; the deploy stops here
    StepFailed {
        step: Step,
        error: String,
        left_behind: Vec<RemoteResource>,
    },

    /// Deploy completed
    Completed {
        path: ProvisioningPath,
        function: String,
        duration: Duration,
    },
}

/// Receives deploy events
pub trait DeployEventSink: Send + Sync {
    fn on_event(&self, event: DeployEvent);
}

/// Silent sink
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {}
}
