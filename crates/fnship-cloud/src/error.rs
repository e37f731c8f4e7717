//! Orchestrator error types

use crate::deploy::Step;
use crate::resource::RemoteResource;
use crate::wait::WaitCondition;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the deployment orchestrator and its providers
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("`{program}` is not installed or not on PATH. {hint}")]
    ToolNotFound { program: String, hint: String },

    #[error("`{program}` failed ({}){}", exit_label(.exit_code), stderr_suffix(.stderr))]
    ExecutionFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The not-found exit sentinel. Probes turn this into `false`; anywhere
    /// else it is a service error and `stderr` carries the service's message.
    #[error("`{program}` reported a service error (exit status 254){}", stderr_suffix(.stderr))]
    NotFound { program: String, stderr: String },

    #[error("Malformed response from `{command}`: {reason}")]
    MalformedResponse { command: String, reason: String },

    #[error("Aborted by user")]
    UserAborted,

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Timed out after {}s waiting for {condition}", whole_secs(.elapsed))]
    WaitTimeout {
        condition: WaitCondition,
        elapsed: Duration,
    },

    #[error("{resource} entered a failed state: {status}")]
    ResourceFailed { resource: String, status: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A step created `resource` before failing. The sequencer reports the
    /// resource in `left_behind` and surfaces `source`.
    #[error("{source}")]
    Incomplete {
        resource: RemoteResource,
        source: Box<CloudError>,
    },

    #[error("{step} failed: {source}")]
    StepFailed {
        step: Step,
        /// Resources created earlier in the same invocation. They are not rolled back.
        left_behind: Vec<RemoteResource>,
        source: Box<CloudError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    pub fn malformed(command: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        CloudError::MalformedResponse {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound { .. })
    }

    /// Wrap `source`, recording that `resource` was created first
    pub fn incomplete(resource: RemoteResource, source: CloudError) -> Self {
        CloudError::Incomplete {
            resource,
            source: Box::new(source),
        }
    }

    /// The step a failure is attributed to, if it was raised by the sequencer
    pub fn failed_step(&self) -> Option<&Step> {
        match self {
            CloudError::StepFailed { step, .. } => Some(step),
            _ => None,
        }
    }

    /// The innermost error, with step attribution stripped
    pub fn root(&self) -> &CloudError {
        match self {
            CloudError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status".to_string(),
    }
}

fn whole_secs(elapsed: &Duration) -> u64 {
    elapsed.as_secs()
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
