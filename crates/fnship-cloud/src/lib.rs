//! fnship deployment orchestrator
//!
//! This crate decides, for each deploy, whether a serverless function already
//! exists, takes the create or update path, provisions the supporting
//! resources that are missing and waits for the function to converge.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   fnship CLI                     │
//! │                 (fnship deploy)                  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 fnship-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Deployer (provisioning sequence)         │   │
//! │  │  trait FunctionProvider { ... }           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │  probing   │ │  resolve   │ │    wait    │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  CommandRunner (external CLIs)            │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  aws-lambda   │ │ google-cloud- │
//! │   provider    │ │   function    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod command;
pub mod deploy;
pub mod error;
pub mod events;
pub mod follow_up;
pub mod probe;
pub mod prompt;
pub mod provider;
pub mod resolve;
pub mod resource;
pub mod wait;

// Re-exports
pub use command::{Capture, CommandRunner, NOT_FOUND_EXIT_CODE, ProcessRunner};
pub use deploy::{Deployer, ProvisioningOutcome, ProvisioningPath, Step};
pub use error::{CloudError, Result};
pub use events::{DeployEvent, DeployEventSink, NoopEventSink};
pub use follow_up::{FollowUp, ProvisionedFunction};
pub use prompt::{AssumeYes, Prompter};
pub use provider::{FunctionProvider, Provisioned, RoutingResolution};
pub use resolve::{NONE_OF_THESE, Resolution, resolve};
pub use resource::{CandidateSet, DeploymentTarget, Existence, RemoteResource, ResourceKind};
pub use wait::{PollStatus, WaitCondition, WaitPolicy, poll_until};
