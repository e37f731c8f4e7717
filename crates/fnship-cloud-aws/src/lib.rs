//! AWS Lambda provider for fnship
//!
//! This crate implements the FunctionProvider trait for AWS Lambda, with an
//! API Gateway REST API as the HTTP front door.
//!
//! # Features
//!
//! - Function create/update from a zipped project directory
//! - Execution role discovery and creation (IAM)
//! - REST API reuse, selection or creation
//! - Follow-up hooks: invoke permission, stage deployment
//!
//! # Requirements
//!
//! - `aws` CLI must be installed and configured
//! - Credentials and default region come from the aws CLI configuration
//!
//! # Example
//!
//! ```ignore
//! use fnship_cloud::{Deployer, ProcessRunner};
//! use fnship_cloud_aws::{AwsLambdaProvider, AwsOptions};
//! use std::sync::Arc;
//!
//! let provider = AwsLambdaProvider::new(Arc::new(ProcessRunner::new()), AwsOptions::default());
//! let outcome = Deployer::new(&provider, &prompter).deploy(&target).await?;
//! ```

pub mod archive;
pub mod awscli;
pub mod follow_up;
pub mod provider;

pub use archive::{DeploymentArchive, package};
pub use awscli::AwsCli;
pub use follow_up::{InvokePermission, StageDeployment};
pub use provider::{
    AwsLambdaProvider, AwsOptions, EXECUTION_ROLE_NAME, FOLLOW_UP_IDS, REST_API_NAME,
};
