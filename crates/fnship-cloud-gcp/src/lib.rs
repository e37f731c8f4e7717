//! Google Cloud Functions provider for fnship
//!
//! This crate implements the FunctionProvider trait for HTTP-triggered
//! Google Cloud Functions.
//!
//! # Requirements
//!
//! - `gcloud` CLI must be installed and authenticated
//! - Project and region fall back to the gcloud configuration when unset
//!
//! gcloud has no wait primitive for functions, so convergence is polled with
//! exponential backoff (see [`fnship_cloud::poll_until`]).

pub mod gcloud;
pub mod provider;

pub use gcloud::Gcloud;
pub use provider::{GcpFunctionProvider, GcpOptions};
