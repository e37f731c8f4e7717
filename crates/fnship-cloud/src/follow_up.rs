//! Post-create hooks
//!
//! Hooks run after the routing resource is settled on the create path, each
//! as its own step. Providers ship the hooks that make sense for them
//! (invoke permission, stage deployment); the CLI registers the ones the
//! operator enabled.

use crate::error::Result;
use crate::resource::{DeploymentTarget, RemoteResource};
use async_trait::async_trait;

/// What a hook gets to see
#[derive(Debug, Clone, Copy)]
pub struct ProvisionedFunction<'a> {
    pub target: &'a DeploymentTarget,
    pub function: &'a RemoteResource,
    pub routing: Option<&'a RemoteResource>,
}

#[async_trait]
pub trait FollowUp: Send + Sync {
    /// Stable id, used in settings
    fn id(&self) -> &str;

    /// Runs the hook. Returns the resource it created, if any.
    async fn run(&self, ctx: ProvisionedFunction<'_>) -> Result<Option<RemoteResource>>;
}
