//! Function provider trait definition

use crate::error::Result;
use crate::prompt::Prompter;
use crate::resource::{DeploymentTarget, RemoteResource};
use crate::wait::WaitCondition;
use async_trait::async_trait;

/// Serverless function provider abstraction
///
/// Each capability is one edge of the provisioning sequence. Implementations
/// talk to the cloud only through a [`CommandRunner`](crate::CommandRunner)
/// and hold no mutable state, so one provider can serve parallel deploys.
#[async_trait]
pub trait FunctionProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws-lambda")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check that the provider CLI is installed
    async fn check_cli(&self) -> Result<()>;

    /// Probe whether the target function exists
    async fn probe_function(&self, target: &DeploymentTarget) -> Result<RemoteResource>;

    /// Find or create the identity the function executes as
    async fn ensure_identity(&self, target: &DeploymentTarget) -> Result<Provisioned>;

    /// Create the function running as `identity`
    async fn create_function(
        &self,
        target: &DeploymentTarget,
        identity: &RemoteResource,
    ) -> Result<RemoteResource>;

    /// Ship new code to an existing function
    async fn update_function_code(&self, target: &DeploymentTarget) -> Result<RemoteResource>;

    /// Find, choose or create the HTTP routing resource.
    ///
    /// `None` when the provider has no account-scoped routing resource.
    async fn ensure_routing(
        &self,
        target: &DeploymentTarget,
        function: &RemoteResource,
        prompter: &dyn Prompter,
    ) -> Result<Option<RoutingResolution>>;

    /// Block until the function satisfies `condition`
    async fn wait(&self, condition: WaitCondition, target: &DeploymentTarget) -> Result<()>;
}

/// A resource that was found or created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub resource: RemoteResource,
    /// Created during this deploy
    pub created: bool,
}

impl Provisioned {
    pub fn existing(resource: RemoteResource) -> Self {
        Self {
            resource,
            created: false,
        }
    }

    pub fn created(resource: RemoteResource) -> Self {
        Self {
            resource,
            created: true,
        }
    }
}

/// How the routing resource was settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingResolution {
    /// The previously saved id still exists
    Reused(RemoteResource),
    /// The operator picked an existing resource
    Selected(RemoteResource),
    /// A new resource was created
    Created(RemoteResource),
}

impl RoutingResolution {
    pub fn resource(&self) -> &RemoteResource {
        match self {
            Self::Reused(r) | Self::Selected(r) | Self::Created(r) => r,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Id worth saving for the next deploy (not needed when reused)
    pub fn newly_chosen_id(&self) -> Option<&str> {
        match self {
            Self::Reused(_) => None,
            Self::Selected(r) | Self::Created(r) => r.remote_id.as_deref(),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Reused(_) => "reused",
            Self::Selected(_) => "selected",
            Self::Created(_) => "created",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn api(id: &str) -> RemoteResource {
        RemoteResource::present(ResourceKind::RoutingResource, "fnship-apigateway", Some(id.to_string()))
    }

    #[test]
    fn test_newly_chosen_id() {
        assert_eq!(RoutingResolution::Reused(api("a")).newly_chosen_id(), None);
        assert_eq!(RoutingResolution::Selected(api("b")).newly_chosen_id(), Some("b"));
        assert_eq!(RoutingResolution::Created(api("c")).newly_chosen_id(), Some("c"));
        assert!(RoutingResolution::Created(api("c")).was_created());
    }
}
