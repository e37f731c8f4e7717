//! Google Cloud Functions provider implementation

use crate::gcloud::Gcloud;
use async_trait::async_trait;
use fnship_cloud::command::ensure_installed;
use fnship_cloud::{
    CommandRunner, DeploymentTarget, FunctionProvider, Prompter, Provisioned, RemoteResource,
    ResourceKind, Result, RoutingResolution, WaitCondition, WaitPolicy, poll_until,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const INSTALL_HINT: &str = "Install the Google Cloud SDK: https://cloud.google.com/sdk/docs/install";

/// Shown when no service account is configured
const DEFAULT_IDENTITY: &str = "default service account";

/// Provider settings
#[derive(Debug, Clone, Default)]
pub struct GcpOptions {
    pub project: Option<String>,
    pub region: Option<String>,
    pub wait: WaitPolicy,
    pub cancel: CancellationToken,
}

/// Google Cloud Functions provider
pub struct GcpFunctionProvider {
    cli: Gcloud,
    wait: WaitPolicy,
    cancel: CancellationToken,
}

impl GcpFunctionProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, options: GcpOptions) -> Self {
        Self {
            cli: Gcloud::new(runner, options.project, options.region),
            wait: options.wait,
            cancel: options.cancel,
        }
    }

    fn function(target: &DeploymentTarget) -> RemoteResource {
        RemoteResource::present(ResourceKind::Function, &target.name, None)
    }
}

#[async_trait]
impl FunctionProvider for GcpFunctionProvider {
    fn name(&self) -> &str {
        "google-cloud-function"
    }

    fn display_name(&self) -> &str {
        "Google Cloud Function"
    }

    async fn check_cli(&self) -> Result<()> {
        ensure_installed(self.cli.runner(), "gcloud", "--version", INSTALL_HINT).await
    }

    async fn probe_function(&self, target: &DeploymentTarget) -> Result<RemoteResource> {
        Ok(if self.cli.function_exists(&target.name).await? {
            Self::function(target)
        } else {
            RemoteResource::absent(ResourceKind::Function, &target.name)
        })
    }

    async fn ensure_identity(&self, target: &DeploymentTarget) -> Result<Provisioned> {
        let identity = match &target.execution_role {
            Some(account) => RemoteResource::present(
                ResourceKind::ExecutionIdentity,
                account,
                Some(account.clone()),
            ),
            None => RemoteResource::present(ResourceKind::ExecutionIdentity, DEFAULT_IDENTITY, None),
        };
        Ok(Provisioned::existing(identity))
    }

    async fn create_function(
        &self,
        target: &DeploymentTarget,
        identity: &RemoteResource,
    ) -> Result<RemoteResource> {
        self.cli
            .deploy(target, identity.remote_id.as_deref())
            .await?;
        Ok(Self::function(target))
    }

    async fn update_function_code(&self, target: &DeploymentTarget) -> Result<RemoteResource> {
        self.cli
            .deploy(target, target.execution_role.as_deref())
            .await?;
        Ok(Self::function(target))
    }

    async fn ensure_routing(
        &self,
        _target: &DeploymentTarget,
        _function: &RemoteResource,
        _prompter: &dyn Prompter,
    ) -> Result<Option<RoutingResolution>> {
        // HTTP-triggered functions get their own URL
        Ok(None)
    }

    async fn wait(&self, condition: WaitCondition, target: &DeploymentTarget) -> Result<()> {
        poll_until(&self.wait, &self.cancel, condition, &target.name, || {
            self.cli.status(&target.name)
        })
        .await
    }
}
