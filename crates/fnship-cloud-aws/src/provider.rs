//! AWS Lambda provider implementation

use crate::archive;
use crate::awscli::{AwsCli, BASIC_EXECUTION_POLICY_ARN};
use crate::follow_up::{InvokePermission, StageDeployment};
use async_trait::async_trait;
use fnship_cloud::command::ensure_installed;
use fnship_cloud::{
    CloudError, DeploymentTarget, FollowUp, FunctionProvider, Prompter, Provisioned, RemoteResource,
    Resolution, ResourceKind, Result, RoutingResolution, WaitCondition, resolve,
};
use std::sync::Arc;

/// Name of the execution role fnship creates when none is configured
pub const EXECUTION_ROLE_NAME: &str = "fnship-lambda-execution";

/// Name of the REST API fnship creates
pub const REST_API_NAME: &str = "fnship-apigateway";

const INSTALL_HINT: &str = "Install the AWS CLI: https://aws.amazon.com/cli/";

/// Provider settings
#[derive(Debug, Clone, Default)]
pub struct AwsOptions {
    pub region: Option<String>,
    /// REST API chosen by an earlier deploy
    pub rest_api_id: Option<String>,
}

/// AWS Lambda provider
pub struct AwsLambdaProvider {
    cli: AwsCli,
    rest_api_id: Option<String>,
}

impl AwsLambdaProvider {
    pub fn new(runner: Arc<dyn fnship_cloud::CommandRunner>, options: AwsOptions) -> Self {
        Self {
            cli: AwsCli::new(runner, options.region),
            rest_api_id: options.rest_api_id,
        }
    }

    /// Follow-up hook by id
    pub fn follow_up(&self, id: &str) -> Option<Box<dyn FollowUp>> {
        match id {
            InvokePermission::ID => Some(Box::new(InvokePermission::new(self.cli.clone()))),
            StageDeployment::ID => Some(Box::new(StageDeployment::new(self.cli.clone()))),
            _ => None,
        }
    }

    /// Reuse the saved REST API if it still exists
    async fn saved_rest_api(&self) -> Result<Option<RemoteResource>> {
        let Some(id) = self.rest_api_id.as_deref() else {
            return Ok(None);
        };
        if self.cli.rest_api_exists(id).await? {
            tracing::info!("Reusing REST API {}", id);
            Ok(Some(RemoteResource::present(
                ResourceKind::RoutingResource,
                id,
                Some(id.to_string()),
            )))
        } else {
            tracing::warn!("Saved REST API {} no longer exists, choosing again", id);
            Ok(None)
        }
    }
}

/// Ids of the hooks [`AwsLambdaProvider::follow_up`] knows
pub const FOLLOW_UP_IDS: &[&str] = &[InvokePermission::ID, StageDeployment::ID];

#[async_trait]
impl FunctionProvider for AwsLambdaProvider {
    fn name(&self) -> &str {
        "aws-lambda"
    }

    fn display_name(&self) -> &str {
        "AWS Lambda"
    }

    async fn check_cli(&self) -> Result<()> {
        ensure_installed(self.cli.runner(), "aws", "--version", INSTALL_HINT).await
    }

    async fn probe_function(&self, target: &DeploymentTarget) -> Result<RemoteResource> {
        let exists = self.cli.function_exists(&target.name).await?;
        Ok(if exists {
            RemoteResource::present(ResourceKind::Function, &target.name, None)
        } else {
            RemoteResource::absent(ResourceKind::Function, &target.name)
        })
    }

    async fn ensure_identity(&self, target: &DeploymentTarget) -> Result<Provisioned> {
        if let Some(role) = &target.execution_role {
            return Ok(Provisioned::existing(RemoteResource::present(
                ResourceKind::ExecutionIdentity,
                role,
                Some(role.clone()),
            )));
        }

        if let Some(arn) = self.cli.get_role_arn(EXECUTION_ROLE_NAME).await? {
            // An earlier deploy may have stopped between create-role and the attach
            self.cli
                .attach_role_policy(EXECUTION_ROLE_NAME, BASIC_EXECUTION_POLICY_ARN)
                .await?;
            return Ok(Provisioned::existing(RemoteResource::present(
                ResourceKind::ExecutionIdentity,
                EXECUTION_ROLE_NAME,
                Some(arn),
            )));
        }

        tracing::info!("Creating execution role {}", EXECUTION_ROLE_NAME);
        let arn = self.cli.create_role(EXECUTION_ROLE_NAME).await?;
        let role =
            RemoteResource::present(ResourceKind::ExecutionIdentity, EXECUTION_ROLE_NAME, Some(arn));
        if let Err(err) = self
            .cli
            .attach_role_policy(EXECUTION_ROLE_NAME, BASIC_EXECUTION_POLICY_ARN)
            .await
        {
            return Err(CloudError::incomplete(role, err));
        }
        Ok(Provisioned::created(role))
    }

    async fn create_function(
        &self,
        target: &DeploymentTarget,
        identity: &RemoteResource,
    ) -> Result<RemoteResource> {
        let archive = archive::package(&target.source_dir)?;
        tracing::debug!("Deployment archive has {} files", archive.entries());
        self.cli
            .create_function(target, identity.id_or_name(), &archive)
            .await?;
        Ok(RemoteResource::present(
            ResourceKind::Function,
            &target.name,
            None,
        ))
    }

    async fn update_function_code(&self, target: &DeploymentTarget) -> Result<RemoteResource> {
        let archive = archive::package(&target.source_dir)?;
        self.cli.update_function_code(&target.name, &archive).await?;
        Ok(RemoteResource::present(
            ResourceKind::Function,
            &target.name,
            None,
        ))
    }

    async fn ensure_routing(
        &self,
        _target: &DeploymentTarget,
        _function: &RemoteResource,
        prompter: &dyn Prompter,
    ) -> Result<Option<RoutingResolution>> {
        if let Some(api) = self.saved_rest_api().await? {
            return Ok(Some(RoutingResolution::Reused(api)));
        }

        let candidates = self.cli.list_rest_apis(REST_API_NAME).await?;
        let resolution = resolve(&candidates, "AWS REST API", prompter, || async {
            tracing::info!("Creating REST API {}", REST_API_NAME);
            self.cli.create_rest_api(REST_API_NAME).await
        })
        .await?;

        let resolved = match resolution {
            Resolution::Selected(id) => {
                let name = candidates.name_of(&id).unwrap_or(id.as_str()).to_string();
                RoutingResolution::Selected(RemoteResource::present(
                    ResourceKind::RoutingResource,
                    name,
                    Some(id),
                ))
            }
            Resolution::Created(id) => RoutingResolution::Created(RemoteResource::present(
                ResourceKind::RoutingResource,
                REST_API_NAME,
                Some(id),
            )),
        };
        Ok(Some(resolved))
    }

    async fn wait(&self, condition: WaitCondition, target: &DeploymentTarget) -> Result<()> {
        self.cli.wait(condition, &target.name).await
    }
}
