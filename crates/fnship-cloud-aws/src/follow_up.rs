//! Post-create hooks for Lambda behind API Gateway

use crate::awscli::AwsCli;
use async_trait::async_trait;
use fnship_cloud::{FollowUp, ProvisionedFunction, RemoteResource, ResourceKind, Result};

/// Stage every REST API deployment goes to
pub const DEFAULT_STAGE: &str = "prod";

/// Grants API Gateway permission to invoke the new function
pub struct InvokePermission {
    cli: AwsCli,
}

impl InvokePermission {
    pub const ID: &'static str = "invoke-permission";
    const STATEMENT_ID: &'static str = "fnship-apigateway-invoke";

    pub fn new(cli: AwsCli) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl FollowUp for InvokePermission {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, ctx: ProvisionedFunction<'_>) -> Result<Option<RemoteResource>> {
        if ctx.routing.is_none() {
            tracing::debug!("No REST API, skipping invoke permission");
            return Ok(None);
        }
        self.cli
            .add_invoke_permission(&ctx.function.name, Self::STATEMENT_ID)
            .await?;
        Ok(None)
    }
}

/// Deploys the REST API to the `prod` stage
pub struct StageDeployment {
    cli: AwsCli,
    stage: String,
}

impl StageDeployment {
    pub const ID: &'static str = "stage-deployment";

    pub fn new(cli: AwsCli) -> Self {
        Self {
            cli,
            stage: DEFAULT_STAGE.to_string(),
        }
    }
}

#[async_trait]
impl FollowUp for StageDeployment {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, ctx: ProvisionedFunction<'_>) -> Result<Option<RemoteResource>> {
        let Some(api_id) = ctx.routing.and_then(|r| r.remote_id.as_deref()) else {
            tracing::debug!("No REST API, skipping stage deployment");
            return Ok(None);
        };
        let deployment_id = self.cli.create_deployment(api_id, &self.stage).await?;
        Ok(Some(RemoteResource::present(
            ResourceKind::RoutingResource,
            format!("{} stage {}", api_id, self.stage),
            Some(deployment_id),
        )))
    }
}
