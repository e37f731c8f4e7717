pub mod check;
pub mod config;
pub mod deploy;

use colored::Colorize;
use fnship_cloud::{FollowUp, FunctionProvider, ProcessRunner, WaitPolicy};
use fnship_cloud_aws::{AwsLambdaProvider, AwsOptions, FOLLOW_UP_IDS};
use fnship_cloud_gcp::{GcpFunctionProvider, GcpOptions};
use fnship_config::{DeploymentType, Settings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Process-wide state shared by commands
pub struct Context {
    pub verbose: bool,
    pub cancel: CancellationToken,
}

/// The provider picked for this invocation
pub enum SelectedProvider {
    Aws(AwsLambdaProvider),
    Gcp(GcpFunctionProvider),
}

impl SelectedProvider {
    pub fn new(kind: DeploymentType, settings: &Settings, ctx: &Context) -> Self {
        let runner = Arc::new(
            ProcessRunner::new()
                .verbose(ctx.verbose)
                .with_cancellation(ctx.cancel.clone()),
        );

        match kind {
            DeploymentType::AwsLambda => Self::Aws(AwsLambdaProvider::new(
                runner,
                AwsOptions {
                    region: settings.region.clone(),
                    rest_api_id: settings.rest_api_id.clone(),
                },
            )),
            DeploymentType::GoogleCloudFunction => {
                let mut wait = WaitPolicy::default();
                if let Some(timeout) = settings.wait_timeout() {
                    wait = wait.with_max_duration(timeout);
                }
                Self::Gcp(GcpFunctionProvider::new(
                    runner,
                    GcpOptions {
                        project: settings.gcp_project.clone(),
                        region: settings.region.clone(),
                        wait,
                        cancel: ctx.cancel.clone(),
                    },
                ))
            }
        }
    }

    pub fn as_provider(&self) -> &dyn FunctionProvider {
        match self {
            Self::Aws(provider) => provider,
            Self::Gcp(provider) => provider,
        }
    }

    /// Resolve the configured follow-up ids into hooks
    pub fn follow_ups(&self, ids: &[String]) -> anyhow::Result<Vec<Box<dyn FollowUp>>> {
        match self {
            Self::Aws(provider) => ids
                .iter()
                .map(|id| {
                    provider.follow_up(id).ok_or_else(|| {
                        anyhow::anyhow!(
                            "Unknown follow-up '{}' (known: {})",
                            id,
                            FOLLOW_UP_IDS.join(", ")
                        )
                    })
                })
                .collect(),
            Self::Gcp(provider) => {
                if !ids.is_empty() {
                    println!(
                        "{} {} has no follow-ups; ignoring: {}",
                        "⚠".yellow(),
                        provider.display_name(),
                        ids.join(", ")
                    );
                }
                Ok(Vec::new())
            }
        }
    }
}
