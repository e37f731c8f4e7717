//! gcloud CLI wrapper
//!
//! Wraps the `gcloud functions` commands used for Google Cloud Functions.

use fnship_cloud::probe;
use fnship_cloud::{CommandRunner, DeploymentTarget, PollStatus, Result};
use std::sync::Arc;

const PROGRAM: &str = "gcloud";

/// gcloud CLI wrapper
#[derive(Clone)]
pub struct Gcloud {
    runner: Arc<dyn CommandRunner>,
    project: Option<String>,
    region: Option<String>,
}

impl Gcloud {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        project: Option<String>,
        region: Option<String>,
    ) -> Self {
        Self {
            runner,
            project,
            region,
        }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn args(&self, command: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = command.iter().map(|a| a.to_string()).collect();
        if let Some(project) = &self.project {
            args.push("--project".to_string());
            args.push(project.clone());
        }
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args.push("--quiet".to_string());
        args
    }

    /// Does a function with exactly this name exist?
    pub async fn function_exists(&self, name: &str) -> Result<bool> {
        let filter = format!("name:{}", name);
        let args = self.args(&[
            "functions",
            "list",
            "--filter",
            &filter,
            "--format",
            "value(name)",
        ]);
        let output = self.runner.output_text(PROGRAM, &args).await?;
        Ok(output.lines().any(|line| is_function_named(line.trim(), name)))
    }

    /// Create or update an HTTP-triggered function from `source_dir`
    pub async fn deploy(&self, target: &DeploymentTarget, service_account: Option<&str>) -> Result<()> {
        let source = target.source_dir.to_string_lossy().to_string();
        let mut command = vec![
            "functions",
            "deploy",
            target.name.as_str(),
            "--runtime",
            target.runtime.as_str(),
            "--trigger-http",
            "--entry-point",
            target.entry_point.as_str(),
            "--source",
            source.as_str(),
        ];
        if let Some(account) = service_account {
            command.push("--service-account");
            command.push(account);
        }
        let args = self.args(&command);
        self.runner.execute(PROGRAM, &args).await
    }

    /// Current deployment status of the function.
    ///
    /// 2nd gen functions report `state`, 1st gen report `status`; the
    /// other field prints empty.
    pub async fn status(&self, name: &str) -> Result<PollStatus> {
        let args = self.args(&[
            "functions",
            "describe",
            name,
            "--format",
            "value(state,status)",
        ]);
        let described = probe::required_text(self.runner(), PROGRAM, &args).await?;
        Ok(parse_status(first_field(&described)))
    }
}

/// `value(name)` prints either the short name or the full resource path
fn is_function_named(listed: &str, name: &str) -> bool {
    listed == name || (listed.contains("/functions/") && listed.rsplit('/').next() == Some(name))
}

/// First non-empty field of a `value(...)` row
fn first_field(row: &str) -> &str {
    row.split_whitespace().next().unwrap_or_default()
}

/// Map a Cloud Functions status (1st or 2nd gen) to a poll answer
pub fn parse_status(status: &str) -> PollStatus {
    match status {
        "ACTIVE" => PollStatus::Ready,
        "OFFLINE" | "FAILED" | "DELETE_IN_PROGRESS" | "DELETING" => {
            PollStatus::Failed(status.to_string())
        }
        _ => PollStatus::Pending,
    }
}
