//! aws CLI wrapper
//!
//! Wraps the `aws` commands fnship needs for Lambda, API Gateway and IAM.
//! Every call goes through the shared [`CommandRunner`].

use crate::archive::DeploymentArchive;
use fnship_cloud::probe::{self, parse_created_id};
use fnship_cloud::{CandidateSet, CommandRunner, DeploymentTarget, Result, WaitCondition};
use std::sync::Arc;

const PROGRAM: &str = "aws";

/// Trust policy that lets Lambda assume the execution role
pub const LAMBDA_TRUST_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"lambda.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#;

/// Managed policy granting CloudWatch Logs access
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// aws CLI wrapper
#[derive(Clone)]
pub struct AwsCli {
    runner: Arc<dyn CommandRunner>,
    region: Option<String>,
}

impl AwsCli {
    pub fn new(runner: Arc<dyn CommandRunner>, region: Option<String>) -> Self {
        Self { runner, region }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Service arguments plus the global flags every call carries
    fn args(&self, service_args: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = service_args.iter().map(|a| a.to_string()).collect();
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args.push("--no-cli-pager".to_string());
        args
    }

    /// Does the function exist?
    pub async fn function_exists(&self, name: &str) -> Result<bool> {
        let args = self.args(&["lambda", "get-function", "--function-name", name]);
        probe::exists(self.runner(), PROGRAM, &args).await
    }

    /// ARN of an IAM role, `None` if the role does not exist
    pub async fn get_role_arn(&self, role_name: &str) -> Result<Option<String>> {
        let args = self.args(&[
            "iam",
            "get-role",
            "--role-name",
            role_name,
            "--query",
            "Role.Arn",
            "--output",
            "text",
        ]);
        match probe::required_text(self.runner(), PROGRAM, &args).await {
            Ok(arn) => Ok(Some(arn)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a role Lambda can assume; returns its ARN
    pub async fn create_role(&self, role_name: &str) -> Result<String> {
        let args = self.args(&[
            "iam",
            "create-role",
            "--role-name",
            role_name,
            "--assume-role-policy-document",
            LAMBDA_TRUST_POLICY,
            "--query",
            "Role.Arn",
            "--output",
            "text",
        ]);
        probe::required_text(self.runner(), PROGRAM, &args).await
    }

    pub async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        let args = self.args(&[
            "iam",
            "attach-role-policy",
            "--role-name",
            role_name,
            "--policy-arn",
            policy_arn,
        ]);
        self.runner.execute(PROGRAM, &args).await
    }

    pub async fn create_function(
        &self,
        target: &DeploymentTarget,
        role_arn: &str,
        archive: &DeploymentArchive,
    ) -> Result<()> {
        let handler = target.handler();
        let zip_file = archive.fileb_uri();
        let args = self.args(&[
            "lambda",
            "create-function",
            "--function-name",
            &target.name,
            "--runtime",
            &target.runtime,
            "--role",
            role_arn,
            "--handler",
            &handler,
            "--package-type",
            "Zip",
            "--zip-file",
            &zip_file,
        ]);
        self.runner.execute(PROGRAM, &args).await
    }

    pub async fn update_function_code(&self, name: &str, archive: &DeploymentArchive) -> Result<()> {
        let zip_file = archive.fileb_uri();
        let args = self.args(&[
            "lambda",
            "update-function-code",
            "--function-name",
            name,
            "--zip-file",
            &zip_file,
        ]);
        self.runner.execute(PROGRAM, &args).await
    }

    /// Block on the CLI's own waiter
    pub async fn wait(&self, condition: WaitCondition, name: &str) -> Result<()> {
        let args = self.args(&[
            "lambda",
            "wait",
            condition.as_str(),
            "--function-name",
            name,
        ]);
        self.runner.execute(PROGRAM, &args).await
    }

    pub async fn rest_api_exists(&self, rest_api_id: &str) -> Result<bool> {
        let args = self.args(&["apigateway", "get-rest-api", "--rest-api-id", rest_api_id]);
        probe::exists(self.runner(), PROGRAM, &args).await
    }

    /// All REST APIs in the account, keyed by name
    pub async fn list_rest_apis(&self, well_known: &str) -> Result<CandidateSet> {
        let args = self.args(&["apigateway", "get-rest-apis", "--output", "json"]);
        probe::list_candidates(self.runner(), PROGRAM, &args, well_known).await
    }

    /// Create a REST API; returns its id
    pub async fn create_rest_api(&self, name: &str) -> Result<String> {
        let args = self.args(&[
            "apigateway",
            "create-rest-api",
            "--name",
            name,
            "--output",
            "json",
        ]);
        let body = self.runner.output(PROGRAM, &args).await?;
        parse_created_id(&body)
    }

    /// Deploy a REST API to `stage`; returns the deployment id
    pub async fn create_deployment(&self, rest_api_id: &str, stage: &str) -> Result<String> {
        let args = self.args(&[
            "apigateway",
            "create-deployment",
            "--rest-api-id",
            rest_api_id,
            "--stage-name",
            stage,
            "--output",
            "json",
        ]);
        let body = self.runner.output(PROGRAM, &args).await?;
        parse_created_id(&body)
    }

    /// Allow API Gateway to invoke the function
    pub async fn add_invoke_permission(&self, function_name: &str, statement_id: &str) -> Result<()> {
        let args = self.args(&[
            "lambda",
            "add-permission",
            "--function-name",
            function_name,
            "--statement-id",
            statement_id,
            "--action",
            "lambda:InvokeFunction",
            "--principal",
            "apigateway.amazonaws.com",
        ]);
        self.runner.execute(PROGRAM, &args).await
    }
}
