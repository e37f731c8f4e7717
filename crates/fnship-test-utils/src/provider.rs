//! In-memory provider that records capability calls.

use async_trait::async_trait;
use fnship_cloud::{
    CloudError, DeploymentTarget, FunctionProvider, Prompter, Provisioned, RemoteResource,
    ResourceKind, Result, RoutingResolution, WaitCondition,
};
use std::sync::Mutex;

/// Capability call recorded by [`RecordingProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `probe_function`
    ProbeFunction,
    /// `ensure_identity`
    EnsureIdentity,
    /// `create_function` with the identity it was given
    CreateFunction {
        /// Identity name or id passed in.
        identity: String,
    },
    /// `update_function_code`
    UpdateFunctionCode,
    /// `ensure_routing`
    EnsureRouting,
    /// `wait`
    Wait(WaitCondition),
}

/// Provider whose remote state is a handful of flags.
#[derive(Debug)]
pub struct RecordingProvider {
    function_exists: bool,
    identity_exists: bool,
    routing: Option<RoutingResolution>,
    fail_on: Option<&'static str>,
    calls: Mutex<Vec<Call>>,
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self {
            function_exists: false,
            identity_exists: true,
            routing: None,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingProvider {
    /// Fresh account: no function, identity present, no routing resource.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the function already exists.
    pub fn with_existing_function(mut self) -> Self {
        self.function_exists = true;
        self
    }

    /// Pretend the execution identity has to be created.
    pub fn without_identity(mut self) -> Self {
        self.identity_exists = false;
        self
    }

    /// What `ensure_routing` answers.
    pub fn with_routing(mut self, routing: RoutingResolution) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Fail the named capability (`"create_function"`, `"wait"`, ...).
    pub fn failing_on(mut self, capability: &'static str) -> Self {
        self.fail_on = Some(capability);
        self
    }

    /// Recorded calls, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, capability: &'static str, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_on == Some(capability) {
            return Err(CloudError::ExecutionFailed {
                program: "fake".to_string(),
                exit_code: Some(255),
                stderr: format!("{capability} exploded"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FunctionProvider for RecordingProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn display_name(&self) -> &str {
        "Fake Cloud"
    }

    async fn check_cli(&self) -> Result<()> {
        Ok(())
    }

    async fn probe_function(&self, target: &DeploymentTarget) -> Result<RemoteResource> {
        self.record("probe_function", Call::ProbeFunction)?;
        Ok(if self.function_exists {
            RemoteResource::present(ResourceKind::Function, &target.name, None)
        } else {
            RemoteResource::absent(ResourceKind::Function, &target.name)
        })
    }

    async fn ensure_identity(&self, _target: &DeploymentTarget) -> Result<Provisioned> {
        self.record("ensure_identity", Call::EnsureIdentity)?;
        let role = RemoteResource::present(
            ResourceKind::ExecutionIdentity,
            "fake-role",
            Some("role/fake-role".to_string()),
        );
        Ok(if self.identity_exists {
            Provisioned::existing(role)
        } else {
            Provisioned::created(role)
        })
    }

    async fn create_function(
        &self,
        target: &DeploymentTarget,
        identity: &RemoteResource,
    ) -> Result<RemoteResource> {
        self.record(
            "create_function",
            Call::CreateFunction {
                identity: identity.id_or_name().to_string(),
            },
        )?;
        Ok(RemoteResource::present(
            ResourceKind::Function,
            &target.name,
            Some(format!("fn/{}", target.name)),
        ))
    }

    async fn update_function_code(&self, target: &DeploymentTarget) -> Result<RemoteResource> {
        self.record("update_function_code", Call::UpdateFunctionCode)?;
        Ok(RemoteResource::present(
            ResourceKind::Function,
            &target.name,
            Some(format!("fn/{}", target.name)),
        ))
    }

    async fn ensure_routing(
        &self,
        _target: &DeploymentTarget,
        _function: &RemoteResource,
        _prompter: &dyn Prompter,
    ) -> Result<Option<RoutingResolution>> {
        self.record("ensure_routing", Call::EnsureRouting)?;
        Ok(self.routing.clone())
    }

    async fn wait(&self, condition: WaitCondition, _target: &DeploymentTarget) -> Result<()> {
        self.record("wait", Call::Wait(condition))
    }
}
