//! Provisioning sequence
//!
//! ```text
//! PROBE_FUNCTION ─┬─ absent ──> ENSURE_IDENTITY -> CREATE_FUNCTION -> ENSURE_ROUTING -> follow-ups ─┐
//!                 └─ present ─> UPDATE_FUNCTION_CODE ─────────────────────────────────────────────────┤
//!                                                                                            WAIT <──┘
//! ```
//!
//! Steps run strictly in order. The first failure stops the deploy; resources
//! created before it stay in place and are reported in
//! [`CloudError::StepFailed`].

use crate::error::{CloudError, Result};
use crate::events::{DeployEvent, DeployEventSink, NoopEventSink};
use crate::follow_up::{FollowUp, ProvisionedFunction};
use crate::prompt::Prompter;
use crate::provider::{FunctionProvider, RoutingResolution};
use crate::resource::{DeploymentTarget, RemoteResource};
use crate::wait::WaitCondition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

/// One edge of the provisioning sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    ProbeFunction,
    EnsureIdentity,
    CreateFunction,
    EnsureRouting,
    /// A registered follow-up hook, by id
    FollowUp(String),
    UpdateFunctionCode,
    Wait(WaitCondition),
}

impl Step {
    pub fn id(&self) -> &str {
        match self {
            Self::ProbeFunction => "probe-function",
            Self::EnsureIdentity => "ensure-identity",
            Self::CreateFunction => "create-function",
            Self::EnsureRouting => "ensure-routing",
            Self::FollowUp(id) => id,
            Self::UpdateFunctionCode => "update-function-code",
            Self::Wait(_) => "wait",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbeFunction => f.write_str("probe function"),
            Self::EnsureIdentity => f.write_str("ensure execution identity"),
            Self::CreateFunction => f.write_str("create function"),
            Self::EnsureRouting => f.write_str("ensure routing"),
            Self::FollowUp(id) => write!(f, "follow-up {}", id),
            Self::UpdateFunctionCode => f.write_str("update function code"),
            Self::Wait(condition) => write!(f, "wait for {}", condition),
        }
    }
}

/// Which branch a deploy took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisioningPath {
    Created,
    Updated,
}

impl ProvisioningPath {
    /// Condition the waiter has to satisfy after this path
    pub fn wait_condition(&self) -> WaitCondition {
        match self {
            Self::Created => WaitCondition::FunctionActive,
            Self::Updated => WaitCondition::FunctionUpdated,
        }
    }
}

impl fmt::Display for ProvisioningPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Result of a successful deploy
#[derive(Debug, Clone)]
pub struct ProvisioningOutcome {
    pub path: ProvisioningPath,
    pub wait: WaitCondition,
    pub function: RemoteResource,
    pub routing: Option<RoutingResolution>,
    /// Everything created by this deploy, in creation order
    pub created: Vec<RemoteResource>,
    pub duration: Duration,
}

impl ProvisioningOutcome {
    /// Routing id to save for the next deploy
    pub fn routing_id_to_persist(&self) -> Option<&str> {
        self.routing
            .as_ref()
            .and_then(RoutingResolution::newly_chosen_id)
    }
}

static NOOP_EVENTS: NoopEventSink = NoopEventSink;

/// Runs one deploy against a provider
pub struct Deployer<'a> {
    provider: &'a dyn FunctionProvider,
    prompter: &'a dyn Prompter,
    events: &'a dyn DeployEventSink,
    follow_ups: Vec<Box<dyn FollowUp + 'a>>,
}

impl<'a> Deployer<'a> {
    pub fn new(provider: &'a dyn FunctionProvider, prompter: &'a dyn Prompter) -> Self {
        Self {
            provider,
            prompter,
            events: &NOOP_EVENTS,
            follow_ups: Vec::new(),
        }
    }

    pub fn with_events(mut self, events: &'a dyn DeployEventSink) -> Self {
        self.events = events;
        self
    }

    /// Register a hook to run after the routing resource on the create path
    pub fn with_follow_up(mut self, follow_up: Box<dyn FollowUp + 'a>) -> Self {
        self.follow_ups.push(follow_up);
        self
    }

    pub fn with_follow_ups<I>(mut self, follow_ups: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn FollowUp + 'a>>,
    {
        self.follow_ups.extend(follow_ups);
        self
    }

    /// Deploy `target`: create or update, then wait exactly once
    pub async fn deploy(&self, target: &DeploymentTarget) -> Result<ProvisioningOutcome> {
        let started = Instant::now();
        self.events.on_event(DeployEvent::Started {
            target: target.name.clone(),
            provider: self.provider.display_name().to_string(),
        });

        let mut created: Vec<RemoteResource> = Vec::new();

        let probed = self
            .step(
                Step::ProbeFunction,
                &created,
                self.provider.probe_function(target),
                |f| Some(if f.exists() { "exists" } else { "not found" }.to_string()),
            )
            .await?;

        let (path, function, routing) = if probed.exists() {
            let function = self
                .step(
                    Step::UpdateFunctionCode,
                    &created,
                    self.provider.update_function_code(target),
                    |_| None,
                )
                .await?;
            (ProvisioningPath::Updated, function, None)
        } else {
            let (function, routing) = self.create_path(target, &mut created).await?;
            (ProvisioningPath::Created, function, routing)
        };

        let wait = path.wait_condition();
        self.step(
            Step::Wait(wait),
            &created,
            self.provider.wait(wait, target),
            |_| None,
        )
        .await?;

        let duration = started.elapsed();
        self.events.on_event(DeployEvent::Completed {
            path,
            function: target.name.clone(),
            duration,
        });

        Ok(ProvisioningOutcome {
            path,
            wait,
            function,
            routing,
            created,
            duration,
        })
    }

    async fn create_path(
        &self,
        target: &DeploymentTarget,
        created: &mut Vec<RemoteResource>,
    ) -> Result<(RemoteResource, Option<RoutingResolution>)> {
        let identity = self
            .step(
                Step::EnsureIdentity,
                created,
                self.provider.ensure_identity(target),
                |p| {
                    let verb = if p.created { "created" } else { "using" };
                    Some(format!("{} {}", verb, p.resource.id_or_name()))
                },
            )
            .await?;
        if identity.created {
            created.push(identity.resource.clone());
        }

        let function = self
            .step(
                Step::CreateFunction,
                created,
                self.provider.create_function(target, &identity.resource),
                |_| None,
            )
            .await?;
        created.push(function.clone());

        let routing = self
            .step(
                Step::EnsureRouting,
                created,
                self.provider
                    .ensure_routing(target, &function, self.prompter),
                |r| match r {
                    Some(r) => Some(format!("{} {}", r.verb(), r.resource().id_or_name())),
                    None => Some("not required".to_string()),
                },
            )
            .await?;
        if let Some(r) = routing.as_ref().filter(|r| r.was_created()) {
            created.push(r.resource().clone());
        }

        for follow_up in &self.follow_ups {
            let ctx = ProvisionedFunction {
                target,
                function: &function,
                routing: routing.as_ref().map(RoutingResolution::resource),
            };
            let made = self
                .step(
                    Step::FollowUp(follow_up.id().to_string()),
                    created,
                    follow_up.run(ctx),
                    |r| r.as_ref().map(|r| r.to_string()),
                )
                .await?;
            if let Some(resource) = made {
                created.push(resource);
            }
        }

        Ok((function, routing))
    }

    async fn step<T, Fut, D>(
        &self,
        step: Step,
        left_behind: &[RemoteResource],
        fut: Fut,
        describe: D,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
        D: FnOnce(&T) -> Option<String>,
    {
        tracing::info!("{}", step);
        self.events
            .on_event(DeployEvent::StepStarted { step: step.clone() });
        let started = Instant::now();

        match fut.await {
            Ok(value) => {
                self.events.on_event(DeployEvent::StepFinished {
                    step,
                    detail: describe(&value),
                    duration: started.elapsed(),
                });
                Ok(value)
            }
            Err(err) => {
                let mut left_behind = left_behind.to_vec();
                let source = match err {
                    CloudError::Incomplete { resource, source } => {
                        left_behind.push(resource);
                        *source
                    }
                    other => other,
                };
                if !left_behind.is_empty() {
                    tracing::warn!(
                        "{} failed; not rolled back: {}",
                        step,
                        left_behind
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }
                self.events.on_event(DeployEvent::StepFailed {
                    step: step.clone(),
                    error: source.to_string(),
                    left_behind: left_behind.clone(),
                });
                Err(CloudError::StepFailed {
                    step,
                    left_behind,
                    source: Box::new(source),
                })
            }
        }
    }
}
