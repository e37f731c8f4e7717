//! Provisioning sequence scenarios against a recording provider

use async_trait::async_trait;
use fnship_cloud::{
    CloudError, DeployEvent, DeployEventSink, Deployer, FollowUp, ProvisionedFunction,
    ProvisioningPath, RemoteResource, ResourceKind, Result, RoutingResolution, Step,
    WaitCondition,
};
use fnship_test_utils::{Call, RecordingProvider, ScriptedPrompter, routing_resource, sample_target};
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<DeployEvent>>,
}

impl CollectingSink {
    fn step_events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DeployEvent::StepStarted { step } => Some(format!("start {}", step.id())),
                DeployEvent::StepFinished { step, .. } => Some(format!("done {}", step.id())),
                DeployEvent::StepFailed { step, .. } => Some(format!("fail {}", step.id())),
                _ => None,
            })
            .collect()
    }
}

impl DeployEventSink for CollectingSink {
    fn on_event(&self, event: DeployEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct StageHook {
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl StageHook {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FollowUp for &StageHook {
    fn id(&self) -> &str {
        "stage-deployment"
    }

    async fn run(&self, ctx: ProvisionedFunction<'_>) -> Result<Option<RemoteResource>> {
        self.seen.lock().unwrap().push((
            ctx.function.name.clone(),
            ctx.routing.and_then(|r| r.remote_id.clone()),
        ));
        Ok(Some(RemoteResource::present(
            ResourceKind::RoutingResource,
            "prod",
            Some("dep-1".to_string()),
        )))
    }
}

#[tokio::test]
async fn test_new_function_takes_create_path() {
    let provider = RecordingProvider::new()
        .with_routing(RoutingResolution::Created(routing_resource("abc123")));
    let prompter = ScriptedPrompter::new();
    let target = sample_target(Path::new("/tmp/hello"));

    let outcome = Deployer::new(&provider, &prompter)
        .deploy(&target)
        .await
        .unwrap();

    assert_eq!(
        provider.calls(),
        vec![
            Call::ProbeFunction,
            Call::EnsureIdentity,
            Call::CreateFunction {
                identity: "role/fake-role".to_string()
            },
            Call::EnsureRouting,
            Call::Wait(WaitCondition::FunctionActive),
        ]
    );
    assert_eq!(outcome.path, ProvisioningPath::Created);
    assert_eq!(outcome.wait, WaitCondition::FunctionActive);
    assert_eq!(outcome.routing_id_to_persist(), Some("abc123"));
    assert_eq!(outcome.function.name, "hello");
    // function + new routing resource; the identity already existed
    assert_eq!(outcome.created.len(), 2);
}

#[tokio::test]
async fn test_existing_function_only_updates_code() {
    let provider = RecordingProvider::new().with_existing_function();
    let prompter = ScriptedPrompter::new();
    let target = sample_target(Path::new("/tmp/hello"));

    let outcome = Deployer::new(&provider, &prompter)
        .deploy(&target)
        .await
        .unwrap();

    assert_eq!(
        provider.calls(),
        vec![
            Call::ProbeFunction,
            Call::UpdateFunctionCode,
            Call::Wait(WaitCondition::FunctionUpdated),
        ]
    );
    assert_eq!(outcome.path, ProvisioningPath::Updated);
    assert!(outcome.routing.is_none());
    assert!(outcome.created.is_empty());
    assert!(prompter.presented().is_empty());
}

#[tokio::test]
async fn test_reused_routing_is_not_persisted_again() {
    let provider = RecordingProvider::new()
        .with_routing(RoutingResolution::Reused(routing_resource("seed")));
    let prompter = ScriptedPrompter::new();
    let target = sample_target(Path::new("/tmp/hello"));

    let outcome = Deployer::new(&provider, &prompter)
        .deploy(&target)
        .await
        .unwrap();

    assert_eq!(outcome.routing_id_to_persist(), None);
    assert_eq!(outcome.created.len(), 1);
}

#[tokio::test]
async fn test_failure_reports_step_and_left_behind() {
    let provider = RecordingProvider::new()
        .without_identity()
        .failing_on("create_function");
    let prompter = ScriptedPrompter::new();
    let target = sample_target(Path::new("/tmp/hello"));

    let err = Deployer::new(&provider, &prompter)
        .deploy(&target)
        .await
        .unwrap_err();

    match &err {
        CloudError::StepFailed {
            step, left_behind, ..
        } => {
            assert_eq!(*step, Step::CreateFunction);
            assert_eq!(left_behind.len(), 1);
            assert_eq!(left_behind[0].kind, ResourceKind::ExecutionIdentity);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(err.root(), CloudError::ExecutionFailed { .. }));

    // no routing, no wait after the failure
    assert_eq!(provider.calls().len(), 3);
    assert!(!provider.calls().iter().any(|c| matches!(c, Call::Wait(_))));
}

#[tokio::test]
async fn test_wait_failure_is_fatal() {
    let provider = RecordingProvider::new()
        .with_existing_function()
        .failing_on("wait");
    let prompter = ScriptedPrompter::new();
    let target = sample_target(Path::new("/tmp/hello"));

    let err = Deployer::new(&provider, &prompter)
        .deploy(&target)
        .await
        .unwrap_err();

    assert_eq!(
        err.failed_step(),
        Some(&Step::Wait(WaitCondition::FunctionUpdated))
    );
    assert_eq!(provider.calls().len(), 3);
}

#[tokio::test]
async fn test_follow_ups_run_after_routing_on_create() {
    let provider = RecordingProvider::new()
        .with_routing(RoutingResolution::Selected(routing_resource("abc123")));
    let prompter = ScriptedPrompter::new();
    let hook = StageHook::new();
    let sink = CollectingSink::default();
    let target = sample_target(Path::new("/tmp/hello"));

    let outcome = Deployer::new(&provider, &prompter)
        .with_events(&sink)
        .with_follow_up(Box::new(&hook))
        .deploy(&target)
        .await
        .unwrap();

    assert_eq!(
        *hook.seen.lock().unwrap(),
        vec![("hello".to_string(), Some("abc123".to_string()))]
    );
    assert_eq!(
        sink.step_events(),
        vec![
            "start probe-function",
            "done probe-function",
            "start ensure-identity",
            "done ensure-identity",
            "start create-function",
            "done create-function",
            "start ensure-routing",
            "done ensure-routing",
            "start stage-deployment",
            "done stage-deployment",
            "start wait",
            "done wait",
        ]
    );
    assert_eq!(outcome.created.last().map(|r| r.name.as_str()), Some("prod"));
}

#[tokio::test]
async fn test_follow_ups_skipped_on_update() {
    let provider = RecordingProvider::new().with_existing_function();
    let prompter = ScriptedPrompter::new();
    let hook = StageHook::new();
    let target = sample_target(Path::new("/tmp/hello"));

    Deployer::new(&provider, &prompter)
        .with_follow_up(Box::new(&hook))
        .deploy(&target)
        .await
        .unwrap();

    assert!(hook.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_step_emits_event() {
    let provider = RecordingProvider::new().failing_on("ensure_routing");
    let prompter = ScriptedPrompter::new();
    let sink = CollectingSink::default();
    let target = sample_target(Path::new("/tmp/hello"));

    let err = Deployer::new(&provider, &prompter)
        .with_events(&sink)
        .deploy(&target)
        .await
        .unwrap_err();

    assert_eq!(err.failed_step(), Some(&Step::EnsureRouting));
    assert_eq!(
        sink.step_events().last().map(String::as_str),
        Some("fail ensure-routing")
    );
    let completed = sink
        .events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, DeployEvent::Completed { .. }));
    assert!(!completed);
}
