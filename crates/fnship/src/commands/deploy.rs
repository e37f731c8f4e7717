use super::{Context, SelectedProvider};
use crate::progress::DeployLogger;
use crate::prompt::DialoguerPrompter;
use anyhow::Context as _;
use colored::Colorize;
use fnship_cloud::{
    AssumeYes, CloudError, Deployer, DeploymentTarget, Prompter, ProvisioningOutcome,
};
use fnship_config::{DeploymentType, ProjectManifest, Settings, config_path};
use std::path::Path;

pub async fn handle(
    ctx: &Context,
    settings: &Settings,
    dir: &Path,
    provider: Option<DeploymentType>,
    yes: bool,
) -> anyhow::Result<()> {
    let project_dir = std::fs::canonicalize(dir)
        .with_context(|| format!("Project directory not found: {}", dir.display()))?;
    let manifest = ProjectManifest::load(&project_dir)?;
    let target = build_target(&manifest, settings, &project_dir);

    let kind = provider.unwrap_or_else(|| manifest.deployment_type_or(settings));
    tracing::debug!(
        "Deploying {} from {} with {}",
        target.name,
        project_dir.display(),
        kind
    );
    let selected = SelectedProvider::new(kind, settings, ctx);
    let provider = selected.as_provider();
    provider.check_cli().await?;
    let follow_ups = selected.follow_ups(&settings.follow_ups)?;
    tracing::debug!("{} follow-up hooks enabled", follow_ups.len());

    let prompter: Box<dyn Prompter> = if yes {
        Box::new(AssumeYes::new(DialoguerPrompter))
    } else {
        Box::new(DialoguerPrompter)
    };

    let question = format!("Deploy {} as {}?", target.name, provider.display_name());
    if !prompter.confirm(&question)? {
        return Err(CloudError::UserAborted.into());
    }

    let logger = DeployLogger::new();
    let mut deployer = Deployer::new(provider, prompter.as_ref()).with_events(&logger);
    for follow_up in follow_ups {
        deployer = deployer.with_follow_up(follow_up);
    }
    let outcome = deployer.deploy(&target).await?;

    print_outcome(&outcome);
    persist_routing(&outcome)?;
    Ok(())
}

fn build_target(
    manifest: &ProjectManifest,
    settings: &Settings,
    project_dir: &Path,
) -> DeploymentTarget {
    let mut target = DeploymentTarget::new(
        &manifest.name,
        project_dir,
        manifest.runtime_or(settings),
        &manifest.entry_point,
    );
    if let Some(module) = &manifest.handler_module {
        target = target.with_handler_module(module);
    }
    if let Some(role) = &manifest.execution_role {
        target = target.with_execution_role(role);
    }
    target
}

fn print_outcome(outcome: &ProvisioningOutcome) {
    println!();
    println!(
        "{} {} {}",
        "✓".green().bold(),
        outcome.function.name.cyan().bold(),
        outcome.path
    );
    if let Some(routing) = &outcome.routing {
        println!("  {} {}", routing.verb(), routing.resource());
    }
    if !outcome.created.is_empty() {
        println!("  New resources:");
        for resource in &outcome.created {
            println!("    • {}", resource);
        }
    }
}

/// Save a newly chosen REST API so the next deploy reuses it
fn persist_routing(outcome: &ProvisioningOutcome) -> anyhow::Result<()> {
    let Some(id) = outcome.routing_id_to_persist() else {
        return Ok(());
    };

    let path = config_path()?;
    Settings::store(&path, "rest_api_id", id)
        .with_context(|| format!("Failed to save rest_api_id to {}", path.display()))?;
    println!(
        "  Saved rest_api_id {} to {}",
        id.cyan(),
        path.display().to_string().dimmed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn manifest(yaml: &str) -> ProjectManifest {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fnship.yaml"), yaml).unwrap();
        ProjectManifest::load(dir.path()).unwrap()
    }

    #[test]
    fn test_build_target_uses_settings_defaults() {
        let manifest = manifest("name: hello\nentry_point: handler\n");
        let settings = Settings::default();

        let target = build_target(&manifest, &settings, Path::new("/srv/hello"));
        assert_eq!(target.name, "hello");
        assert_eq!(target.runtime, "python3.9");
        assert_eq!(target.handler(), "main.handler");
        assert_eq!(target.source_dir, PathBuf::from("/srv/hello"));
        assert!(target.execution_role.is_none());
    }

    #[test]
    fn test_build_target_applies_manifest_overrides() {
        let manifest = manifest(
            "name: hello\n\
             entry_point: run\n\
             runtime: python3.12\n\
             handler_module: app\n\
             execution_role: arn:aws:iam::123456789012:role/mine\n",
        );
        let settings = Settings::default();

        let target = build_target(&manifest, &settings, Path::new("/srv/hello"));
        assert_eq!(target.runtime, "python3.12");
        assert_eq!(target.handler(), "app.run");
        assert_eq!(
            target.execution_role.as_deref(),
            Some("arn:aws:iam::123456789012:role/mine")
        );
    }
}
