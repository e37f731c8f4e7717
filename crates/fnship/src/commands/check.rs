use super::{Context, SelectedProvider};
use colored::Colorize;
use fnship_config::{DeploymentType, Settings};

pub async fn handle(
    ctx: &Context,
    settings: &Settings,
    provider: Option<DeploymentType>,
) -> anyhow::Result<()> {
    let kind = provider.unwrap_or(settings.deployment_type);
    let selected = SelectedProvider::new(kind, settings, ctx);
    let provider = selected.as_provider();

    provider.check_cli().await?;
    println!(
        "{} {} CLI is installed",
        "✓".green().bold(),
        provider.display_name().cyan()
    );

    // Fail early on typos in follow_ups
    selected.follow_ups(&settings.follow_ups)?;
    Ok(())
}
