mod commands;
mod progress;
mod prompt;

use clap::{Parser, Subcommand};
use colored::Colorize;
use fnship_cloud::CloudError;
use fnship_config::{DeploymentType, Settings};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fnship")]
#[command(about = "Ship a function to AWS Lambda or Google Cloud Functions", long_about = None)]
struct Cli {
    /// Show debug logs and the cloud CLI commands being run
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the function in a project directory
    Deploy {
        /// Project directory containing fnship.yaml
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Platform to deploy to (overrides deployment_type)
        #[arg(short, long)]
        provider: Option<DeploymentType>,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
    },
    /// Check that the platform's CLI is installed
    Check {
        /// Platform to check (overrides deployment_type)
        #[arg(short, long)]
        provider: Option<DeploymentType>,
    },
    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Show version
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,
    /// Change one setting
    Set {
        /// Setting name (e.g. runtime, region, follow_ups)
        key: String,
        /// New value; an empty string clears optional settings
        value: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        report(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        println!("fnship {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = Settings::load()?;
    let verbose = cli.verbose || settings.debug;
    init_logging(verbose);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let ctx = commands::Context { verbose, cancel };

    match cli.command {
        Commands::Deploy { dir, provider, yes } => {
            commands::deploy::handle(&ctx, &settings, &dir, provider, yes).await?;
        }
        Commands::Check { provider } => {
            commands::check::handle(&ctx, &settings, provider).await?;
        }
        Commands::Config(config_cmd) => {
            commands::config::handle(config_cmd, &settings)?;
        }
        Commands::Version => {
            unreachable!("Version is handled before settings are loaded");
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout is for progress output
fn init_logging(debug: bool) {
    let default_directives = if debug { "warn,fnship=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<CloudError>() {
        Some(
            failure @ CloudError::StepFailed {
                step, left_behind, ..
            },
        ) => {
            eprintln!("{} {} failed", "Error:".red().bold(), step.to_string().bold());
            eprintln!("  {}", failure.root());

            if !left_behind.is_empty() {
                eprintln!();
                eprintln!("{}", "Created before the failure (not rolled back):".yellow());
                for resource in left_behind {
                    eprintln!("  • {}", resource);
                }
            }
        }
        _ => eprintln!("{} {:#}", "Error:".red().bold(), error),
    }
}
