//! Deploy progress output
//!
//! Prints one timestamped line per provisioning step, a spinner while the
//! convergence wait blocks, and a summary when the deploy completes.

use chrono::Local;
use colored::Colorize;
use fnship_cloud::{DeployEvent, DeployEventSink, ProvisioningPath, Step};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How a step ended
#[derive(Debug, Clone)]
pub enum StepResult {
    Success { duration: Duration },
    Failed,
}

#[derive(Default)]
struct State {
    results: Vec<(Step, StepResult)>,
    spinner: Option<ProgressBar>,
}

/// Event sink that renders deploy progress to the terminal
pub struct DeployLogger {
    state: Mutex<State>,
}

impl DeployLogger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start_step(&self, step: Step) {
        let mut state = self.state();
        if let Step::Wait(condition) = &step {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("Waiting for {}...", condition));
            spinner.enable_steady_tick(Duration::from_millis(120));
            state.spinner = Some(spinner);
        } else {
            println!("[{}] {} {}", timestamp().dimmed(), "▶".cyan(), step);
        }
    }

    fn step_success(&self, step: Step, detail: Option<String>, duration: Duration) {
        let mut state = self.state();
        if let Some(spinner) = state.spinner.take() {
            spinner.finish_and_clear();
        }

        println!(
            "[{}] {} {} ({})",
            timestamp().dimmed(),
            "✓".green().bold(),
            detail.unwrap_or_else(|| format!("{} done", step)),
            format_duration(duration).dimmed()
        );
        state.results.push((step, StepResult::Success { duration }));
    }

    fn step_failed(&self, step: Step, error: String) {
        let mut state = self.state();
        if let Some(spinner) = state.spinner.take() {
            spinner.finish_and_clear();
        }

        println!(
            "[{}] {} {}: {}",
            timestamp().dimmed(),
            "✗".red().bold(),
            step,
            error.red()
        );
        state.results.push((step, StepResult::Failed));
    }

    /// Longest successful step so far
    pub fn slowest_step(&self) -> Option<(Step, Duration)> {
        self.state()
            .results
            .iter()
            .filter_map(|(step, result)| match result {
                StepResult::Success { duration } => Some((step.clone(), *duration)),
                StepResult::Failed => None,
            })
            .max_by_key(|(_, duration)| *duration)
    }

    #[cfg(test)]
    fn results(&self) -> Vec<(Step, StepResult)> {
        self.state().results.clone()
    }

    fn print_summary(&self, function: &str, path: ProvisioningPath, total: Duration) {
        let steps = self.state().results.len();

        println!();
        println!("{}", "═".repeat(44));
        println!("Deploy Summary: {}", function.cyan().bold());
        println!("{}", "─".repeat(44));
        println!("Result:        {}", path.to_string().green());
        println!("Steps:         {}", steps);
        println!("Total time:    {}", format_duration(total).green());
        if let Some((step, duration)) = self.slowest_step() {
            println!("Slowest step:  {} ({})", step, format_duration(duration));
        }
        println!("{}", "═".repeat(44));
    }
}

impl Default for DeployLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl DeployEventSink for DeployLogger {
    fn on_event(&self, event: DeployEvent) {
        match event {
            DeployEvent::Started { target, provider } => {
                println!(
                    "{} {} to {}",
                    "Deploying".blue().bold(),
                    target.cyan().bold(),
                    provider
                );
            }
            DeployEvent::StepStarted { step } => self.start_step(step),
            DeployEvent::StepFinished {
                step,
                detail,
                duration,
            } => self.step_success(step, detail, duration),
            DeployEvent::StepFailed { step, error, .. } => self.step_failed(step, error),
            DeployEvent::Completed {
                path,
                function,
                duration,
            } => self.print_summary(&function, path, duration),
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Format a duration for humans
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnship_cloud::WaitCondition;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(2300)), "2.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_logger_records_steps() {
        let logger = DeployLogger::new();

        logger.on_event(DeployEvent::StepStarted {
            step: Step::CreateFunction,
        });
        logger.on_event(DeployEvent::StepFinished {
            step: Step::CreateFunction,
            detail: Some("created hello".to_string()),
            duration: Duration::from_secs(3),
        });
        logger.on_event(DeployEvent::StepStarted {
            step: Step::Wait(WaitCondition::FunctionActive),
        });
        logger.on_event(DeployEvent::StepFinished {
            step: Step::Wait(WaitCondition::FunctionActive),
            detail: None,
            duration: Duration::from_secs(20),
        });
        logger.on_event(DeployEvent::StepFailed {
            step: Step::FollowUp("stage-deployment".to_string()),
            error: "boom".to_string(),
            left_behind: Vec::new(),
        });

        let results = logger.results();
        assert_eq!(results.len(), 3);
        assert!(matches!(results[2].1, StepResult::Failed));
        assert_eq!(
            logger.slowest_step(),
            Some((
                Step::Wait(WaitCondition::FunctionActive),
                Duration::from_secs(20)
            ))
        );
    }
}
