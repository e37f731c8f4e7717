//! External command execution
//!
//! Every call to a cloud provider goes through a [`CommandRunner`]. The runner
//! classifies process failures exactly once: the not-found sentinel becomes
//! [`CloudError::NotFound`], everything else becomes
//! [`CloudError::ExecutionFailed`]. Callers never look at exit codes.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Exit code the AWS CLI uses when the service answered with an error for the
/// requested resource (e.g. `ResourceNotFoundException`).
pub const NOT_FOUND_EXIT_CODE: i32 = 254;

/// What to do with the child's standard output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Capture stdout and return it
    Stdout,
    /// Discard stdout (streamed to the terminal in verbose mode)
    Discard,
}

/// Runs one external program to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Spawn `program` with `args` and wait for it.
    ///
    /// Returns the captured stdout when `capture` is [`Capture::Stdout`].
    async fn run(&self, program: &str, args: &[String], capture: Capture)
    -> Result<Option<Vec<u8>>>;

    /// Run and return stdout
    async fn output(&self, program: &str, args: &[String]) -> Result<Vec<u8>> {
        Ok(self
            .run(program, args, Capture::Stdout)
            .await?
            .unwrap_or_default())
    }

    /// Run and return stdout as trimmed UTF-8 text
    async fn output_text(&self, program: &str, args: &[String]) -> Result<String> {
        let bytes = self.output(program, args).await?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }

    /// Run for side effects only
    async fn execute(&self, program: &str, args: &[String]) -> Result<()> {
        self.run(program, args, Capture::Discard).await?;
        Ok(())
    }
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    verbose: bool,
    cancel: CancellationToken,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror command lines and the child's stderr to the operator
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Kill the running child and fail with [`CloudError::Cancelled`] once
    /// `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        capture: Capture,
    ) -> Result<Option<Vec<u8>>> {
        let line = command_line(program, args);
        tracing::debug!("Running: {}", line);
        if self.verbose {
            eprintln!("$ {}", line);
        }

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd.stdout(match capture {
            Capture::Stdout => Stdio::piped(),
            Capture::Discard if self.verbose => Stdio::inherit(),
            Capture::Discard => Stdio::null(),
        });
        cmd.stderr(if self.verbose {
            Stdio::inherit()
        } else {
            Stdio::piped()
        });

        let child = cmd.spawn().map_err(|e| CloudError::ExecutionFailed {
            program: program.to_string(),
            exit_code: None,
            stderr: e.to_string(),
        })?;

        // Dropping the child on cancellation kills it (kill_on_drop).
        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = self.cancel.cancelled() => {
                tracing::debug!("Cancelled: {}", line);
                return Err(CloudError::Cancelled);
            }
        };

        if output.status.success() {
            return Ok(match capture {
                Capture::Stdout => Some(output.stdout),
                Capture::Discard => None,
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        tracing::debug!(
            "{} exited with {:?}: {}",
            program,
            output.status.code(),
            stderr.trim()
        );
        Err(classify_failure(program, output.status.code(), stderr))
    }
}

/// Map a failed exit into the orchestrator's error taxonomy
pub fn classify_failure(program: &str, exit_code: Option<i32>, stderr: String) -> CloudError {
    match exit_code {
        Some(NOT_FOUND_EXIT_CODE) => CloudError::NotFound {
            program: program.to_string(),
            stderr,
        },
        _ => CloudError::ExecutionFailed {
            program: program.to_string(),
            exit_code,
            stderr,
        },
    }
}

/// Check that `program` can be spawned at all.
///
/// Runs `program <version_arg>`; a spawn failure (no exit status) becomes
/// [`CloudError::ToolNotFound`] carrying `hint`.
pub async fn ensure_installed(
    runner: &dyn CommandRunner,
    program: &str,
    version_arg: &str,
    hint: &str,
) -> Result<()> {
    match runner
        .run(program, &[version_arg.to_string()], Capture::Discard)
        .await
    {
        Ok(_) => Ok(()),
        Err(CloudError::ExecutionFailed {
            exit_code: None, ..
        }) => Err(CloudError::ToolNotFound {
            program: program.to_string(),
            hint: hint.to_string(),
        }),
        Err(e) => Err(e),
    }
}

/// Render a command line for logs
pub fn command_line(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Build an owned argument vector from string slices
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> Vec<String> {
        args(["-c", script])
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = ProcessRunner::new();
        let out = runner.output_text("sh", &sh("echo hello")).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_discard_returns_none() {
        let runner = ProcessRunner::new();
        let out = runner
            .run("sh", &sh("echo ignored"), Capture::Discard)
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_not_found_sentinel_is_classified() {
        let runner = ProcessRunner::new();
        let err = runner.execute("sh", &sh("exit 254")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_not_found_sentinel_keeps_stderr() {
        let runner = ProcessRunner::new();
        let err = runner
            .execute("sh", &sh("echo 'AccessDenied: not authorized' >&2; exit 254"))
            .await
            .unwrap_err();
        match &err {
            CloudError::NotFound { program, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr.trim(), "AccessDenied: not authorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("AccessDenied: not authorized"));
    }

    #[tokio::test]
    async fn test_other_exit_codes_are_execution_failures() {
        let runner = ProcessRunner::new();
        let err = runner
            .execute("sh", &sh("echo denied >&2; exit 255"))
            .await
            .unwrap_err();
        match err {
            CloudError::ExecutionFailed {
                program,
                exit_code,
                stderr,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(exit_code, Some(255));
                assert_eq!(stderr.trim(), "denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_has_no_exit_code() {
        let runner = ProcessRunner::new();
        let err = runner
            .execute("fnship-definitely-missing-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CloudError::ExecutionFailed {
                exit_code: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_ensure_installed_reports_missing_tool() {
        let runner = ProcessRunner::new();
        let err = ensure_installed(
            &runner,
            "fnship-definitely-missing-binary",
            "--version",
            "install it",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CloudError::ToolNotFound { .. }));
        assert!(err.to_string().contains("install it"));
    }

    #[tokio::test]
    async fn test_cancellation_kills_child() {
        let token = CancellationToken::new();
        let runner = ProcessRunner::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let started = std::time::Instant::now();
        let err = runner.execute("sleep", &args(["5"])).await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, CloudError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_command_line() {
        assert_eq!(command_line("aws", &[]), "aws");
        assert_eq!(
            command_line("aws", &args(["lambda", "get-function"])),
            "aws lambda get-function"
        );
    }
}
