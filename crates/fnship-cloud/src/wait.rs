//! Convergence waiting (exponential backoff)
//!
//! Providers that have a native blocking wait call it directly. The others
//! poll a status probe through [`poll_until`], bounded by a [`WaitPolicy`] and
//! a cancellation token.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Terminal state a deploy waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    /// A newly created function finished initializing
    FunctionActive,
    /// A code update finished rolling out
    FunctionUpdated,
}

impl WaitCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitCondition::FunctionActive => "function-active",
            WaitCondition::FunctionUpdated => "function-updated",
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backoff schedule for client-side polling
#[derive(Debug, Clone, PartialEq)]
pub struct WaitPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Give up with [`CloudError::WaitTimeout`] after this long
    pub max_duration: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            multiplier: 1.5,
            max_duration: Duration::from_secs(600),
        }
    }
}

impl WaitPolicy {
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Delay before the next probe after `attempt` (0-based) pending answers
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// One observation of a converging resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Ready,
    Pending,
    /// The resource reached a terminal failure state
    Failed(String),
}

/// Poll `probe` until it reports ready.
///
/// Probe errors end the wait immediately. So does `cancel`, even while
/// sleeping between probes.
pub async fn poll_until<F, Fut>(
    policy: &WaitPolicy,
    cancel: &CancellationToken,
    condition: WaitCondition,
    resource: &str,
    mut probe: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(CloudError::Cancelled);
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CloudError::Cancelled),
            status = probe() => status?,
        };

        match status {
            PollStatus::Ready => {
                tracing::debug!("{} reached {} after {} probes", resource, condition, attempt + 1);
                return Ok(());
            }
            PollStatus::Failed(status) => {
                return Err(CloudError::ResourceFailed {
                    resource: resource.to_string(),
                    status,
                });
            }
            PollStatus::Pending => {}
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.max_duration {
            return Err(CloudError::WaitTimeout { condition, elapsed });
        }

        let delay = policy
            .delay_for_attempt(attempt)
            .min(policy.max_duration - elapsed);
        attempt = attempt.saturating_add(1);
        tracing::debug!("{} not {} yet, retrying in {:?}", resource, condition, delay);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CloudError::Cancelled),
            _ = sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy() -> WaitPolicy {
        WaitPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
            multiplier: 2.0,
            max_duration: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_delay_calculation() {
        let policy = WaitPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            max_duration: Duration::from_secs(60),
        };

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(10)); // capped at max
        assert_eq!(policy.delay_for_attempt(200), Duration::from_secs(10));
    }

    #[test]
    fn test_condition_names() {
        assert_eq!(WaitCondition::FunctionActive.to_string(), "function-active");
        assert_eq!(WaitCondition::FunctionUpdated.to_string(), "function-updated");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_pending() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        poll_until(&policy(), &cancel, WaitCondition::FunctionActive, "hello", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(if n < 2 {
                    PollStatus::Pending
                } else {
                    PollStatus::Ready
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_max_duration() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let err = poll_until(&policy(), &cancel, WaitCondition::FunctionUpdated, "hello", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(PollStatus::Pending) }
        })
        .await
        .unwrap_err();

        // probes at 0s, 1s, 3s, 7s, 10s
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        match err {
            CloudError::WaitTimeout { condition, elapsed } => {
                assert_eq!(condition, WaitCondition::FunctionUpdated);
                assert!(elapsed >= Duration::from_secs(10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_is_fatal() {
        let cancel = CancellationToken::new();
        let err = poll_until(&policy(), &cancel, WaitCondition::FunctionActive, "hello", || async {
            Ok(PollStatus::Failed("OFFLINE".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CloudError::ResourceFailed { ref resource, ref status }
                if resource == "hello" && status == "OFFLINE"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let err = poll_until(&policy(), &cancel, WaitCondition::FunctionActive, "hello", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CloudError::malformed("gcloud functions describe", "empty output")) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CloudError::MalformedResponse { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_probe() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poll_until(&policy(), &cancel, WaitCondition::FunctionActive, "hello", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(PollStatus::Pending) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CloudError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_sleeping() {
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let err = poll_until(&policy(), &cancel, WaitCondition::FunctionActive, "hello", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(PollStatus::Pending) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, CloudError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
