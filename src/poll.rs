use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{SwapError, SwapResult};

#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Polls `f` until it yields a value, the policy timeout elapses, or the
/// token is cancelled. Retryable errors from `f` are logged and retried on
/// the same backoff schedule; anything else is returned as-is.
pub async fn wait_for<T, F, Fut>(
    description: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut f: F,
) -> SwapResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SwapResult<Option<T>>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut sleep_for = policy.initial_backoff;

    loop {
        if cancel.is_cancelled() {
            return Err(SwapError::Cancelled(description.to_string()));
        }

        match f().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) if err.is_retryable() => {
                tracing::warn!(error = %err, "retrying {description}");
            }
            Err(err) => return Err(err),
        }

        if Instant::now() + sleep_for >= deadline {
            return Err(SwapError::Timeout {
                operation: description.to_string(),
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(SwapError::Cancelled(description.to_string()));
            }
            _ = tokio::time::sleep(sleep_for) => {}
        }

        sleep_for = (sleep_for * 2).min(policy.max_backoff);
    }
}
