//! Retry with exponential backoff.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use tokio::time::sleep;
use tracing::debug;

use crate::config::RetryConfig;

/// Layer that produced a [`RecoveryOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    CircuitBreaker,
    Retry,
    Fallback,
}

impl fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CircuitBreaker => "circuit_breaker",
            Self::Retry => "retry",
            Self::Fallback => "fallback",
        })
    }
}

/// Result of a recovery attempt together with how it was reached.
#[derive(Debug)]
pub struct RecoveryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Number of times the wrapped operation was invoked.
    pub attempts: u32,
    pub method: RecoveryMethod,
}

impl<T, E> RecoveryOutcome<T, E> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Run `operation` up to `config.max_attempts` times.
///
/// Sleeps `config.delay_after(n)` after the n-th failure unless it was the
/// last attempt. The final error is returned inside the outcome.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    config: &RetryConfig,
) -> RecoveryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                return RecoveryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                    method: RecoveryMethod::Retry,
                };
            }
            Err(e) if attempt >= max_attempts => {
                debug!(attempts = attempt, error = %e, "Retries exhausted");
                return RecoveryOutcome {
                    result: Err(e),
                    attempts: attempt,
                    method: RecoveryMethod::Retry,
                };
            }
            Err(e) => {
                let delay = config.delay_after(attempt);
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, backing off"
                );
                sleep(delay).await;
            }
        }
    }
}
