//! Layered recovery: circuit breaker, then retry, then fallback.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerError};
use super::retry::{retry_with_backoff, RecoveryMethod, RecoveryOutcome};
use crate::config::RetryConfig;
use crate::domain::{categorize_error, Severity};

/// Per-call knobs for [`ErrorRecovery::recover`].
#[derive(Debug, Clone)]
pub struct RecoveryOptions {
    /// Overrides the policy's retry settings for this call.
    pub retry: Option<RetryConfig>,
    pub use_circuit_breaker: bool,
    /// Label attached to log lines.
    pub context: Option<String>,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self {
            retry: None,
            use_circuit_breaker: true,
            context: None,
        }
    }
}

impl RecoveryOptions {
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    #[must_use]
    pub fn without_circuit_breaker(mut self) -> Self {
        self.use_circuit_breaker = false;
        self
    }
}

/// Recovery policy sharing one circuit breaker across calls.
#[derive(Debug, Clone)]
pub struct ErrorRecovery {
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
}

impl ErrorRecovery {
    #[must_use]
    pub fn new(breaker: Arc<CircuitBreaker>, retry: RetryConfig) -> Self {
        Self { breaker, retry }
    }

    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Try `operation` through the breaker, then with retries, then fall back.
    ///
    /// Never fails outright. A failed outcome carries the fallback's error
    /// and `method == Fallback`. `attempts` counts invocations of
    /// `operation`; a call rejected by an open breaker is not counted.
    pub async fn recover<F, Fut, T, E, Fb>(
        &self,
        mut operation: F,
        fallback: Fb,
        options: RecoveryOptions,
    ) -> RecoveryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Fb: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let context = options.context.as_deref().unwrap_or("operation");
        let mut attempts = 0;

        if options.use_circuit_breaker {
            match self.breaker.execute(|| operation()).await {
                Ok(value) => {
                    return RecoveryOutcome {
                        result: Ok(value),
                        attempts: 1,
                        method: RecoveryMethod::CircuitBreaker,
                    };
                }
                Err(CircuitBreakerError::Open) => {
                    debug!(context, "Circuit breaker open, falling through to retry");
                }
                Err(CircuitBreakerError::Operation(e)) => {
                    attempts += 1;
                    log_failure(context, "circuit_breaker", &e);
                }
            }
        }

        let retry = options.retry.as_ref().unwrap_or(&self.retry);
        let outcome = retry_with_backoff(&mut operation, retry).await;
        attempts += outcome.attempts;
        match outcome.result {
            Ok(value) => {
                info!(context, attempts, "Recovered by retry");
                return RecoveryOutcome {
                    result: Ok(value),
                    attempts,
                    method: RecoveryMethod::Retry,
                };
            }
            Err(e) => log_failure(context, "retry", &e),
        }

        let result = fallback();
        match &result {
            Ok(_) => info!(context, attempts, "Using fallback value"),
            Err(e) => log_failure(context, "fallback", e),
        }
        RecoveryOutcome {
            result,
            attempts,
            method: RecoveryMethod::Fallback,
        }
    }
}

fn log_failure(context: &str, layer: &str, e: &dyn fmt::Display) {
    let classification = categorize_error(e);
    let category = classification.category.as_str();
    let retryable = classification.is_retryable;
    match classification.severity {
        Severity::Low => debug!(context, layer, category, retryable, error = %e, "Recovery layer failed"),
        Severity::Medium => warn!(context, layer, category, retryable, error = %e, "Recovery layer failed"),
        Severity::High | Severity::Critical => {
            error!(context, layer, category, retryable, error = %e, "Recovery layer failed");
        }
    }
}
