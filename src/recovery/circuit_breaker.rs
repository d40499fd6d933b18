//! Three-state circuit breaker around async operations.
//!
//! ```text
//! Closed → Open:      failure count reaches failure_threshold
//! Open → HalfOpen:    a call arrives more than reset_timeout after the last failure
//! HalfOpen → Closed:  the trial call succeeds (count reset to 0)
//! HalfOpen → Open:    the trial call fails and the count is still at threshold
//! ```
//!
//! The failure count is not reset when entering half-open, so one failed
//! trial reopens the circuit.
//!
//! The breaker is shared by reference (usually `Arc<CircuitBreaker>`). Its
//! lock is never held while the wrapped operation runs, so concurrent
//! callers may each fail and each count against the threshold.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::CircuitBreakerConfig;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Too many failures, calls are rejected.
    Open,
    /// Cooldown elapsed, a trial call is allowed.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        })
    }
}

/// Failure returned by [`CircuitBreaker::execute`].
#[derive(Error, Debug)]
pub enum CircuitBreakerError<E> {
    /// Rejected without running the operation.
    #[error("circuit breaker is open")]
    Open,

    /// The operation ran and failed.
    #[error("{0}")]
    Operation(E),
}

impl<E> CircuitBreakerError<E> {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// The operation's own error, if it ran.
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Open => None,
            Self::Operation(e) => Some(e),
        }
    }
}

/// Snapshot for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    /// Milliseconds since the last recorded failure.
    pub last_failure_ms_ago: Option<u64>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
            }),
        }
    }

    /// Run `operation` unless the circuit is open.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitBreakerError::Open`] when the call is rejected, or
    /// [`CircuitBreakerError::Operation`] with the operation's error after
    /// recording the failure.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.admit() {
            return Err(CircuitBreakerError::Open);
        }

        match operation().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitBreakerError::Operation(e))
            }
        }
    }

    /// Current state without triggering the open → half-open transition.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failures
    }

    #[must_use]
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        CircuitBreakerStats {
            state: inner.state,
            failure_count: inner.failures,
            failure_threshold: self.config.failure_threshold,
            last_failure_ms_ago: inner
                .last_failure
                .map(|at| at.elapsed().as_millis() as u64),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn admit(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return true;
        }

        let reset_timeout = self.config.reset_timeout();
        let cooled_down = inner
            .last_failure
            .map_or(true, |at| at.elapsed() > reset_timeout);
        if cooled_down {
            inner.state = CircuitState::HalfOpen;
            info!(
                failures = inner.failures,
                "Circuit breaker half-open, allowing trial call"
            );
            true
        } else {
            debug!(
                remaining_ms = remaining(inner.last_failure, reset_timeout).as_millis() as u64,
                "Circuit breaker open, rejecting call"
            );
            false
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!(from = %inner.state, "Circuit breaker closed");
        }
        inner.failures = 0;
        inner.state = CircuitState::Closed;
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failures += 1;
        inner.last_failure = Some(Instant::now());

        if inner.failures >= self.config.failure_threshold && inner.state != CircuitState::Open {
            warn!(
                failures = inner.failures,
                threshold = self.config.failure_threshold,
                reset_timeout_ms = self.config.reset_timeout_ms,
                "Circuit breaker tripped"
            );
            inner.state = CircuitState::Open;
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

fn remaining(last_failure: Option<Instant>, reset_timeout: Duration) -> Duration {
    last_failure.map_or(Duration::ZERO, |at| reset_timeout.saturating_sub(at.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn fail(breaker: &CircuitBreaker) -> Result<(), CircuitBreakerError<&'static str>> {
        breaker.execute(|| async { Err::<(), _>("boom") }).await
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<u32, CircuitBreakerError<&'static str>> {
        breaker.execute(|| async { Ok(7) }).await
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold() {
        let breaker = CircuitBreaker::new(testkit::config::breaker(3, Duration::from_secs(30)));

        for _ in 0..2 {
            assert!(matches!(
                fail(&breaker).await,
                Err(CircuitBreakerError::Operation("boom"))
            ));
            assert_eq!(breaker.state(), CircuitState::Closed);
        }
        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.failure_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn open_rejects_without_running() {
        let breaker = CircuitBreaker::new(testkit::config::breaker(1, Duration::from_secs(30)));
        let _ = fail(&breaker).await;

        let runs = AtomicU32::new(0);
        let counter = &runs;
        let result = breaker
            .execute(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>(())
            })
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::Open)));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(
            result.unwrap_err().to_string(),
            "circuit breaker is open"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_success_closes() {
        let reset = Duration::from_secs(30);
        let breaker = CircuitBreaker::new(testkit::config::breaker(2, reset));
        let _ = fail(&breaker).await;
        let _ = fail(&breaker).await;

        tokio::time::advance(reset).await;
        assert!(succeed(&breaker).await.unwrap_err().is_open());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(succeed(&breaker).await.ok(), Some(7));
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens() {
        let reset = Duration::from_secs(30);
        let breaker = CircuitBreaker::new(testkit::config::breaker(2, reset));
        let _ = fail(&breaker).await;
        let _ = fail(&breaker).await;

        tokio::time::advance(reset + Duration::from_millis(1)).await;
        assert!(matches!(
            fail(&breaker).await,
            Err(CircuitBreakerError::Operation(_))
        ));
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.failure_count(), 3);
        assert!(succeed(&breaker).await.unwrap_err().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_count_while_closed() {
        let breaker = CircuitBreaker::new(testkit::config::breaker(3, Duration::from_secs(30)));
        let _ = fail(&breaker).await;
        let _ = fail(&breaker).await;
        let _ = succeed(&breaker).await;
        let _ = fail(&breaker).await;
        let _ = fail(&breaker).await;

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_reflect_state() {
        let breaker = CircuitBreaker::default();
        let _ = fail(&breaker).await;
        tokio::time::advance(Duration::from_millis(250)).await;

        let stats = breaker.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.failure_threshold, 5);
        assert_eq!(stats.last_failure_ms_ago, Some(250));
    }
}
