//! Error recovery primitives.
//!
//! [`CircuitBreaker`] and [`retry_with_backoff`] each report failures to
//! their caller. [`ErrorRecovery`] layers them with a fallback and is the
//! only piece that absorbs a failure into a value.

mod circuit_breaker;
mod policy;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitBreakerStats, CircuitState};
pub use policy::{ErrorRecovery, RecoveryOptions};
pub use retry::{retry_with_backoff, RecoveryMethod, RecoveryOutcome};
