//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use std::time::Duration;

use crate::config::{CircuitBreakerConfig, ReconnectionConfig, ResilienceConfig, RetryConfig};

/// Default reconnection settings: 10 retries, 1s base, x1.5, 10% jitter.
pub fn resilience() -> ResilienceConfig {
    ResilienceConfig::default()
}

/// Resilience settings with a custom retry limit.
pub fn resilience_with_retries(max_retries: u32) -> ResilienceConfig {
    ResilienceConfig {
        reconnection: ReconnectionConfig {
            max_retries,
            ..ReconnectionConfig::default()
        },
        ..ResilienceConfig::default()
    }
}

/// Breaker that opens after `failure_threshold` failures and waits `reset`.
pub fn breaker(failure_threshold: u32, reset: Duration) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold,
        reset_timeout_ms: reset.as_millis() as u64,
        ..CircuitBreakerConfig::default()
    }
}

/// Retry policy with the default 1s/x2/5s delays and `max_attempts` tries.
pub fn retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        ..RetryConfig::default()
    }
}
