//! Reconnection, monitoring, circuit breaker and retry settings.
//!
//! Durations are stored as milliseconds so they read naturally in TOML;
//! accessors return [`Duration`].

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Endpoint probed to test connectivity.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    #[serde(default)]
    pub url: String,
    /// Upper bound on a single probe (milliseconds).
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingField { field: "probe.url" });
        }
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidValue {
            field: "probe.url",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidValue {
                field: "probe.url",
                reason: format!("scheme must be ws or wss, got '{}'", url.scheme()),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Reconnection backoff for the connection manager.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectionConfig {
    /// Attempts before automatic reconnection gives up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first attempt (milliseconds).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on the pre-jitter delay (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Fraction of the delay used as jitter band width.
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_max_retries() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

fn default_jitter_factor() -> f64 {
    0.1
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl ReconnectionConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnection.base_delay_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "reconnection.max_delay_ms",
                reason: "must be >= base_delay_ms".to_string(),
            });
        }
        if !(self.backoff_multiplier >= 1.0 && self.backoff_multiplier.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "reconnection.backoff_multiplier",
                reason: "must be >= 1.0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::InvalidValue {
                field: "reconnection.jitter_factor",
                reason: "must be between 0 and 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Periodic monitoring cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Quality recomputation tick (milliseconds).
    #[serde(default = "default_quality_check_interval_ms")]
    pub quality_check_interval_ms: u64,
    /// Heartbeat probe cadence used by `linkwatch monitor` (milliseconds).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_quality_check_interval_ms() -> u64 {
    5000
}

fn default_heartbeat_interval_ms() -> u64 {
    15_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            quality_check_interval_ms: default_quality_check_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub const fn quality_check_interval(&self) -> Duration {
        Duration::from_millis(self.quality_check_interval_ms)
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.quality_check_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.quality_check_interval_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.heartbeat_interval_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time after the last failure before a trial call is let through.
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
    /// Reserved; failures are not decayed over this window yet.
    #[serde(default = "default_monitoring_period_ms")]
    pub monitoring_period_ms: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_ms() -> u64 {
    30_000
}

fn default_monitoring_period_ms() -> u64 {
    60_000
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
            monitoring_period_ms: default_monitoring_period_ms(),
        }
    }
}

impl CircuitBreakerConfig {
    #[must_use]
    pub const fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    #[must_use]
    pub const fn monitoring_period(&self) -> Duration {
        Duration::from_millis(self.monitoring_period_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "circuit_breaker.failure_threshold",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.reset_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "circuit_breaker.reset_timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Retry policy for `retry_with_backoff`.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_retry_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_retry_backoff_multiplier() -> f64 {
    2.0
}

fn default_retry_max_delay_ms() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
            backoff_multiplier: default_retry_backoff_multiplier(),
            max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Wait after the given 1-based failed attempt: `min(base * mult^(n-1), max)`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_secs_f64(capped / 1000.0)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_delay_ms",
                reason: "must be >= base_delay_ms".to_string(),
            });
        }
        if !(self.backoff_multiplier >= 1.0 && self.backoff_multiplier.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "retry.backoff_multiplier",
                reason: "must be >= 1.0".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything a `ConnectionResilienceManager` needs at construction.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub reconnection: ReconnectionConfig,
    /// Cadence of the quality check and metrics callback.
    pub quality_check_interval: Duration,
    /// Upper bound on one reconnection probe.
    pub probe_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            reconnection: ReconnectionConfig::default(),
            quality_check_interval: MonitorConfig::default().quality_check_interval(),
            probe_timeout: ProbeConfig::default().timeout(),
        }
    }
}
