//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. `LINKWATCH_PROBE_URL` and
//! `LINKWATCH_IDENTITY` override the file so deployments can keep one
//! config per environment.

use serde::Deserialize;
use std::path::Path;

use crate::error::{ConfigError, Result};

mod logging;
mod resilience;

pub use logging::LoggingConfig;
pub use resilience::{
    CircuitBreakerConfig, MonitorConfig, ProbeConfig, ReconnectionConfig, ResilienceConfig,
    RetryConfig,
};

/// Environment variable overriding `probe.url`.
pub const PROBE_URL_ENV: &str = "LINKWATCH_PROBE_URL";

/// Environment variable overriding `identity`.
pub const IDENTITY_ENV: &str = "LINKWATCH_IDENTITY";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logical owner of the monitored connection (tenant, company, ...).
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub reconnection: ReconnectionConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Read, apply environment overrides, and validate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or a
    /// value is out of range.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse and validate TOML without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on parse or validation failure.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(PROBE_URL_ENV) {
            if !url.is_empty() {
                self.probe.url = url;
            }
        }
        if let Ok(identity) = std::env::var(IDENTITY_ENV) {
            if !identity.is_empty() {
                self.identity = Some(identity);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.probe.validate()?;
        self.reconnection.validate()?;
        self.monitor.validate()?;
        self.circuit_breaker.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    /// Settings for a `ConnectionResilienceManager`.
    #[must_use]
    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig {
            reconnection: self.reconnection.clone(),
            quality_check_interval: self.monitor.quality_check_interval(),
            probe_timeout: self.probe.timeout(),
        }
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
