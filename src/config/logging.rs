//! Logging configuration and initialization.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// `pretty` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".into()
}

fn default_format() -> String {
    "pretty".into()
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// `RUST_LOG` takes precedence over the configured level. Calling this
    /// twice is harmless; the second subscriber is ignored. Logs go to stderr
    /// so stdout stays free for command output.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let _ = match self.format.as_str() {
            "json" => fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
            _ => fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
        };
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected 'pretty' or 'json', got '{}'", self.format),
            });
        }
        if EnvFilter::try_new(&self.level).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: format!("'{}' is not a valid filter directive", self.level),
            });
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}
