//! Configuration and connection check handlers.

use std::path::Path;
use std::sync::Arc;

use super::output::{self, Notice};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::recovery::{CircuitBreaker, ErrorRecovery, RecoveryOptions};
use crate::runtime::{probe_within, WebSocketProbe};

/// Validate the configuration file without connecting.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::notice(Notice::Success, "Configuration file is valid");

    output::section("Summary");
    output::field("Identity", config.identity.as_deref().unwrap_or("(unset)"));
    output::field("Endpoint", &config.probe.url);
    output::field("Probe timeout", format!("{}ms", config.probe.timeout_ms));
    output::field(
        "Reconnection",
        format!(
            "{} retries, {}ms base, x{}, {}ms cap, {:.0}% jitter",
            config.reconnection.max_retries,
            config.reconnection.base_delay_ms,
            config.reconnection.backoff_multiplier,
            config.reconnection.max_delay_ms,
            config.reconnection.jitter_factor * 100.0
        ),
    );
    output::field(
        "Breaker",
        format!(
            "opens after {} failures, resets after {}ms",
            config.circuit_breaker.failure_threshold, config.circuit_breaker.reset_timeout_ms
        ),
    );
    output::field(
        "Retry",
        format!(
            "{} attempts, {}ms base, x{}, {}ms cap",
            config.retry.max_attempts,
            config.retry.base_delay_ms,
            config.retry.backoff_multiplier,
            config.retry.max_delay_ms
        ),
    );
    output::field(
        "Heartbeat",
        format!("every {}ms", config.monitor.heartbeat_interval_ms),
    );

    if config.identity.is_none() {
        output::notice(Notice::Hint, "set `identity` or LINKWATCH_IDENTITY to label alerts");
    }

    Ok(())
}

/// Probe the endpoint through the circuit breaker and retry policy.
pub async fn execute_connection<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path.as_ref())?;
    config.init_logging();

    let probe = WebSocketProbe::parse(&config.probe.url)?;
    let timeout = config.probe.timeout();
    let recovery = ErrorRecovery::new(
        Arc::new(CircuitBreaker::new(config.circuit_breaker.clone())),
        config.retry.clone(),
    );

    output::section("Connection Check");
    output::field("Endpoint", probe.url());
    output::field("Timeout", format!("{}ms", config.probe.timeout_ms));

    let pb = output::spinner("Probing endpoint...");
    let target = &probe;
    let outcome = recovery
        .recover(
            move || probe_within(target, timeout),
            || {
                Err(Error::Connection(format!(
                    "{} unreachable",
                    config.probe.url
                )))
            },
            RecoveryOptions::default().with_context("check connection"),
        )
        .await;

    let attempts = outcome.attempts;
    let method = outcome.method;
    match outcome.result {
        Ok(latency) => {
            output::finish_spinner(
                &pb,
                true,
                &format!(
                    "Connected in {}ms",
                    output::highlight(latency.as_millis())
                ),
            );
            output::field("Attempts", attempts);
            output::field("Recovered by", method);
            Ok(())
        }
        Err(e) => {
            output::finish_spinner(
                &pb,
                false,
                &format!("Connection failed after {attempts} attempt(s)"),
            );
            output::field("Breaker", recovery.breaker().state());
            Err(e)
        }
    }
}
