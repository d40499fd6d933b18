//! Handler for `linkwatch monitor`.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::output::{self, Notice};
use crate::config::Config;
use crate::domain::{ConnectionAlert, ConnectionMetrics, ConnectionQuality};
use crate::error::Result;
use crate::runtime::{
    probe_within, ConnectionObserver, ConnectionProbe, ConnectionResilienceManager, WebSocketProbe,
};

/// Identity used when neither the file nor the environment sets one.
const DEFAULT_IDENTITY: &str = "default";

/// Consecutive failed heartbeats that count as a lost connection.
const HEARTBEAT_FAILURES_BEFORE_DISCONNECT: u32 = 2;

/// Prints manager events as they happen.
struct OutputObserver;

fn now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

impl ConnectionObserver for OutputObserver {
    fn on_connection_change(&self, connected: bool) {
        let message = if connected { "connected" } else { "disconnected" };
        output::event(&now(), "link", message);
    }

    fn on_quality_change(&self, quality: &ConnectionQuality) {
        output::event(
            &now(),
            "quality",
            &format!("{} (score {})", quality.level, quality.score),
        );
    }

    fn on_alert(&self, alert: &ConnectionAlert) {
        output::alert(
            &alert.timestamp().format("%H:%M:%S").to_string(),
            &alert.kind().to_string(),
            alert.message(),
        );
    }

    fn on_metrics_update(&self, metrics: &ConnectionMetrics) {
        if output::verbosity() == 0 {
            return;
        }
        output::event(
            &now(),
            "metrics",
            &format!(
                "latency {:.0}ms, delivery {:.1}%, errors {:.2}, reconnections {}",
                metrics.latency_ms,
                metrics.delivery_rate * 100.0,
                metrics.error_rate,
                metrics.reconnections
            ),
        );
    }
}

/// Monitor the configured endpoint until Ctrl-C.
pub async fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path.as_ref())?;
    config.init_logging();

    let probe = Arc::new(WebSocketProbe::parse(&config.probe.url)?);
    let identity = config
        .identity
        .clone()
        .unwrap_or_else(|| DEFAULT_IDENTITY.to_string());

    let manager = ConnectionResilienceManager::new(
        config.resilience(),
        Arc::clone(&probe) as Arc<dyn ConnectionProbe>,
    );
    manager.set_observer(Arc::new(OutputObserver));
    manager.initialize(identity.clone());

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Monitoring");
    output::field("Identity", &identity);
    output::field("Endpoint", probe.url());
    output::field(
        "Heartbeat",
        format!("every {}ms", config.monitor.heartbeat_interval_ms),
    );

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    let interrupted = tokio::select! {
        () = manager.force_reconnection() => false,
        _ = &mut shutdown => true,
    };
    if interrupted {
        info!("Shutdown signal received");
    } else {
        if !manager.connection_status().connected {
            output::notice(
                Notice::Warning,
                "Initial connection failed, retrying in the background",
            );
        }
        watch(&manager, &*probe, &config, shutdown.as_mut()).await;
    }

    let status = manager.connection_status();
    manager.destroy();

    output::section("Summary");
    output::field("Quality", format!("{} ({})", status.quality.level, status.quality.score));
    output::field("Received", status.metrics.messages_received);
    output::field("Lost", status.metrics.messages_lost);
    output::field("Reconnections", status.metrics.reconnections);
    output::field("Uptime", format!("{}s", status.metrics.uptime().as_secs()));
    Ok(())
}

/// Send heartbeats until `shutdown` resolves.
///
/// A heartbeat in flight is abandoned as soon as the signal arrives.
async fn watch<S>(
    manager: &ConnectionResilienceManager,
    probe: &dyn ConnectionProbe,
    config: &Config,
    mut shutdown: Pin<&mut S>,
) where
    S: Future,
{
    let heartbeat_timeout = config.probe.timeout();
    let mut heartbeat = interval(config.monitor.heartbeat_interval());
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    let mut failed_heartbeats = 0u32;
    loop {
        tokio::select! {
            _ = heartbeat.tick() => {}
            _ = shutdown.as_mut() => break,
        }
        if !manager.connection_status().connected {
            failed_heartbeats = 0;
            continue;
        }

        let result = tokio::select! {
            result = probe_within(probe, heartbeat_timeout) => result,
            _ = shutdown.as_mut() => break,
        };
        match result {
            Ok(latency) => {
                failed_heartbeats = 0;
                manager.notify_message_received(Some(latency));
            }
            Err(e) => {
                failed_heartbeats += 1;
                debug!(error = %e, failed_heartbeats, "Heartbeat failed");
                manager.notify_message_lost();
                if failed_heartbeats >= HEARTBEAT_FAILURES_BEFORE_DISCONNECT {
                    failed_heartbeats = 0;
                    manager.notify_connection_failure(&e.to_string());
                }
            }
        }
    }
    info!("Shutdown signal received");
}
