//! Observer hooks for connection state changes.

use tracing::{error, info, warn};

use crate::domain::{AlertKind, ConnectionAlert, ConnectionMetrics, ConnectionQuality};

/// Receives connection events from a `ConnectionResilienceManager`.
///
/// Every method has a no-op default. `on_metrics_update` fires on every
/// periodic tick even when nothing changed, so implementations should be
/// idempotent. Connection and quality callbacks fire only on real changes.
pub trait ConnectionObserver: Send + Sync {
    fn on_connection_change(&self, _connected: bool) {}

    fn on_quality_change(&self, _quality: &ConnectionQuality) {}

    fn on_alert(&self, _alert: &ConnectionAlert) {}

    fn on_metrics_update(&self, _metrics: &ConnectionMetrics) {}
}

/// Observer that ignores everything. Installed until one is registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ConnectionObserver for NoopObserver {}

/// Observer that forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ConnectionObserver for TracingObserver {
    fn on_connection_change(&self, connected: bool) {
        if connected {
            info!("Connection established");
        } else {
            warn!("Connection lost");
        }
    }

    fn on_quality_change(&self, quality: &ConnectionQuality) {
        info!(
            score = quality.score,
            level = %quality.level,
            "Connection quality changed"
        );
    }

    fn on_alert(&self, alert: &ConnectionAlert) {
        match alert.kind() {
            AlertKind::Warning => warn!(id = alert.id(), "{}", alert.message()),
            AlertKind::Error | AlertKind::Critical => {
                error!(id = alert.id(), kind = %alert.kind(), "{}", alert.message());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::runtime::ConnectionResilienceManager;
    use crate::testkit::observer::{ObservedEvent, RecordingObserver};
    use crate::testkit::{config, probe::ScriptedProbe};

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tracing_observer_logs_each_event() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let manager = ConnectionResilienceManager::new(
            config::resilience(),
            Arc::new(ScriptedProbe::failing()),
        );
        manager.set_observer(Arc::new(TracingObserver));

        manager.notify_connection_success(None);
        manager.notify_message_lost();
        manager.notify_connection_failure("dropped");

        let text = logs.text();
        let from_observer: Vec<&str> = text
            .lines()
            .filter(|line| line.contains("linkwatch::runtime::observer"))
            .collect();
        let logged = |level: &str, needle: &str| {
            from_observer
                .iter()
                .any(|line| line.contains(level) && line.contains(needle))
        };

        assert!(logged("INFO", "Connection established"), "{text}");
        assert!(logged("WARN", "Message lost (1 lost so far)"), "{text}");
        assert!(logged("WARN", "Connection lost"), "{text}");
        assert!(logged("ERROR", "kind=error"), "{text}");
    }

    #[tokio::test(start_paused = true)]
    async fn events_arrive_in_order() {
        let manager = ConnectionResilienceManager::new(
            config::resilience(),
            Arc::new(ScriptedProbe::failing()),
        );
        let observer = Arc::new(RecordingObserver::new());
        manager.set_observer(observer.clone());

        manager.notify_connection_success(None);
        manager.notify_message_lost();

        let events = observer.events();
        assert!(matches!(events[0], ObservedEvent::Connection(true)));
        assert!(matches!(events[1], ObservedEvent::Quality(_)));
        assert!(matches!(events[2], ObservedEvent::Alert(_)));
        assert_eq!(events.len(), 3);
    }
}
