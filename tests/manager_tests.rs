//! Integration tests for the connection resilience manager.
//!
//! All tests run on a paused clock so reconnection timers and the periodic
//! quality check fire deterministically.

use std::sync::Arc;
use std::time::Duration;

use linkwatch::config::{ReconnectionConfig, ResilienceConfig};
use linkwatch::domain::{AlertKind, QualityLevel, ALERT_CAPACITY};
use linkwatch::runtime::ConnectionResilienceManager;
use linkwatch::testkit::config;
use linkwatch::testkit::observer::RecordingObserver;
use linkwatch::testkit::probe::ScriptedProbe;

fn manager_with(
    config: ResilienceConfig,
    probe: ScriptedProbe,
) -> (ConnectionResilienceManager, Arc<ScriptedProbe>) {
    let probe = Arc::new(probe);
    let manager = ConnectionResilienceManager::new(config, probe.clone());
    manager.initialize("tenant-42");
    (manager, probe)
}

fn assert_delay_between(delay: Option<Duration>, min_ms: u64, max_ms: u64) {
    let delay = delay.expect("reconnection pending");
    assert!(
        delay >= Duration::from_millis(min_ms) && delay <= Duration::from_millis(max_ms),
        "delay {delay:?} outside [{min_ms}ms, {max_ms}ms]"
    );
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_with_each_failure() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    manager.notify_connection_failure("dropped");
    assert_delay_between(manager.connection_status().next_reconnect_in, 1000, 1050);

    manager.notify_connection_failure("dropped");
    assert_delay_between(manager.connection_status().next_reconnect_in, 1425, 1575);

    manager.notify_connection_failure("dropped");
    assert_delay_between(manager.connection_status().next_reconnect_in, 2137, 2363);
    assert_eq!(manager.connection_status().reconnection_attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn backoff_is_capped_at_max_delay() {
    let (manager, _) = manager_with(config::resilience_with_retries(50), ScriptedProbe::failing());

    for _ in 0..15 {
        manager.notify_connection_failure("dropped");
    }

    // 1.5^14 * 1s exceeds the 30s cap.
    assert_delay_between(manager.connection_status().next_reconnect_in, 28_500, 31_500);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_retries() {
    let (manager, probe) = manager_with(config::resilience_with_retries(2), ScriptedProbe::failing());

    manager.notify_connection_failure("socket closed");
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(probe.calls(), 2);
    let status = manager.connection_status();
    assert!(!status.connected);
    assert!(!status.reconnect_pending);
    assert_eq!(status.reconnection_attempts, 2);
    assert_eq!(status.metrics.reconnections, 2);

    let latest = &manager.alerts(false)[0];
    assert_eq!(latest.kind(), AlertKind::Critical);
    assert_eq!(
        latest.message(),
        "Reconnection attempts exhausted after 2 attempts"
    );
}

#[tokio::test(start_paused = true)]
async fn failed_probe_reports_error_as_last_error() {
    let (manager, _) = manager_with(config::resilience_with_retries(1), ScriptedProbe::failing());

    manager.notify_connection_failure("socket closed");
    tokio::time::sleep(Duration::from_secs(5)).await;

    let metrics = manager.metrics();
    assert_eq!(
        metrics.last_error.as_deref(),
        Some("connection error: connection refused")
    );
}

#[tokio::test(start_paused = true)]
async fn force_reconnection_recovers_after_exhaustion() {
    let probe = ScriptedProbe::failing()
        .with_outcomes(vec![Err("refused".into()), Ok(Duration::from_millis(40))]);
    let (manager, probe) = manager_with(config::resilience_with_retries(1), probe);
    let observer = Arc::new(RecordingObserver::new());
    manager.set_observer(observer.clone());

    manager.notify_connection_failure("socket closed");
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!manager.connection_status().reconnect_pending);

    manager.force_reconnection().await;

    assert_eq!(probe.calls(), 2);
    let status = manager.connection_status();
    assert!(status.connected);
    assert_eq!(status.reconnection_attempts, 0);
    assert!((status.metrics.latency_ms - 40.0).abs() < 1e-9);
    assert_eq!(observer.connection_changes(), vec![true]);
}

#[tokio::test(start_paused = true)]
async fn force_reconnection_replaces_pending_timer() {
    let (manager, probe) = manager_with(
        config::resilience(),
        ScriptedProbe::succeeding(Duration::from_millis(15)),
    );

    manager.notify_connection_failure("dropped");
    manager.notify_connection_failure("dropped");
    assert!(manager.connection_status().reconnect_pending);

    manager.force_reconnection().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(probe.calls(), 1);
    let status = manager.connection_status();
    assert!(status.connected);
    assert!(!status.reconnect_pending);
}

#[tokio::test(start_paused = true)]
async fn alert_log_keeps_newest_fifty() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    for _ in 0..60 {
        manager.notify_message_lost();
    }

    let alerts = manager.alerts(false);
    assert_eq!(alerts.len(), ALERT_CAPACITY);
    assert!(alerts[0].message().contains("60 lost"), "{}", alerts[0].message());
    assert!(alerts[ALERT_CAPACITY - 1].message().contains("11 lost"));
    assert!(alerts.iter().all(|a| a.kind() == AlertKind::Warning));
}

#[tokio::test(start_paused = true)]
async fn delivery_rate_counts_received_and_lost() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    for _ in 0..3 {
        manager.notify_message_received(None);
    }
    manager.notify_message_lost();

    let metrics = manager.metrics();
    assert_eq!(metrics.messages_received, 3);
    assert_eq!(metrics.messages_lost, 1);
    assert!((metrics.delivery_rate - 0.75).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn periodic_check_flags_low_delivery() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    manager.notify_message_received(None);
    manager.notify_message_lost();
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let latest = &manager.alerts(false)[0];
    assert_eq!(latest.kind(), AlertKind::Warning);
    assert_eq!(latest.message(), "Low message delivery rate: 50.0%");
}

#[tokio::test(start_paused = true)]
async fn periodic_check_flags_high_latency() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    manager.notify_message_received(Some(Duration::from_millis(2_500)));
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let latest = &manager.alerts(false)[0];
    assert_eq!(latest.kind(), AlertKind::Error);
    assert_eq!(latest.message(), "High latency: 2500ms");
}

#[tokio::test(start_paused = true)]
async fn resolved_alerts_are_filtered() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    manager.notify_message_lost();
    manager.notify_message_lost();
    let id = manager.alerts(false)[0].id().to_string();

    assert!(manager.resolve_alert(&id));
    assert!(!manager.resolve_alert("no-such-alert"));

    let unresolved = manager.alerts(true);
    assert_eq!(unresolved.len(), 1);
    assert_ne!(unresolved[0].id(), id);
    assert!(manager.alerts(false)[0].is_resolved());
}

#[tokio::test(start_paused = true)]
async fn reset_metrics_keeps_alerts_and_attempts() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    manager.notify_message_received(Some(Duration::from_millis(900)));
    manager.notify_message_lost();
    manager.notify_connection_failure("dropped");
    let alert_count = manager.alerts(false).len();

    manager.reset_metrics();

    let status = manager.connection_status();
    assert_eq!(status.metrics.messages_received, 0);
    assert_eq!(status.metrics.messages_lost, 0);
    assert_eq!(status.metrics.reconnections, 0);
    assert!((status.metrics.delivery_rate - 1.0).abs() < 1e-9);
    assert_eq!(status.metrics.latency_ms, 0.0);
    assert_eq!(status.reconnection_attempts, 1);
    assert_eq!(status.quality.level, QualityLevel::Excellent);
    assert_eq!(manager.alerts(false).len(), alert_count);
}

#[tokio::test(start_paused = true)]
async fn status_reports_identity() {
    let (manager, _) = manager_with(config::resilience(), ScriptedProbe::failing());

    let status = manager.connection_status();
    assert_eq!(status.identity.as_deref(), Some("tenant-42"));
    assert_eq!(manager.identity().as_deref(), Some("tenant-42"));
    assert!(!status.connected);
    assert_eq!(status.quality.score, 100);
}

#[tokio::test(start_paused = true)]
async fn probe_timeout_counts_as_failure() {
    let config = ResilienceConfig {
        reconnection: ReconnectionConfig {
            max_retries: 1,
            ..ReconnectionConfig::default()
        },
        probe_timeout: Duration::from_millis(500),
        ..ResilienceConfig::default()
    };
    let probe = ScriptedProbe::succeeding(Duration::from_millis(10))
        .with_delay(Duration::from_secs(5));
    let (manager, _) = manager_with(config, probe);

    manager.notify_connection_failure("dropped");
    tokio::time::sleep(Duration::from_secs(10)).await;

    let status = manager.connection_status();
    assert!(!status.connected);
    assert_eq!(
        status.metrics.last_error.as_deref(),
        Some("timed out after 500ms")
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_last_handle_stops_timers() {
    let probe = Arc::new(ScriptedProbe::failing());
    let manager = ConnectionResilienceManager::new(config::resilience(), probe.clone());

    manager.notify_connection_failure("dropped");
    drop(manager);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(probe.calls(), 0);
}
