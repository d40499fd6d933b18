//! Health tracking and automatic reconnection for one realtime connection.
//!
//! The manager is driven by notifications from whatever owns the actual
//! connection (`notify_connection_success`, `notify_message_lost`, ...). It
//! keeps rolling metrics, derives a [`ConnectionQuality`], raises alerts and,
//! after a failure, schedules a single reconnection attempt with exponential
//! backoff and jitter. A reconnection attempt runs the configured
//! [`ConnectionProbe`] and feeds its outcome back as a success or failure.
//!
//! # Timers
//!
//! At most one reconnection timer is pending at any time; scheduling a new
//! one cancels the previous. A periodic task recomputes quality every
//! `quality_check_interval`. Both hold only a weak reference to the manager
//! and are aborted by [`ConnectionResilienceManager::destroy`] or when the
//! last handle is dropped.
//!
//! # Observers
//!
//! Callbacks run after the internal lock is released, in the order the
//! events happened, so an observer may call the read accessors.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ResilienceConfig;
use crate::domain::{
    AlertKind, AlertLog, ConnectionAlert, ConnectionMetrics, ConnectionQuality, ConnectionStatus,
    LatencyWindow, QualityLevel,
};

use super::backoff;
use super::observer::{ConnectionObserver, NoopObserver};
use super::probe::{probe_within, ConnectionProbe};
use super::timer::ScheduledTask;

/// Delivery rate below which the periodic check raises a warning.
const LOW_DELIVERY_RATE: f64 = 0.8;

/// Average latency above which the periodic check raises an error alert.
const HIGH_LATENCY_MS: f64 = 2000.0;

/// An observer call queued while the state lock is held.
enum Notification {
    Connection(bool),
    Quality(ConnectionQuality),
    Alert(ConnectionAlert),
    Metrics(ConnectionMetrics),
}

struct PendingReconnect {
    generation: u64,
    task: ScheduledTask,
}

struct State {
    /// Logical owner of the connection, set by `initialize`.
    identity: Option<String>,
    /// Start of the uptime clock.
    started_at: Instant,
    connected: bool,
    /// Attempts since the last success; reset on success or forced reconnect.
    reconnection_attempts: u32,
    metrics: ConnectionMetrics,
    /// Last 20 latency samples.
    latency: LatencyWindow,
    /// Last assessed quality, compared against to detect level changes.
    quality: ConnectionQuality,
    /// Newest first, capped.
    alerts: AlertLog,
    observer: Arc<dyn ConnectionObserver>,
    /// The single scheduled reconnection, if any.
    reconnect: Option<PendingReconnect>,
    /// Tag for the next reconnection timer; stale timers see a mismatch.
    next_generation: u64,
    /// Periodic quality check, started lazily.
    quality_check: Option<ScheduledTask>,
    /// Set by `destroy`; timers stop rescheduling.
    destroyed: bool,
    /// Observer calls to dispatch once the lock is released.
    outbox: Vec<Notification>,
}

impl State {
    fn new() -> Self {
        Self {
            identity: None,
            started_at: Instant::now(),
            connected: false,
            reconnection_attempts: 0,
            metrics: ConnectionMetrics::default(),
            latency: LatencyWindow::new(),
            quality: ConnectionQuality::default(),
            alerts: AlertLog::new(),
            observer: Arc::new(NoopObserver),
            reconnect: None,
            next_generation: 0,
            quality_check: None,
            destroyed: false,
            outbox: Vec::new(),
        }
    }

    fn raise(&mut self, kind: AlertKind, message: impl Into<String>) {
        let alert = ConnectionAlert::new(kind, message);
        self.alerts.push(alert.clone());
        self.outbox.push(Notification::Alert(alert));
    }

    fn record_latency(&mut self, latency: Option<Duration>) {
        if let Some(latency) = latency {
            self.latency.push(latency);
            self.metrics.latency_ms = self.latency.mean_ms();
        }
    }

    fn refresh_uptime(&mut self) {
        self.metrics.set_uptime(self.started_at.elapsed());
    }

    /// Recompute quality; notify only when the level moves.
    fn refresh_quality(&mut self) {
        self.refresh_uptime();
        let previous = self.quality.level;
        self.quality = ConnectionQuality::assess(&self.metrics, !self.latency.is_empty());

        if self.quality.level == previous {
            return;
        }

        info!(
            identity = ?self.identity,
            from = %previous,
            to = %self.quality.level,
            score = self.quality.score,
            "Connection quality changed"
        );
        self.outbox.push(Notification::Quality(self.quality));

        if self.quality.level == QualityLevel::Critical {
            let message = format!("Connection quality critical (score {})", self.quality.score);
            self.raise(AlertKind::Critical, message);
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(pending) = self.reconnect.take() {
            pending.task.cancel();
        }
    }

    fn metrics_snapshot(&self) -> ConnectionMetrics {
        let mut metrics = self.metrics.clone();
        if !self.destroyed {
            metrics.set_uptime(self.started_at.elapsed());
        }
        metrics
    }
}

struct Inner {
    config: ResilienceConfig,
    probe: Arc<dyn ConnectionProbe>,
    state: Mutex<State>,
}

impl Inner {
    /// Mutate state under the lock, then deliver queued notifications.
    fn update<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let (result, observer, outbox) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            let outbox = std::mem::take(&mut state.outbox);
            (result, state.observer.clone(), outbox)
        };

        for notification in outbox {
            match notification {
                Notification::Connection(connected) => observer.on_connection_change(connected),
                Notification::Quality(quality) => observer.on_quality_change(&quality),
                Notification::Alert(alert) => observer.on_alert(&alert),
                Notification::Metrics(metrics) => observer.on_metrics_update(&metrics),
            }
        }
        result
    }

    fn connection_succeeded(&self, latency: Option<Duration>) {
        self.update(|state| {
            let was_connected = state.connected;
            let prior_attempts = state.reconnection_attempts;

            state.connected = true;
            state.reconnection_attempts = 0;
            state.cancel_reconnect();
            state.record_latency(latency);

            if !was_connected {
                info!(
                    identity = ?state.identity,
                    latency_ms = latency.map(|l| l.as_millis() as u64),
                    "Connection established"
                );
                state.outbox.push(Notification::Connection(true));
                if prior_attempts > 0 {
                    state.raise(
                        AlertKind::Warning,
                        format!(
                            "Connection restored after {prior_attempts} reconnection attempt(s)"
                        ),
                    );
                }
            }

            state.refresh_quality();
        });
    }

    fn connection_failed(self: &Arc<Self>, message: &str) {
        self.update(|state| {
            let was_connected = state.connected;

            state.connected = false;
            state.metrics.record_failure(message);
            warn!(identity = ?state.identity, error = message, "Connection failure");
            state.raise(AlertKind::Error, format!("Connection failed: {message}"));

            if was_connected {
                state.outbox.push(Notification::Connection(false));
            }

            state.refresh_quality();
            self.schedule_reconnection(state);
        });
    }

    fn schedule_reconnection(self: &Arc<Self>, state: &mut State) {
        if state.destroyed {
            return;
        }

        let max_retries = self.config.reconnection.max_retries;
        if state.reconnection_attempts >= max_retries {
            state.cancel_reconnect();
            error!(
                identity = ?state.identity,
                attempts = state.reconnection_attempts,
                "Reconnection attempts exhausted"
            );
            state.raise(
                AlertKind::Critical,
                format!("Reconnection attempts exhausted after {max_retries} attempts"),
            );
            return;
        }

        state.reconnection_attempts += 1;
        state.metrics.reconnections += 1;
        let attempt = state.reconnection_attempts;
        let delay = backoff::reconnect_delay(&self.config.reconnection, attempt);

        state.cancel_reconnect();
        let generation = state.next_generation;
        state.next_generation += 1;

        let weak: Weak<Self> = Arc::downgrade(self);
        let task = ScheduledTask::once(delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.fire_reconnect(generation).await;
            }
        });
        state.reconnect = Some(PendingReconnect { generation, task });

        info!(
            identity = ?state.identity,
            attempt,
            max_retries,
            delay_ms = delay.as_millis() as u64,
            "Reconnection scheduled"
        );
    }

    async fn fire_reconnect(self: Arc<Self>, generation: u64) {
        {
            let mut state = self.state.lock();
            match state.reconnect.take() {
                Some(pending) if pending.generation == generation => pending.task.detach(),
                other => {
                    // Superseded by a newer schedule.
                    state.reconnect = other;
                    return;
                }
            }
        }
        self.attempt_reconnection().await;
    }

    async fn attempt_reconnection(self: &Arc<Self>) {
        let attempt = {
            let state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.reconnection_attempts
        };
        debug!(attempt, target = self.probe.target(), "Attempting reconnection");

        let outcome = probe_within(self.probe.as_ref(), self.config.probe_timeout).await;

        if self.state.lock().destroyed {
            debug!("Manager destroyed during reconnection probe, discarding result");
            return;
        }

        match outcome {
            Ok(latency) => self.connection_succeeded(Some(latency)),
            Err(e) => self.connection_failed(&e.to_string()),
        }
    }

    /// Periodic quality check. Returns `false` once the manager is destroyed.
    fn tick(&self) -> bool {
        self.update(|state| {
            if state.destroyed {
                return false;
            }

            state.refresh_quality();
            state
                .outbox
                .push(Notification::Metrics(state.metrics.clone()));

            if state.metrics.delivery_rate < LOW_DELIVERY_RATE {
                let message = format!(
                    "Low message delivery rate: {:.1}%",
                    state.metrics.delivery_rate * 100.0
                );
                state.raise(AlertKind::Warning, message);
            }
            if state.metrics.latency_ms > HIGH_LATENCY_MS {
                let message = format!("High latency: {:.0}ms", state.metrics.latency_ms);
                state.raise(AlertKind::Error, message);
            }
            true
        })
    }
}

/// Watches one logical connection and reconnects it when it fails.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct ConnectionResilienceManager {
    inner: Arc<Inner>,
}

impl ConnectionResilienceManager {
    /// Create a manager and start its periodic quality check.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime or if the quality check
    /// interval is zero.
    pub fn new(config: ResilienceConfig, probe: Arc<dyn ConnectionProbe>) -> Self {
        let interval = config.quality_check_interval;
        let inner = Arc::new(Inner {
            config,
            probe,
            state: Mutex::new(State::new()),
        });

        let weak = Arc::downgrade(&inner);
        let quality_check = ScheduledTask::every(interval, move || {
            weak.upgrade().map_or(false, |inner| inner.tick())
        });
        inner.state.lock().quality_check = Some(quality_check);

        Self { inner }
    }

    /// Bind the manager to a connection owner and restart the uptime clock.
    pub fn initialize(&self, identity: impl Into<String>) {
        let identity = identity.into();
        info!(identity = %identity, "Connection manager initialized");
        let mut state = self.inner.state.lock();
        state.identity = Some(identity);
        state.started_at = Instant::now();
    }

    /// Register the observer that receives connection events.
    pub fn set_observer(&self, observer: Arc<dyn ConnectionObserver>) {
        self.inner.state.lock().observer = observer;
    }

    /// The link is up. Resets the reconnection counter.
    pub fn notify_connection_success(&self, latency: Option<Duration>) {
        self.inner.connection_succeeded(latency);
    }

    /// The link failed. Schedules a reconnection unless retries are exhausted.
    pub fn notify_connection_failure(&self, message: &str) {
        self.inner.connection_failed(message);
    }

    /// A message arrived, optionally with its measured latency.
    pub fn notify_message_received(&self, latency: Option<Duration>) {
        self.inner.update(|state| {
            state.metrics.record_received();
            state.record_latency(latency);
            state.refresh_quality();
        });
    }

    /// A message was lost. Raises a warning alert.
    pub fn notify_message_lost(&self) {
        self.inner.update(|state| {
            state.metrics.record_lost();
            state.refresh_quality();
            let message = format!(
                "Message lost ({} lost so far)",
                state.metrics.messages_lost
            );
            state.raise(AlertKind::Warning, message);
        });
    }

    /// Cancel any pending attempt, reset the counter, and probe right away.
    pub async fn force_reconnection(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            state.cancel_reconnect();
            state.reconnection_attempts = 0;
            info!(identity = ?state.identity, "Forced reconnection");
        }
        self.inner.attempt_reconnection().await;
    }

    /// Snapshot of the current metrics with uptime filled in.
    #[must_use]
    pub fn metrics(&self) -> ConnectionMetrics {
        self.inner.state.lock().metrics_snapshot()
    }

    /// Quality as of the last recomputation.
    #[must_use]
    pub fn quality(&self) -> ConnectionQuality {
        self.inner.state.lock().quality
    }

    /// Alerts, newest first.
    #[must_use]
    pub fn alerts(&self, unresolved_only: bool) -> Vec<ConnectionAlert> {
        self.inner.state.lock().alerts.snapshot(unresolved_only)
    }

    /// Connection flag, reconnection progress, quality and metrics in one read.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        let state = self.inner.state.lock();
        ConnectionStatus {
            identity: state.identity.clone(),
            connected: state.connected,
            reconnection_attempts: state.reconnection_attempts,
            reconnect_pending: state.reconnect.is_some(),
            next_reconnect_in: state.reconnect.as_ref().map(|p| p.task.remaining()),
            quality: state.quality,
            metrics: state.metrics_snapshot(),
        }
    }

    /// Identity bound by [`Self::initialize`].
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        self.inner.state.lock().identity.clone()
    }

    /// Mark an alert resolved. Returns `false` if no alert has that id.
    pub fn resolve_alert(&self, id: &str) -> bool {
        self.inner.state.lock().alerts.resolve(id)
    }

    /// Zero all counters and the latency history and restart the uptime
    /// clock. Alerts and the reconnection counter are kept.
    pub fn reset_metrics(&self) {
        self.inner.update(|state| {
            state.metrics = ConnectionMetrics::default();
            state.latency.clear();
            state.started_at = Instant::now();
            state.refresh_quality();
        });
    }

    /// Stop all timers and drop alert and latency history.
    ///
    /// Reads keep returning the last state; nothing is scheduled afterwards.
    pub fn destroy(&self) {
        let mut state = self.inner.state.lock();
        if state.destroyed {
            return;
        }
        state.refresh_uptime();
        state.destroyed = true;
        state.cancel_reconnect();
        if let Some(task) = state.quality_check.take() {
            task.cancel();
        }
        state.alerts.clear();
        state.latency.clear();
        info!(identity = ?state.identity, "Connection manager destroyed");
    }
}

impl std::fmt::Debug for ConnectionResilienceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ConnectionResilienceManager")
            .field("identity", &state.identity)
            .field("connected", &state.connected)
            .field("reconnection_attempts", &state.reconnection_attempts)
            .field("destroyed", &state.destroyed)
            .finish_non_exhaustive()
    }
}
