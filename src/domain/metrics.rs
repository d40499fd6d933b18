//! Connection health counters and the latency sampling window.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use super::quality::ConnectionQuality;

/// Number of latency samples kept for the rolling average.
pub const LATENCY_WINDOW: usize = 20;

/// Error rate added for every connection failure.
const ERROR_RATE_STEP_UP: f64 = 0.1;

/// Error rate removed for every successfully received message.
const ERROR_RATE_DECAY: f64 = 0.01;

/// Health counters for one monitored connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionMetrics {
    /// Mean of the sampled latencies in milliseconds, 0 without samples.
    pub latency_ms: f64,
    /// `received / (received + lost)`, 1.0 before any message.
    pub delivery_rate: f64,
    /// Heuristic failure pressure in `[0, 1]`.
    pub error_rate: f64,
    /// Total reconnection attempts scheduled.
    pub reconnections: u32,
    pub uptime_ms: u64,
    pub last_error: Option<String>,
    pub messages_received: u64,
    pub messages_lost: u64,
}

impl Default for ConnectionMetrics {
    fn default() -> Self {
        Self {
            latency_ms: 0.0,
            delivery_rate: 1.0,
            error_rate: 0.0,
            reconnections: 0,
            uptime_ms: 0,
            last_error: None,
            messages_received: 0,
            messages_lost: 0,
        }
    }
}

impl ConnectionMetrics {
    /// Count a received message and relax the error rate.
    pub fn record_received(&mut self) {
        self.messages_received += 1;
        self.error_rate = (self.error_rate - ERROR_RATE_DECAY).max(0.0);
        self.refresh_delivery_rate();
    }

    /// Count a lost message.
    pub fn record_lost(&mut self) {
        self.messages_lost += 1;
        self.refresh_delivery_rate();
    }

    /// Record a connection failure message and raise the error rate.
    pub fn record_failure(&mut self, message: &str) {
        self.last_error = Some(message.to_string());
        self.error_rate = (self.error_rate + ERROR_RATE_STEP_UP).min(1.0);
    }

    pub fn set_uptime(&mut self, uptime: Duration) {
        self.uptime_ms = u64::try_from(uptime.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn uptime(&self) -> Duration {
        Duration::from_millis(self.uptime_ms)
    }

    fn refresh_delivery_rate(&mut self) {
        let total = self.messages_received + self.messages_lost;
        self.delivery_rate = if total == 0 {
            1.0
        } else {
            self.messages_received as f64 / total as f64
        };
    }
}

/// Bounded FIFO of latency samples with an unweighted mean.
#[derive(Debug, Clone, Default)]
pub struct LatencyWindow {
    samples: VecDeque<f64>,
}

impl LatencyWindow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(LATENCY_WINDOW),
        }
    }

    /// Add a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, latency: Duration) {
        self.samples.push_back(latency.as_secs_f64() * 1000.0);
        while self.samples.len() > LATENCY_WINDOW {
            self.samples.pop_front();
        }
    }

    /// Arithmetic mean in milliseconds, 0 when empty.
    #[must_use]
    pub fn mean_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Point-in-time view of a manager, as returned by `connection_status`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub identity: Option<String>,
    pub connected: bool,
    pub reconnection_attempts: u32,
    /// Whether a reconnection timer is currently scheduled.
    pub reconnect_pending: bool,
    /// Time left until the scheduled reconnection fires.
    #[serde(serialize_with = "serialize_optional_millis")]
    pub next_reconnect_in: Option<Duration>,
    pub quality: ConnectionQuality,
    pub metrics: ConnectionMetrics,
}

fn serialize_optional_millis<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn delivery_rate_starts_at_one() {
        let metrics = ConnectionMetrics::default();
        assert_eq!(metrics.delivery_rate, 1.0);
    }

    #[test]
    fn delivery_rate_tracks_received_and_lost() {
        let mut metrics = ConnectionMetrics::default();
        for _ in 0..3 {
            metrics.record_received();
        }
        metrics.record_lost();

        assert_eq!(metrics.messages_received, 3);
        assert_eq!(metrics.messages_lost, 1);
        assert!((metrics.delivery_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn delivery_rate_is_zero_when_everything_is_lost() {
        let mut metrics = ConnectionMetrics::default();
        metrics.record_lost();
        metrics.record_lost();
        assert_eq!(metrics.delivery_rate, 0.0);
    }

    #[test]
    fn error_rate_is_clamped() {
        let mut metrics = ConnectionMetrics::default();
        for _ in 0..15 {
            metrics.record_failure("boom");
        }
        assert_eq!(metrics.error_rate, 1.0);
        assert_eq!(metrics.last_error.as_deref(), Some("boom"));

        let mut metrics = ConnectionMetrics::default();
        metrics.record_received();
        assert_eq!(metrics.error_rate, 0.0);
    }

    #[test]
    fn error_rate_decays_per_message() {
        let mut metrics = ConnectionMetrics::default();
        metrics.record_failure("boom");
        metrics.record_received();
        assert!((metrics.error_rate - 0.09).abs() < 1e-9);
    }

    #[test]
    fn latency_window_keeps_last_twenty() {
        let mut window = LatencyWindow::new();
        window.push(ms(1000));
        for _ in 0..LATENCY_WINDOW {
            window.push(ms(100));
        }

        assert_eq!(window.len(), LATENCY_WINDOW);
        assert!((window.mean_ms() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn latency_window_mean_is_unweighted() {
        let mut window = LatencyWindow::new();
        window.push(ms(100));
        window.push(ms(300));
        assert!((window.mean_ms() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn empty_latency_window_has_zero_mean() {
        assert_eq!(LatencyWindow::new().mean_ms(), 0.0);
    }
}
