//! Observer that records every callback for later assertions.

use parking_lot::Mutex;

use crate::domain::{ConnectionAlert, ConnectionMetrics, ConnectionQuality, QualityLevel};
use crate::runtime::ConnectionObserver;

/// One recorded callback.
#[derive(Debug, Clone)]
pub enum ObservedEvent {
    Connection(bool),
    Quality(ConnectionQuality),
    Alert(ConnectionAlert),
    Metrics(ConnectionMetrics),
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    pub fn connection_changes(&self) -> Vec<bool> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Connection(connected) => Some(*connected),
                _ => None,
            })
            .collect()
    }

    pub fn quality_levels(&self) -> Vec<QualityLevel> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Quality(quality) => Some(quality.level),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<ConnectionAlert> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Alert(alert) => Some(alert.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn metrics_updates(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, ObservedEvent::Metrics(_)))
            .count()
    }
}

impl ConnectionObserver for RecordingObserver {
    fn on_connection_change(&self, connected: bool) {
        self.events.lock().push(ObservedEvent::Connection(connected));
    }

    fn on_quality_change(&self, quality: &ConnectionQuality) {
        self.events.lock().push(ObservedEvent::Quality(*quality));
    }

    fn on_alert(&self, alert: &ConnectionAlert) {
        self.events.lock().push(ObservedEvent::Alert(alert.clone()));
    }

    fn on_metrics_update(&self, metrics: &ConnectionMetrics) {
        self.events.lock().push(ObservedEvent::Metrics(metrics.clone()));
    }
}
