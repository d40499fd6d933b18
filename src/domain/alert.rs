//! Connection alerts and the bounded alert log.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Maximum number of alerts retained; the oldest are evicted first.
pub const ALERT_CAPACITY: usize = 50;

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Error,
    Critical,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        })
    }
}

/// A raised alert. Everything except `resolved` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionAlert {
    id: String,
    kind: AlertKind,
    message: String,
    timestamp: DateTime<Utc>,
    resolved: bool,
}

impl ConnectionAlert {
    #[must_use]
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            resolved: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> AlertKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Newest-first alert history capped at [`ALERT_CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: VecDeque<ConnectionAlert>,
}

impl AlertLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            alerts: VecDeque::with_capacity(ALERT_CAPACITY),
        }
    }

    /// Insert at the front, dropping the oldest entry when full.
    pub fn push(&mut self, alert: ConnectionAlert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(ALERT_CAPACITY);
    }

    /// Mark an alert resolved. Returns `false` if the id is unknown.
    pub fn resolve(&mut self, id: &str) -> bool {
        match self.alerts.iter_mut().find(|alert| alert.id == id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Copy of the alerts, newest first.
    #[must_use]
    pub fn snapshot(&self, unresolved_only: bool) -> Vec<ConnectionAlert> {
        self.alerts
            .iter()
            .filter(|alert| !unresolved_only || !alert.resolved)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}
