//! Runtime-agnostic health types: metrics, quality, alerts, error classes.

pub mod alert;
pub mod classify;
pub mod metrics;
pub mod quality;

pub use alert::{AlertKind, AlertLog, ConnectionAlert, ALERT_CAPACITY};
pub use classify::{categorize_error, ErrorCategory, ErrorClassification, Severity};
pub use metrics::{ConnectionMetrics, ConnectionStatus, LatencyWindow, LATENCY_WINDOW};
pub use quality::{ConnectionQuality, QualityFactors, QualityLevel};
