//! Composite connection quality score.
//!
//! The score is the rounded mean of three sub-scores:
//!
//! - **Latency**: rolling average round trip
//! - **Stability**: reconnections per minute of uptime
//! - **Reliability**: delivery rate against error rate
//!
//! The level thresholds are fixed breakpoints, not configuration.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::metrics::ConnectionMetrics;

const EXCELLENT_FLOOR: u8 = 90;
const GOOD_FLOOR: u8 = 70;
const POOR_FLOOR: u8 = 40;

/// Discretized quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Excellent,
    Good,
    Poor,
    Critical,
}

impl QualityLevel {
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score >= EXCELLENT_FLOOR {
            Self::Excellent
        } else if score >= GOOD_FLOOR {
            Self::Good
        } else if score >= POOR_FLOOR {
            Self::Poor
        } else {
            Self::Critical
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Poor => "poor",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The sub-scores that produced a [`ConnectionQuality`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityFactors {
    pub latency: f64,
    pub stability: f64,
    pub reliability: f64,
}

/// Derived 0-100 health of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConnectionQuality {
    pub score: u8,
    pub level: QualityLevel,
    pub factors: QualityFactors,
}

impl ConnectionQuality {
    /// Score the given metrics.
    ///
    /// `has_latency_samples` distinguishes "no samples yet" (full marks)
    /// from a measured average.
    #[must_use]
    pub fn assess(metrics: &ConnectionMetrics, has_latency_samples: bool) -> Self {
        let factors = QualityFactors {
            latency: if has_latency_samples {
                latency_score(metrics.latency_ms)
            } else {
                100.0
            },
            stability: stability_score(metrics.reconnections, metrics.uptime()),
            reliability: reliability_score(metrics.delivery_rate, metrics.error_rate),
        };
        let mean = (factors.latency + factors.stability + factors.reliability) / 3.0;
        let score = mean.round().clamp(0.0, 100.0) as u8;

        Self {
            score,
            level: QualityLevel::from_score(score),
            factors,
        }
    }
}

impl Default for ConnectionQuality {
    fn default() -> Self {
        Self::assess(&ConnectionMetrics::default(), false)
    }
}

/// Latency sub-score for an average round trip in milliseconds.
#[must_use]
pub fn latency_score(latency_ms: f64) -> f64 {
    if latency_ms < 100.0 {
        100.0
    } else if latency_ms < 300.0 {
        80.0
    } else if latency_ms < 1000.0 {
        50.0
    } else {
        20.0
    }
}

/// Stability sub-score from reconnections per minute of uptime.
///
/// Reconnections with zero uptime count as an unbounded rate.
#[must_use]
pub fn stability_score(reconnections: u32, uptime: Duration) -> f64 {
    if reconnections == 0 {
        return 100.0;
    }
    let minutes = uptime.as_secs_f64() / 60.0;
    let per_minute = f64::from(reconnections) / minutes;
    if per_minute < 0.5 {
        80.0
    } else if per_minute < 2.0 {
        50.0
    } else {
        20.0
    }
}

/// Reliability sub-score: mean of delivery and inverted error rate.
#[must_use]
pub fn reliability_score(delivery_rate: f64, error_rate: f64) -> f64 {
    (delivery_rate * 100.0 + (100.0 - error_rate * 100.0)) / 2.0
}
