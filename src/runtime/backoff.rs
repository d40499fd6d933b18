//! Reconnection delay calculation.
//!
//! Exponential growth capped at `max_delay_ms`, then symmetric jitter of
//! half the jitter fraction either side, floored at [`MIN_RECONNECT_DELAY`].

use std::time::Duration;

use rand::Rng;

use crate::config::ReconnectionConfig;

/// Lower bound on any jittered reconnection delay.
pub const MIN_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Delay before jitter for the given 1-based attempt.
#[must_use]
pub fn base_delay(config: &ReconnectionConfig, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let scaled = config.base_delay_ms as f64 * config.backoff_multiplier.powi(exponent);
    let capped = scaled.min(config.max_delay_ms as f64);
    Duration::from_secs_f64(capped.max(0.0) / 1000.0)
}

/// Apply jitter to `base` using `sample`, a uniform value in `[0, 1)`.
#[must_use]
pub fn jittered(base: Duration, jitter_factor: f64, sample: f64) -> Duration {
    let base_ms = base.as_secs_f64() * 1000.0;
    let delay_ms = base_ms + base_ms * jitter_factor * (sample - 0.5);
    Duration::from_secs_f64(delay_ms.max(0.0) / 1000.0).max(MIN_RECONNECT_DELAY)
}

/// Jittered delay for the given 1-based attempt.
#[must_use]
pub fn reconnect_delay(config: &ReconnectionConfig, attempt: u32) -> Duration {
    let sample: f64 = rand::thread_rng().gen();
    jittered(base_delay(config, attempt), config.jitter_factor, sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ReconnectionConfig {
        ReconnectionConfig::default()
    }

    #[test]
    fn base_delay_grows_and_caps() {
        let config = config();
        assert_eq!(base_delay(&config, 1), Duration::from_millis(1000));
        assert_eq!(base_delay(&config, 2), Duration::from_millis(1500));
        assert_eq!(base_delay(&config, 3), Duration::from_millis(2250));
        assert_eq!(base_delay(&config, 20), Duration::from_millis(30_000));
    }

    #[test]
    fn jitter_is_symmetric() {
        let base = Duration::from_millis(10_000);
        assert_eq!(jittered(base, 0.1, 0.5), base);
        assert_eq!(jittered(base, 0.1, 0.0), Duration::from_millis(9_500));
        assert_eq!(jittered(base, 0.1, 1.0), Duration::from_millis(10_500));
    }

    #[test]
    fn jitter_is_floored_at_one_second() {
        let base = Duration::from_millis(1000);
        assert_eq!(jittered(base, 0.1, 0.0), MIN_RECONNECT_DELAY);
        assert_eq!(jittered(Duration::from_millis(10), 0.0, 0.5), MIN_RECONNECT_DELAY);
    }

    #[test]
    fn reconnect_delay_stays_in_band() {
        let config = config();
        for attempt in 1..=12 {
            let base = base_delay(&config, attempt);
            let delay = reconnect_delay(&config, attempt);
            let spread = base.mul_f64(config.jitter_factor / 2.0);

            assert!(delay >= MIN_RECONNECT_DELAY);
            assert!(delay <= base + spread + Duration::from_millis(1));
            assert!(delay + spread + Duration::from_millis(1) >= base || delay == MIN_RECONNECT_DELAY);
        }
    }
}
