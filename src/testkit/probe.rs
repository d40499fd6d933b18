//! Mock [`ConnectionProbe`] for driving reconnection logic in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::runtime::ConnectionProbe;

/// A probe with a queue of scripted outcomes.
///
/// Each call pops the next outcome; once the queue is empty every call
/// returns the fallback outcome.
pub struct ScriptedProbe {
    outcomes: Mutex<VecDeque<std::result::Result<Duration, String>>>,
    fallback: std::result::Result<Duration, String>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl ScriptedProbe {
    /// Every probe fails with a connection error.
    pub fn failing() -> Self {
        Self::with_fallback(Err("connection refused".to_string()))
    }

    /// Every probe succeeds with `latency`.
    pub fn succeeding(latency: Duration) -> Self {
        Self::with_fallback(Ok(latency))
    }

    fn with_fallback(fallback: std::result::Result<Duration, String>) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback,
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    /// Queue outcomes consumed before the fallback applies.
    pub fn with_outcomes(self, outcomes: Vec<std::result::Result<Duration, String>>) -> Self {
        *self.outcomes.lock() = outcomes.into();
        self
    }

    /// Sleep for `delay` before answering, to exercise probe timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionProbe for ScriptedProbe {
    async fn probe(&self) -> Result<Duration> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        outcome.map_err(Error::Connection)
    }

    fn target(&self) -> &str {
        "scripted"
    }
}
