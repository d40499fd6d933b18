//! Cancellable scheduled tasks.
//!
//! A [`ScheduledTask`] owns the Tokio task it spawned. Dropping or
//! cancelling it aborts the task, so whoever holds the handle decides when
//! pending work stops.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Handle to a single-shot or periodic task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
    deadline: Instant,
}

impl ScheduledTask {
    /// Run `task` once after `delay`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn once<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            task.await;
        });
        Self {
            handle: Some(handle),
            deadline,
        }
    }

    /// Call `tick` every `period`, first after one full period, until it
    /// returns `false`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero or if called outside a Tokio runtime.
    pub fn every<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let deadline = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(deadline, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !tick() {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
            deadline,
        }
    }

    /// Time left until the first (or only) run.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Abort the task if it has not run yet.
    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Release the handle without aborting.
    ///
    /// Used by a task that is already running and clears its own slot.
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
