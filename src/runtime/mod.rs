//! Connection supervision: timers, backoff, probes, and the manager.

pub mod backoff;
mod manager;
mod observer;
mod probe;
mod timer;

pub use manager::ConnectionResilienceManager;
pub use observer::{ConnectionObserver, NoopObserver, TracingObserver};
pub use probe::{probe_within, ConnectionProbe, WebSocketProbe};
pub use timer::ScheduledTask;
