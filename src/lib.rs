//! Linkwatch - connection health monitoring and error recovery.
//!
//! This crate watches one long-lived realtime connection, scores its health,
//! raises alerts, and reconnects it with jittered exponential backoff. It
//! also provides reusable recovery primitives for arbitrary async
//! operations.
//!
//! # Modules
//!
//! - [`runtime`] - `ConnectionResilienceManager`, reconnection timers, and
//!   the `ConnectionProbe` seam with a WebSocket implementation
//! - [`recovery`] - `CircuitBreaker`, `retry_with_backoff`, and the layered
//!   `ErrorRecovery` policy
//! - [`domain`] - Metrics, quality scoring, alerts, and error classification
//! - [`config`] - Configuration loading from TOML files
//! - [`error`] - Error types for the crate
//! - [`cli`] - The `linkwatch` command-line interface
//!
//! # Features
//!
//! - `testkit` - Scripted probes, recording observers, and canonical test
//!   configs for integration tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use linkwatch::config::ResilienceConfig;
//! use linkwatch::runtime::{ConnectionResilienceManager, WebSocketProbe};
//!
//! # async fn run() -> linkwatch::error::Result<()> {
//! let probe = Arc::new(WebSocketProbe::parse("wss://example.com/realtime")?);
//! let manager = ConnectionResilienceManager::new(ResilienceConfig::default(), probe);
//! manager.initialize("tenant-42");
//! manager.force_reconnection().await;
//! println!("{:?}", manager.connection_status());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod recovery;
pub mod runtime;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
