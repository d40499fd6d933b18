//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`probe`] - [`ConnectionProbe`](crate::runtime::ConnectionProbe) doubles
//!   with scripted outcomes and a call counter.
//! - [`observer`] - An observer that records every callback.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod observer;
pub mod probe;
