//! Connectivity probes used to test whether a link is back.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::time::Instant;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

/// Payload sent with every probe ping so the matching pong can be recognised.
const PING_PAYLOAD: &[u8] = b"linkwatch-probe";

/// A single connectivity check that reports the observed latency.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Check the link once.
    ///
    /// # Errors
    ///
    /// Returns an error if the link could not be established or did not
    /// answer.
    async fn probe(&self) -> Result<Duration>;

    /// Short label for logs.
    fn target(&self) -> &str {
        "probe"
    }
}

/// Run `probe`, failing with [`Error::Timeout`] if it takes longer than `limit`.
///
/// # Errors
///
/// Returns the probe's own error or a timeout.
pub async fn probe_within(probe: &dyn ConnectionProbe, limit: Duration) -> Result<Duration> {
    match tokio::time::timeout(limit, probe.probe()).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(limit)),
    }
}

/// Probes a WebSocket endpoint: connect, ping, wait for the pong, close.
///
/// The reported latency covers the handshake and the ping round trip.
#[derive(Debug, Clone)]
pub struct WebSocketProbe {
    url: Url,
}

impl WebSocketProbe {
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parse and wrap a `ws://` or `wss://` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or is not a WebSocket URL.
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self::new(url)),
            other => Err(Error::Connection(format!(
                "unsupported probe scheme '{other}', expected ws or wss"
            ))),
        }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ConnectionProbe for WebSocketProbe {
    async fn probe(&self) -> Result<Duration> {
        let started = Instant::now();
        let (mut ws, response) = connect_async(self.url.as_str()).await?;
        trace!(status = %response.status(), "Probe handshake complete");

        ws.send(Message::Ping(PING_PAYLOAD.to_vec())).await?;

        while let Some(message) = ws.next().await {
            match message? {
                Message::Pong(payload) if payload == PING_PAYLOAD => {
                    let latency = started.elapsed();
                    if let Err(e) = ws.close(None).await {
                        debug!(error = %e, "Probe close failed");
                    }
                    return Ok(latency);
                }
                Message::Close(frame) => {
                    let reason = frame.map_or_else(
                        || "no close frame".to_string(),
                        |frame| format!("{} {}", frame.code, frame.reason),
                    );
                    return Err(Error::Connection(format!(
                        "connection closed during probe: {reason}"
                    )));
                }
                _ => {}
            }
        }

        Err(Error::Connection(
            "connection ended before pong was received".to_string(),
        ))
    }

    fn target(&self) -> &str {
        self.url.as_str()
    }
}
