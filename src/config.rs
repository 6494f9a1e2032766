use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_STREAM_ADDR: &str = "127.0.0.1:4000";
const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

/// Host process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Address of the push stream server.
    pub stream_addr: String,

    /// Listen address of the read API.
    pub http_addr: SocketAddr,

    /// Pause between losing the stream and connecting again.
    pub reconnect_delay: Duration,
}

impl HostConfig {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when `HTTP_ADDR` is not a socket address.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load settings from any key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when `HTTP_ADDR` is not a socket address.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let stream_addr = var("STREAM_ADDR")
            .filter(|addr| !addr.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STREAM_ADDR.to_string());

        let http_addr = var("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = http_addr
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("parsing `HTTP_ADDR` {http_addr}"))?;

        let reconnect_secs = var("FLEET_RECONNECT_DELAY_SECS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or_else(|| {
                tracing::trace!(
                    "FLEET_RECONNECT_DELAY_SECS not set, using default: {DEFAULT_RECONNECT_DELAY_SECS}"
                );
                DEFAULT_RECONNECT_DELAY_SECS
            });

        Ok(Self {
            stream_addr,
            http_addr,
            reconnect_delay: Duration::from_secs(reconnect_secs),
        })
    }
}
