//! # Connection manager
//!
//! Owns the push subscription and the secondary service health status.
//! Each successful connect starts a new [`Epoch`]; frames are always handed
//! out tagged with the epoch of the subscription they arrived on.

use std::time::Duration;

use anyhow::{Context, bail};
use http::Method;
use http::header::ACCEPT;
use tracing::{debug, info, warn};

use crate::config::HEALTH_URL_KEY;
use crate::error::{Error, Result};
use crate::event::{Envelope, Epoch, REQUEST_SNAPSHOT_EVENT};
use crate::model::Connectivity;
use crate::provider::{Config, HttpRequest, PushTransport, Subscription};

/// What the subscription produced next.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A frame from the current subscription.
    Frame(Envelope),

    /// The subscription with this epoch ended (server close or transport
    /// failure). The connection is now marked disconnected.
    Closed(Epoch),
}

struct Active<S> {
    epoch: Epoch,
    subscription: S,
}

pub struct ConnectionManager<T: PushTransport> {
    transport: T,
    active: Option<Active<T::Subscription>>,
    last_epoch: Epoch,
    status: Connectivity,
}

impl<T: PushTransport> ConnectionManager<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport, active: None, last_epoch: Epoch::new(0), status: Connectivity::default() }
    }

    #[must_use]
    pub const fn status(&self) -> Connectivity {
        self.status
    }

    /// Epoch of the live subscription, `None` while disconnected.
    #[must_use]
    pub fn current_epoch(&self) -> Option<Epoch> {
        self.active.as_ref().map(|active| active.epoch)
    }

    /// Establish the push subscription and request a full snapshot.
    ///
    /// Calling `connect` while connected returns the current epoch without
    /// opening a second subscription.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the subscription cannot be opened or
    /// the snapshot request cannot be sent.
    pub async fn connect(&mut self) -> Result<Epoch> {
        if let Some(active) = &self.active {
            debug!(epoch = %active.epoch, "already connected");
            return Ok(active.epoch);
        }

        let mut subscription = match self.transport.subscribe().await {
            Ok(subscription) => subscription,
            Err(e) => {
                self.status.stream_connected = false;
                warn!(monotonic_counter.connect_failures = 1, error = %e, "subscribing failed");
                return Err(Error::Transport(format!("{e:#}")));
            }
        };

        if let Err(e) = subscription.emit(REQUEST_SNAPSHOT_EVENT).await {
            self.status.stream_connected = false;
            warn!(monotonic_counter.connect_failures = 1, error = %e, "requesting snapshot failed");
            return Err(Error::Transport(format!("requesting snapshot: {e:#}")));
        }

        let epoch = self.last_epoch.next();
        self.last_epoch = epoch;
        self.active = Some(Active { epoch, subscription });
        self.status.stream_connected = true;
        info!(epoch = %epoch, "stream connected");

        Ok(epoch)
    }

    /// Release the subscription. Afterwards the stream is reported as
    /// disconnected and no frame from the released subscription is returned.
    pub async fn disconnect(&mut self) {
        self.status.stream_connected = false;
        let Some(mut active) = self.active.take() else {
            return;
        };

        if let Err(e) = active.subscription.close().await {
            warn!(error = %e, epoch = %active.epoch, "closing subscription failed");
        }
        info!(epoch = %active.epoch, "stream disconnected");
    }

    /// Wait for the next frame. Never resolves while disconnected.
    pub async fn next_event(&mut self) -> Incoming {
        let Some(active) = self.active.as_mut() else {
            return std::future::pending().await;
        };

        let epoch = active.epoch;
        let next = active.subscription.next_frame().await;
        match next {
            Some(Ok(frame)) => Incoming::Frame(Envelope { epoch, frame }),
            Some(Err(e)) => {
                warn!(monotonic_counter.transport_failures = 1, error = %e, epoch = %epoch);
                self.release();
                Incoming::Closed(epoch)
            }
            None => {
                info!(epoch = %epoch, "stream closed by server");
                self.release();
                Incoming::Closed(epoch)
            }
        }
    }

    /// Probe the secondary service and record the result.
    pub async fn probe_secondary<P>(&mut self, provider: &P, timeout: Duration) -> bool
    where
        P: Config + HttpRequest,
    {
        let healthy = check_health(provider, timeout).await;
        self.record_probe(healthy);
        healthy
    }

    /// Record a probe result; returns whether the status flipped.
    pub fn record_probe(&mut self, healthy: bool) -> bool {
        let changed = self.status.secondary_service_healthy != healthy;
        self.status.secondary_service_healthy = healthy;
        if changed {
            info!(healthy, "secondary service status changed");
        }
        changed
    }

    fn release(&mut self) {
        self.active = None;
        self.status.stream_connected = false;
    }
}

/// Bounded health check against the secondary service. Any failure
/// (timeout, transport error, non-2xx status, non-JSON body) reports
/// unhealthy.
pub async fn check_health<P>(provider: &P, timeout: Duration) -> bool
where
    P: Config + HttpRequest,
{
    match tokio::time::timeout(timeout, probe(provider)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(monotonic_counter.probe_failures = 1, error = %format!("{e:#}"));
            false
        }
        Err(_) => {
            warn!(monotonic_counter.probe_failures = 1, timeout_secs = timeout.as_secs(), "probe timed out");
            false
        }
    }
}

async fn probe<P>(provider: &P) -> anyhow::Result<()>
where
    P: Config + HttpRequest,
{
    let url = Config::get(provider, HEALTH_URL_KEY).await.context("getting `HEALTH_URL`")?;
    let request = http::Request::builder()
        .method(Method::GET)
        .uri(url)
        .header(ACCEPT, "application/json")
        .body(Vec::new())
        .context("building health request")?;

    let response = HttpRequest::fetch(provider, request).await.context("health request failed")?;
    if !response.status().is_success() {
        bail!("health endpoint returned {}", response.status());
    }
    serde_json::from_slice::<serde_json::Value>(response.body())
        .context("health response is not JSON")?;

    Ok(())
}
