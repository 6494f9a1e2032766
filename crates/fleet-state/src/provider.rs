//! # Provider
//!
//! Provider defines external data interfaces for the crate.

use anyhow::Result;
pub use realtime::{Config, HttpRequest, Identity, Principal};

use crate::event::Frame;

/// Provider entry point implemented by the host application.
pub trait Provider: Config + HttpRequest + Identity + Send + Sync {}

/// Opens push subscriptions to the fleet stream.
pub trait PushTransport: Send + Sync {
    type Subscription: Subscription;

    /// Establish a new subscription.
    fn subscribe(&self) -> impl Future<Output = Result<Self::Subscription>> + Send;
}

/// One live, bidirectional subscription. Dropping it releases the underlying
/// connection; no frame is delivered after drop.
pub trait Subscription: Send {
    /// Send a client signal (e.g. the full snapshot request).
    fn emit(&mut self, event: &str) -> impl Future<Output = Result<()>> + Send;

    /// Next frame from the server. `None` once the server has closed the stream.
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<Frame>>> + Send;

    /// Close the subscription gracefully.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
