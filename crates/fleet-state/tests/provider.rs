#![allow(missing_docs)]
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use bytes::Bytes;
use fleet_state::provider::{Config, HttpRequest, Identity};
use fleet_state::{Frame, Principal, Provider, PushTransport, Subscription};
use http::{Request, Response};
use tokio::sync::mpsc;

/// Scripted reply of the secondary service health endpoint.
#[derive(Clone, Debug)]
pub enum Health {
    Reply(u16, &'static str),
    Unreachable,
}

#[derive(Clone)]
pub struct MockProvider {
    principal: Option<Principal>,
    config: HashMap<&'static str, String>,
    health: Arc<Mutex<Health>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        let principal = Principal {
            id: "5b0e6c1e-2f7a-4d8b-9b61-7c1f0d9d7a10".to_string(),
            display_name: "ops@fleet.test".to_string(),
        };
        let config = HashMap::from([("HEALTH_URL", "http://ml.fleet.test/".to_string())]);

        Self {
            principal: Some(principal),
            config,
            health: Arc::new(Mutex::new(Health::Reply(200, "{}"))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { principal: None, ..Self::new() }
    }

    pub fn set_health(&self, health: Health) {
        *self.health.lock().expect("lock") = health;
    }

    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Provider for MockProvider {}

impl HttpRequest for MockProvider {
    async fn fetch(&self, request: Request<Vec<u8>>) -> Result<Response<Bytes>> {
        self.requests.lock().expect("lock").push(request.uri().to_string());

        let health = self.health.lock().expect("lock").clone();
        match health {
            Health::Reply(status, body) => Response::builder()
                .status(status)
                .body(Bytes::from_static(body.as_bytes()))
                .context("failed to build response"),
            Health::Unreachable => Err(anyhow!("connection refused")),
        }
    }
}

impl Config for MockProvider {
    async fn get(&self, key: &str) -> Result<String> {
        self.config.get(key).cloned().ok_or_else(|| anyhow!("unknown config key {key}"))
    }
}

impl Identity for MockProvider {
    async fn principal(&self) -> Result<Option<Principal>> {
        Ok(self.principal.clone())
    }
}

#[derive(Default)]
struct Hub {
    /// One sender per subscription ever opened; `None` once hung up.
    senders: Vec<Option<mpsc::UnboundedSender<Frame>>>,
    emitted: Vec<String>,
    closed: usize,
    refuse: bool,
}

/// In-memory push transport. Frames pushed by the test are delivered in
/// order to the subscription they target.
#[derive(Clone, Default)]
pub struct MockTransport {
    hub: Arc<Mutex<Hub>>,
}

impl MockTransport {
    /// Deliver a frame on the most recent subscription.
    pub fn push(&self, frame: Frame) {
        let index = self.subscriptions().checked_sub(1).expect("no subscription opened");
        assert!(self.push_to(index, frame), "latest subscription is gone");
    }

    /// Deliver a frame on a specific subscription; returns `false` when that
    /// subscription no longer accepts frames.
    pub fn push_to(&self, index: usize, frame: Frame) -> bool {
        let hub = self.hub.lock().expect("lock");
        hub.senders
            .get(index)
            .and_then(Option::as_ref)
            .is_some_and(|sender| sender.send(frame).is_ok())
    }

    /// Server-initiated close of the most recent subscription.
    pub fn hang_up(&self) {
        let mut hub = self.hub.lock().expect("lock");
        if let Some(sender) = hub.senders.last_mut() {
            sender.take();
        }
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.hub.lock().expect("lock").refuse = refuse;
    }

    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.hub.lock().expect("lock").senders.len()
    }

    #[must_use]
    pub fn emitted(&self) -> Vec<String> {
        self.hub.lock().expect("lock").emitted.clone()
    }

    #[must_use]
    pub fn closed(&self) -> usize {
        self.hub.lock().expect("lock").closed
    }
}

impl PushTransport for MockTransport {
    type Subscription = MockSubscription;

    async fn subscribe(&self) -> Result<MockSubscription> {
        let mut hub = self.hub.lock().expect("lock");
        if hub.refuse {
            bail!("connection refused");
        }

        let (sender, frames) = mpsc::unbounded_channel();
        hub.senders.push(Some(sender));
        Ok(MockSubscription { frames, hub: Arc::clone(&self.hub) })
    }
}

pub struct MockSubscription {
    frames: mpsc::UnboundedReceiver<Frame>,
    hub: Arc<Mutex<Hub>>,
}

impl Subscription for MockSubscription {
    async fn emit(&mut self, event: &str) -> Result<()> {
        self.hub.lock().expect("lock").emitted.push(event.to_string());
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        self.frames.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<()> {
        self.frames.close();
        self.hub.lock().expect("lock").closed += 1;
        Ok(())
    }
}
