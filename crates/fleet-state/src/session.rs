//! # Session
//!
//! A dashboard session owns the vehicle store, the alert log and the
//! connection for one signed-in principal. Nothing outlives the session:
//! a new session starts empty, and dropping one releases its subscription.
//!
//! All mutation happens on the session's own event loop ([`Session::run`]).
//! Readers elsewhere get immutable [`FleetView`] snapshots through
//! [`Session::watch`] and send operator actions through a [`Controller`].

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Fuse, FusedFuture};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::connection::{ConnectionManager, Incoming, check_health};
use crate::dispatcher::{Dispatcher, Observer};
use crate::error::{Error, Result};
use crate::event::Epoch;
use crate::liveness::LivenessFilter;
use crate::metrics::{self, FleetMetrics, RouteSummary};
use crate::model::{Alert, Connectivity, Vehicle};
use crate::provider::{Principal, Provider, PushTransport};
use crate::reference::RouteCatalog;
use crate::view::FleetView;

const COMMAND_BUFFER: usize = 16;

/// Shortest probe period the event loop will schedule.
const MIN_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Operator actions accepted by a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ClearAlerts,
}

/// Why [`Session::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The shutdown future resolved.
    Shutdown,
    /// The server closed the stream or the transport failed. State is kept;
    /// the caller decides whether and when to reconnect.
    StreamClosed,
}

/// Sends operator commands to a session from any task.
#[derive(Debug, Clone)]
pub struct Controller {
    commands: mpsc::Sender<Command>,
}

impl Controller {
    #[must_use]
    pub const fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    /// Ask the session to clear its alert log.
    ///
    /// # Errors
    ///
    /// Returns an error when the session has ended.
    pub async fn clear_alerts(&self) -> anyhow::Result<()> {
        self.commands.send(Command::ClearAlerts).await.context("session has ended")
    }
}

pub struct Session<T: PushTransport, P: Provider> {
    principal: Principal,
    config: Config,
    catalog: RouteCatalog,
    liveness: LivenessFilter,
    provider: Arc<P>,
    connection: ConnectionManager<T>,
    dispatcher: Dispatcher,
    view: watch::Sender<FleetView>,
    commands_tx: mpsc::Sender<Command>,
    commands: mpsc::Receiver<Command>,
}

impl<T: PushTransport, P: Provider + 'static> Session<T, P> {
    /// Start a session for the principal reported by the identity provider.
    /// The store and the log start empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] when nobody is signed in, or the
    /// identity provider's error.
    pub async fn start(config: Config, transport: T, provider: P) -> Result<Self> {
        let principal = provider
            .principal()
            .await
            .context("reading principal from identity provider")?
            .ok_or(Error::Unauthenticated)?;

        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (view, _) = watch::channel(FleetView::default());
        info!(principal = %principal.id, "session started");

        let session = Self {
            principal,
            liveness: LivenessFilter::new(config.stale_after),
            config,
            catalog: RouteCatalog::default(),
            provider: Arc::new(provider),
            connection: ConnectionManager::new(transport),
            dispatcher: Dispatcher::new(),
            view,
            commands_tx,
            commands,
        };
        session.publish();
        Ok(session)
    }

    /// Replace the default route catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: RouteCatalog) -> Self {
        self.catalog = catalog;
        self.publish();
        self
    }

    /// Register an observer notified synchronously after every mutation.
    pub fn observe(&mut self, observer: impl Observer + 'static) {
        self.dispatcher.observe(observer);
    }

    /// Connect the push subscription (no-op when already connected).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the subscription cannot be opened.
    /// The stream is then reported disconnected and state is kept.
    pub async fn connect(&mut self) -> Result<Epoch> {
        let result = self.connection.connect().await;
        self.publish();
        result
    }

    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
        self.publish();
    }

    /// Run the secondary service probe now and record the result.
    pub async fn probe_secondary(&mut self) -> bool {
        let healthy =
            self.connection.probe_secondary(self.provider.as_ref(), self.config.probe_timeout).await;
        self.publish();
        healthy
    }

    /// Drop the current subscription, discard every vehicle and alert, then
    /// subscribe again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the new subscription cannot be opened.
    pub async fn restart(&mut self) -> Result<Epoch> {
        self.connection.disconnect().await;
        self.dispatcher.reset();
        info!(principal = %self.principal.id, "session state discarded");
        self.connect().await
    }

    /// Drive the session until `shutdown` resolves or the stream closes.
    ///
    /// Frames are applied in delivery order. The secondary service is probed
    /// every `probe_interval`, never more often than once a second; a probe
    /// runs alongside the stream and its result is applied on this loop.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> RunOutcome {
        let mut shutdown = pin!(shutdown);
        let mut ticker = tokio::time::interval(self.config.probe_interval.max(MIN_PROBE_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut probe: Fuse<BoxFuture<'static, bool>> = Fuse::terminated();

        loop {
            tokio::select! {
                () = &mut shutdown => return RunOutcome::Shutdown,
                _ = ticker.tick() => {
                    if probe.is_terminated() {
                        let provider = Arc::clone(&self.provider);
                        let timeout = self.config.probe_timeout;
                        probe = async move { check_health(provider.as_ref(), timeout).await }
                            .boxed()
                            .fuse();
                    }
                }
                healthy = &mut probe => {
                    if self.connection.record_probe(healthy) {
                        self.publish();
                    }
                }
                Some(command) = self.commands.recv() => self.execute(command),
                incoming = self.connection.next_event() => {
                    if !self.handle(incoming) {
                        return RunOutcome::StreamClosed;
                    }
                }
            }
        }
    }

    /// Disconnect and end the session.
    pub async fn teardown(mut self) {
        self.connection.disconnect().await;
        self.publish();
        info!(principal = %self.principal.id, "session ended");
    }

    /// Apply one inbound item; returns `false` once the stream has closed.
    fn handle(&mut self, incoming: Incoming) -> bool {
        match incoming {
            Incoming::Frame(envelope) => {
                let current = self.connection.current_epoch();
                // rejected frames are logged by the dispatcher and leave state untouched
                if let Ok(Some(change)) = self.dispatcher.dispatch(current, envelope, Utc::now()) {
                    debug!(change = ?change, "state updated");
                    self.publish();
                }
                true
            }
            Incoming::Closed(epoch) => {
                warn!(epoch = %epoch, vehicles = self.dispatcher.state().vehicles.len(), "stream lost, keeping last known state");
                self.publish();
                false
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::ClearAlerts => self.clear_alerts(),
        }
    }
}

impl<T: PushTransport, P: Provider> Session<T, P> {
    /// Operator action: empty the alert log.
    pub fn clear_alerts(&mut self) {
        self.dispatcher.clear_alerts();
        info!(principal = %self.principal.id, "alerts cleared");
        self.publish();
    }

    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    #[must_use]
    pub const fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn connectivity(&self) -> Connectivity {
        self.connection.status()
    }

    #[must_use]
    pub fn current_epoch(&self) -> Option<Epoch> {
        self.connection.current_epoch()
    }

    #[must_use]
    pub const fn liveness(&self) -> &LivenessFilter {
        &self.liveness
    }

    /// Snapshot of every vehicle record, ordered by vehicle id.
    #[must_use]
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.dispatcher.state().vehicles.all()
    }

    /// Vehicles that reported within the staleness window ending at `now`.
    #[must_use]
    pub fn live_vehicles(&self, now: DateTime<Utc>) -> Vec<Vehicle> {
        self.liveness.live(&self.vehicles(), now)
    }

    /// The `n` most recent alerts.
    #[must_use]
    pub fn alerts(&self, n: usize) -> Vec<Alert> {
        self.dispatcher.state().alerts.recent(n)
    }

    #[must_use]
    pub fn metrics(&self) -> FleetMetrics {
        FleetMetrics::compute(&self.vehicles())
    }

    #[must_use]
    pub fn count_by_route(&self, route_id: &str) -> usize {
        metrics::count_by_route(&self.vehicles(), route_id)
    }

    #[must_use]
    pub fn route_summaries(&self) -> Vec<RouteSummary> {
        metrics::route_summaries(&self.vehicles(), &self.catalog)
    }

    /// Build a view of the current state.
    #[must_use]
    pub fn view(&self) -> FleetView {
        FleetView::build(
            self.dispatcher.state(),
            self.connection.status(),
            &self.catalog,
            Utc::now(),
        )
    }

    /// Receiver of the view, republished after every applied change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<FleetView> {
        self.view.subscribe()
    }

    #[must_use]
    pub fn controller(&self) -> Controller {
        Controller::new(self.commands_tx.clone())
    }

    fn publish(&self) {
        self.view.send_replace(self.view());
    }
}

impl<T: PushTransport, P: Provider> Drop for Session<T, P> {
    fn drop(&mut self) {
        if let Some(epoch) = self.connection.current_epoch() {
            warn!(epoch = %epoch, "session dropped while connected, releasing subscription");
        }
    }
}
