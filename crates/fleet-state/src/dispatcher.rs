//! # Update dispatcher
//!
//! Routes inbound events to the vehicle store or the alert log and notifies
//! observers once the mutation is complete. The dispatcher performs no I/O.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::alerts::AlertLog;
use crate::error::{Error, Result};
use crate::event::{Envelope, Epoch, InboundEvent};
use crate::store::VehicleStore;

/// Kind of mutation an observer is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The vehicle store was replaced by a full snapshot.
    Vehicles,
    /// An alert was prepended to the log.
    Alerts,
    /// The operator cleared the alert log.
    AlertsCleared,
    /// Store and log were discarded for a session restart.
    Reset,
}

/// Vehicle records and alert history owned by one session.
#[derive(Debug, Clone, Default)]
pub struct FleetState {
    pub vehicles: VehicleStore,
    pub alerts: AlertLog,
}

/// Receives synchronous change notifications from the dispatcher.
pub trait Observer: Send + Sync {
    fn on_change(&self, change: Change, state: &FleetState);
}

impl<F> Observer for F
where
    F: Fn(Change, &FleetState) + Send + Sync,
{
    fn on_change(&self, change: Change, state: &FleetState) {
        self(change, state);
    }
}

#[derive(Default)]
pub struct Dispatcher {
    state: FleetState,
    observers: Vec<Box<dyn Observer>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; it is called after every applied mutation.
    pub fn observe(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    #[must_use]
    pub const fn state(&self) -> &FleetState {
        &self.state
    }

    /// Validate and apply a frame received on subscription `envelope.epoch`.
    ///
    /// Frames from any epoch other than `current` are discarded, as are
    /// unknown event names (`Ok(None)`). A rejected frame leaves the store
    /// and the log exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleEvent`] for frames from a released subscription
    /// and a validation error for malformed payloads.
    pub fn dispatch(
        &mut self, current: Option<Epoch>, envelope: Envelope, received_at: DateTime<Utc>,
    ) -> Result<Option<Change>> {
        let Envelope { epoch, frame } = envelope;
        if current != Some(epoch) {
            debug!(monotonic_counter.stale_events = 1, epoch = %epoch, event = %frame.event);
            return Err(Error::StaleEvent(epoch.value()));
        }

        let name = frame.event.clone();
        let event = match InboundEvent::decode(frame, received_at) {
            Ok(Some(event)) => event,
            Ok(None) => {
                warn!(monotonic_counter.unhandled_events = 1, event = %name);
                return Ok(None);
            }
            Err(e) => {
                warn!(monotonic_counter.rejected_events = 1, error = %e, event = %name, epoch = %epoch);
                return Err(e);
            }
        };

        Ok(Some(self.apply(event)))
    }

    /// Apply an already validated event and notify observers.
    pub fn apply(&mut self, event: InboundEvent) -> Change {
        let change = match event {
            InboundEvent::FullSnapshot(vehicles) => {
                debug!(monotonic_counter.snapshots_applied = 1, vehicles = vehicles.len());
                self.state.vehicles.replace_all(vehicles);
                Change::Vehicles
            }
            InboundEvent::AlertEvent(alert) => {
                debug!(monotonic_counter.alerts_applied = 1, vehicle = %alert.vehicle_id);
                self.state.alerts.push(alert);
                Change::Alerts
            }
        };
        self.notify(change);
        change
    }

    /// Operator action: empty the alert log unconditionally.
    pub fn clear_alerts(&mut self) {
        self.state.alerts.clear();
        self.notify(Change::AlertsCleared);
    }

    /// Discard all vehicles and alerts.
    pub fn reset(&mut self) {
        self.state.vehicles.clear();
        self.state.alerts.clear();
        self.notify(Change::Reset);
    }

    fn notify(&self, change: Change) {
        for observer in &self.observers {
            observer.on_change(change, &self.state);
        }
    }
}
