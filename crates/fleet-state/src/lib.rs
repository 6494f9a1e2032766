//! # Fleet State
//!
//! Live fleet state synchronization: the vehicle store, the bounded alert
//! log, derived metrics, and the session that keeps them in step with the
//! push stream.

pub mod alerts;
pub mod config;
pub mod connection;
pub mod dispatcher;
mod error;
pub mod event;
pub mod liveness;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod reference;
pub mod session;
pub mod store;
pub mod view;

pub use self::alerts::{ALERT_CAPACITY, AlertLog};
pub use self::config::Config;
pub use self::connection::{ConnectionManager, Incoming};
pub use self::dispatcher::{Change, Dispatcher, FleetState, Observer};
pub use self::error::{Error, Result};
pub use self::event::{Envelope, Epoch, Frame, InboundEvent};
pub use self::liveness::LivenessFilter;
pub use self::metrics::{FleetMetrics, RouteSummary};
pub use self::model::*;
pub use self::provider::{Principal, Provider, PushTransport, Subscription};
pub use self::reference::{Route, RouteCatalog, Stop};
pub use self::session::{Command, Controller, RunOutcome, Session};
pub use self::store::VehicleStore;
pub use self::view::{FleetView, Marker};
