//! # Liveness
//!
//! The store never expires vehicles. Staleness is applied as a filter over
//! `last_update` when reading, leaving stored records untouched.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessFilter {
    stale_after: TimeDelta,
}

impl LivenessFilter {
    #[must_use]
    pub fn new(stale_after: Duration) -> Self {
        let stale_after = TimeDelta::from_std(stale_after).unwrap_or(TimeDelta::MAX);
        Self { stale_after }
    }

    /// A vehicle is live when it reported within the window ending at `now`.
    /// Reports stamped in the future count as live.
    #[must_use]
    pub fn is_live(&self, vehicle: &Vehicle, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(vehicle.last_update) <= self.stale_after
    }

    /// Live subset of `vehicles`, preserving order.
    #[must_use]
    pub fn live(&self, vehicles: &[Vehicle], now: DateTime<Utc>) -> Vec<Vehicle> {
        vehicles.iter().filter(|vehicle| self.is_live(vehicle, now)).cloned().collect()
    }
}
