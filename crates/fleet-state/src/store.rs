//! # Vehicle record store
//!
//! Latest known state per vehicle, keyed by vehicle id. Writes replace whole
//! records; reads hand out copies so a returned snapshot never changes under
//! the caller.

use std::collections::BTreeMap;

use crate::model::Vehicle;

#[derive(Debug, Clone, Default)]
pub struct VehicleStore {
    records: BTreeMap<String, Vehicle>,
}

impl VehicleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the vehicle, or overwrite every field of the existing record
    /// with the same id.
    pub fn upsert(&mut self, vehicle: Vehicle) {
        self.records.insert(vehicle.vehicle_id.clone(), vehicle);
    }

    /// Replace the entire contents with `records`. Ids missing from `records`
    /// are dropped; a repeated id keeps its last occurrence.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = Vehicle>) {
        self.records =
            records.into_iter().map(|vehicle| (vehicle.vehicle_id.clone(), vehicle)).collect();
    }

    /// Snapshot of all records ordered by vehicle id.
    #[must_use]
    pub fn all(&self) -> Vec<Vehicle> {
        self.records.values().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.records.get(vehicle_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record. Only used when a session discards its state.
    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
