//! # Fleet view
//!
//! Immutable snapshot of everything a rendering layer needs. A view is
//! built from the session state in one pass and never changes afterwards,
//! so it can be handed to readers on other tasks.
//!
//! A view carries no liveness flags: whether a vehicle is live depends on
//! the time it is read, so readers apply a [`crate::LivenessFilter`]
//! themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatcher::FleetState;
use crate::metrics::{FleetMetrics, RouteSummary, route_summaries};
use crate::model::{Alert, Connectivity, Motion, Occupancy, Vehicle};
use crate::reference::{RouteCatalog, Stop};

/// Map marker for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub route_id: String,

    /// Route color from the catalog; `None` for routes it does not know.
    pub color: Option<String>,
    pub motion: Motion,
    pub occupancy: Occupancy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetView {
    pub vehicles: Vec<Vehicle>,
    pub alerts: Vec<Alert>,
    pub metrics: FleetMetrics,
    pub routes: Vec<RouteSummary>,
    pub connectivity: Connectivity,
    pub markers: Vec<Marker>,
    pub stops: Vec<Stop>,

    /// Reference path through the stops as `[latitude, longitude]` pairs.
    pub path: Vec<[f64; 2]>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl FleetView {
    #[must_use]
    pub fn build(
        state: &FleetState, connectivity: Connectivity, catalog: &RouteCatalog,
        now: DateTime<Utc>,
    ) -> Self {
        let vehicles = state.vehicles.all();
        let markers = vehicles
            .iter()
            .map(|vehicle| Marker {
                vehicle_id: vehicle.vehicle_id.clone(),
                latitude: vehicle.latitude,
                longitude: vehicle.longitude,
                route_id: vehicle.route_id.clone(),
                color: catalog.route(&vehicle.route_id).map(|route| route.color.clone()),
                motion: vehicle.motion(),
                occupancy: vehicle.display_occupancy(),
            })
            .collect();

        Self {
            metrics: FleetMetrics::compute(&vehicles),
            routes: route_summaries(&vehicles, catalog),
            alerts: state.alerts.all(),
            connectivity,
            markers,
            stops: catalog.stops().to_vec(),
            path: catalog.path(),
            generated_at: Some(now),
            vehicles,
        }
    }
}
