//! # Metrics
//!
//! Pure fleet aggregates computed over a snapshot of vehicle records. Every
//! function here is deterministic and side-effect free, so callers may
//! recompute on each change or poll on demand.

use serde::{Deserialize, Serialize};

use crate::model::Vehicle;
use crate::reference::{Route, RouteCatalog};

/// Fleet-wide summary statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetMetrics {
    pub total_count: usize,

    /// Vehicles with speed strictly above zero.
    pub active_count: usize,

    /// Vehicles that are not active.
    pub idle_count: usize,

    /// Mean speed in km/h rounded to one decimal; `0` for an empty fleet.
    pub average_speed: f64,
}

impl FleetMetrics {
    #[must_use]
    pub fn compute(vehicles: &[Vehicle]) -> Self {
        let total_count = vehicles.len();
        let active_count = vehicles.iter().filter(|vehicle| vehicle.is_moving()).count();

        Self {
            total_count,
            active_count,
            idle_count: total_count - active_count,
            average_speed: average_speed(vehicles),
        }
    }
}

/// Mean speed rounded to one decimal place.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_speed(vehicles: &[Vehicle]) -> f64 {
    if vehicles.is_empty() {
        return 0.0;
    }
    let total: f64 = vehicles.iter().map(|vehicle| vehicle.speed).sum();
    let mean = total / vehicles.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Number of vehicles currently assigned to `route_id`.
#[must_use]
pub fn count_by_route(vehicles: &[Vehicle], route_id: &str) -> usize {
    vehicles.iter().filter(|vehicle| vehicle.route_id == route_id).count()
}

/// Vehicle count for one catalog route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    #[serde(flatten)]
    pub route: Route,
    pub vehicle_count: usize,
}

/// Per-route vehicle counts for every route in the catalog, in catalog order.
#[must_use]
pub fn route_summaries(vehicles: &[Vehicle], catalog: &RouteCatalog) -> Vec<RouteSummary> {
    catalog
        .routes()
        .iter()
        .map(|route| RouteSummary {
            route: route.clone(),
            vehicle_count: count_by_route(vehicles, &route.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn vehicle(id: &str, route: &str, speed: f64) -> Vehicle {
        Vehicle {
            vehicle_id: id.to_string(),
            route_id: route.to_string(),
            latitude: 17.4,
            longitude: 78.4,
            speed,
            occupancy: None,
            last_update: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_fleet() {
        assert_eq!(FleetMetrics::compute(&[]), FleetMetrics::default());
        assert!(average_speed(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn mixed_fleet() {
        let fleet = [vehicle("A", "R1", 0.0), vehicle("B", "R1", 10.0), vehicle("C", "R2", 20.0)];
        let metrics = FleetMetrics::compute(&fleet);

        assert_eq!(metrics.total_count, 3);
        assert_eq!(metrics.active_count, 2);
        assert_eq!(metrics.idle_count, 1);
        assert!((metrics.average_speed - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let fleet = [vehicle("A", "R1", 10.0), vehicle("B", "R1", 10.0), vehicle("C", "R1", 11.0)];
        // 31 / 3 = 10.333..
        assert!((average_speed(&fleet) - 10.3).abs() < f64::EPSILON);

        let fleet = [vehicle("A", "R1", 0.25), vehicle("B", "R1", 0.0)];
        assert!((average_speed(&fleet) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn counts_by_route() {
        let fleet = [vehicle("A", "R1", 0.0), vehicle("B", "R2", 5.0), vehicle("C", "R1", 7.0)];
        assert_eq!(count_by_route(&fleet, "R1"), 2);
        assert_eq!(count_by_route(&fleet, "R3"), 0);
    }

    #[test]
    fn summaries_follow_catalog() {
        let fleet = [vehicle("A", "ROUTE_101", 3.0), vehicle("B", "ROUTE_999", 5.0)];
        let summaries = route_summaries(&fleet, &RouteCatalog::default());

        let counts: Vec<(&str, usize)> =
            summaries.iter().map(|s| (s.route.id.as_str(), s.vehicle_count)).collect();
        assert_eq!(counts, vec![("ROUTE_101", 1), ("ROUTE_202", 0)]);
    }

    #[test]
    fn deterministic() {
        let fleet = [vehicle("A", "R1", 3.3), vehicle("B", "R2", 4.4)];
        assert_eq!(FleetMetrics::compute(&fleet), FleetMetrics::compute(&fleet));
    }
}
