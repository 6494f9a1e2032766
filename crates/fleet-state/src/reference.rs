//! # Reference data
//!
//! Static routes and stops used to label vehicles and draw the reference
//! path. Never mutated by the engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,

    /// Display color as a CSS hex string.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Routes plus the ordered stop sequence for the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCatalog {
    routes: Vec<Route>,
    stops: Vec<Stop>,
}

impl RouteCatalog {
    #[must_use]
    pub const fn new(routes: Vec<Route>, stops: Vec<Stop>) -> Self {
        Self { routes, stops }
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    #[must_use]
    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.id == route_id)
    }

    /// Stop coordinates in sequence, as `[latitude, longitude]` pairs.
    #[must_use]
    pub fn path(&self) -> Vec<[f64; 2]> {
        self.stops.iter().map(|stop| [stop.latitude, stop.longitude]).collect()
    }
}

impl Default for RouteCatalog {
    fn default() -> Self {
        let routes = vec![
            route("ROUTE_101", "Secunderabad - Charminar", "#ff6b35"),
            route("ROUTE_202", "Hitech City - Gachibowli", "#4cc9f0"),
        ];
        let stops = vec![
            stop("Secunderabad Station", 17.4399, 78.4983),
            stop("Paradise Circle", 17.4411, 78.4877),
            stop("Tank Bund", 17.4239, 78.4738),
            stop("Secretariat", 17.4062, 78.4690),
            stop("Charminar", 17.3616, 78.4747),
            stop("Hitech City", 17.4435, 78.3772),
            stop("Gachibowli", 17.4401, 78.3489),
        ];
        Self { routes, stops }
    }
}

fn route(id: &str, name: &str, color: &str) -> Route {
    Route { id: id.to_string(), name: name.to_string(), color: color.to_string() }
}

fn stop(name: &str, latitude: f64, longitude: f64) -> Stop {
    Stop { name: name.to_string(), latitude, longitude }
}
