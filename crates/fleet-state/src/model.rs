//! # Model
//!
//! Validated fleet records held by the engine. Inbound payloads are decoded
//! into these types by [`crate::event`]; nothing downstream sees raw wire data.

use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Alert type recorded when the upstream event does not name one.
pub const DEFAULT_ALERT_TYPE: &str = "arrival";

/// Latest known state of one tracked vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vehicle_id: String,
    pub route_id: String,
    pub latitude: f64,
    pub longitude: f64,

    /// Ground speed in km/h, never negative.
    pub speed: f64,

    /// Occupancy as received; `None` when the vehicle did not report one.
    pub occupancy: Option<Occupancy>,
    pub last_update: DateTime<Utc>,
}

impl Vehicle {
    /// A vehicle is moving when its speed is strictly positive.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.speed > 0.0
    }

    #[must_use]
    pub fn motion(&self) -> Motion {
        if self.is_moving() { Motion::Moving } else { Motion::Idle }
    }

    /// Occupancy for display: unreported occupancy shows as [`Occupancy::Low`].
    #[must_use]
    pub fn display_occupancy(&self) -> Occupancy {
        self.occupancy.unwrap_or_default()
    }
}

/// Motion classification derived from speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motion {
    Moving,
    Idle,
}

/// Coarse passenger load classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Occupancy {
    #[default]
    Low,
    Medium,
    High,
}

impl Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

impl FromStr for Occupancy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("low") => Ok(Self::Low),
            s if s.eq_ignore_ascii_case("medium") => Ok(Self::Medium),
            s if s.eq_ignore_ascii_case("high") => Ok(Self::High),
            other => Err(Error::InvalidValue(format!("unknown occupancy `{other}`"))),
        }
    }
}

/// A geofence or arrival event. Immutable once stored in the alert log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub vehicle_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Connectivity flags for the push stream and the secondary service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connectivity {
    pub stream_connected: bool,
    pub secondary_service_healthy: bool,
}
