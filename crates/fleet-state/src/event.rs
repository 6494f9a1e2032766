//! # Inbound events
//!
//! Wire schema for frames pushed by the fleet stream and the single
//! validation step that turns them into [`InboundEvent`]s. A frame either
//! decodes completely or is rejected; partial records never reach the store.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{Alert, DEFAULT_ALERT_TYPE, Occupancy, Vehicle};

/// Server event carrying a full fleet snapshot.
pub const SNAPSHOT_EVENT: &str = "bus_update";
/// Server event carrying a single geofence alert.
pub const ALERT_EVENT: &str = "geofence_alert";
/// Client signal asking the server for an immediate full snapshot.
pub const REQUEST_SNAPSHOT_EVENT: &str = "request_buses";

/// A named frame as delivered by the push transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self { event: event.into(), data }
    }
}

/// Tag identifying one subscription instance. Epochs increase with every
/// successful connect so events from a released subscription can be told
/// apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frame tagged with the subscription it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub epoch: Epoch,
    pub frame: Frame,
}

/// Validated event ready to be applied by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Complete replacement set of vehicle records.
    FullSnapshot(Vec<Vehicle>),

    /// A single alert to prepend to the alert log.
    AlertEvent(Alert),
}

impl InboundEvent {
    /// Decode and validate a frame.
    ///
    /// Returns `Ok(None)` for event names the engine does not handle.
    /// `received_at` stamps vehicle records that carry no `lastUpdate`.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload does not match the schema for its
    /// event or a field carries an out-of-range value.
    pub fn decode(frame: Frame, received_at: DateTime<Utc>) -> Result<Option<Self>> {
        match frame.event.as_str() {
            SNAPSHOT_EVENT => {
                if !frame.data.is_array() {
                    return Err(Error::InvalidFormat(format!(
                        "`{SNAPSHOT_EVENT}` payload must be an array of vehicles"
                    )));
                }
                let records: Vec<VehicleRecord> = serde_json::from_value(frame.data)?;
                let vehicles = records
                    .into_iter()
                    .map(|record| record.validate(received_at))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(Self::FullSnapshot(vehicles)))
            }
            ALERT_EVENT => {
                let record: AlertRecord = serde_json::from_value(frame.data)?;
                Ok(Some(Self::AlertEvent(record.validate()?)))
            }
            _ => Ok(None),
        }
    }

    /// Event name as it appears on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FullSnapshot(_) => SNAPSHOT_EVENT,
            Self::AlertEvent(_) => ALERT_EVENT,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleRecord {
    bus_id: String,
    route_id: String,
    lat: f64,
    lon: f64,
    speed: f64,
    #[serde(default)]
    occupancy: Option<String>,
    #[serde(default)]
    last_update: Option<WireTimestamp>,
}

impl VehicleRecord {
    fn validate(self, received_at: DateTime<Utc>) -> Result<Vehicle> {
        let vehicle_id = non_empty("busId", self.bus_id)?;
        let route_id = non_empty("routeId", self.route_id)?;

        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidValue(format!("{vehicle_id}: latitude {} out of range", self.lat)));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::InvalidValue(format!(
                "{vehicle_id}: longitude {} out of range",
                self.lon
            )));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(Error::InvalidValue(format!("{vehicle_id}: invalid speed {}", self.speed)));
        }

        let occupancy = match self.occupancy.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(label.parse::<Occupancy>()?),
        };
        let last_update = match self.last_update {
            Some(timestamp) => timestamp.into_utc("lastUpdate")?,
            None => received_at,
        };

        Ok(Vehicle {
            vehicle_id,
            route_id,
            latitude: self.lat,
            longitude: self.lon,
            speed: self.speed,
            occupancy,
            last_update,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertRecord {
    bus_id: String,
    message: String,
    timestamp: WireTimestamp,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl AlertRecord {
    fn validate(self) -> Result<Alert> {
        let kind = match self.kind {
            Some(kind) if !kind.trim().is_empty() => kind,
            _ => DEFAULT_ALERT_TYPE.to_string(),
        };

        Ok(Alert {
            vehicle_id: non_empty("busId", self.bus_id)?,
            message: self.message,
            timestamp: self.timestamp.into_utc("timestamp")?,
            kind,
        })
    }
}

/// Timestamps arrive either as epoch milliseconds or as RFC 3339 strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Text(String),
}

impl WireTimestamp {
    fn into_utc(self, field: &str) -> Result<DateTime<Utc>> {
        match self {
            Self::Millis(millis) => DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| Error::InvalidValue(format!("{field}: {millis} out of range"))),
            Self::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|err| Error::InvalidValue(format!("{field}: `{text}` {err}"))),
        }
    }
}

fn non_empty(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidValue(format!("{field} must not be empty")));
    }
    if trimmed.len() == value.len() { Ok(value) } else { Ok(trimmed.to_string()) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn received_at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).expect("valid timestamp")
    }

    #[test]
    fn snapshot_with_optional_fields() {
        let frame = Frame::new(
            SNAPSHOT_EVENT,
            json!([
                {"busId": "BUS_1", "routeId": "ROUTE_101", "lat": 17.44, "lon": 78.49, "speed": 32.5,
                 "occupancy": "High", "lastUpdate": "2025-10-09T08:15:00Z"},
                {"busId": "BUS_2", "routeId": "ROUTE_202", "lat": 17.44, "lon": 78.35, "speed": 0}
            ]),
        );

        let Some(InboundEvent::FullSnapshot(vehicles)) =
            InboundEvent::decode(frame, received_at()).expect("should decode")
        else {
            panic!("expected a full snapshot");
        };

        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].occupancy, Some(Occupancy::High));
        assert_eq!(vehicles[0].last_update.to_rfc3339(), "2025-10-09T08:15:00+00:00");
        assert_eq!(vehicles[1].occupancy, None);
        assert_eq!(vehicles[1].last_update, received_at());
        assert!((vehicles[1].speed - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_rejected_when_any_record_is_malformed() {
        let frame = Frame::new(
            SNAPSHOT_EVENT,
            json!([
                {"busId": "BUS_1", "routeId": "ROUTE_101", "lat": 17.44, "lon": 78.49, "speed": 3},
                {"busId": "BUS_2", "lat": 17.44, "lon": 78.35, "speed": 0}
            ]),
        );

        let err = InboundEvent::decode(frame, received_at()).expect_err("should reject");
        assert_eq!(err, Error::MissingField("routeId".to_string()));
    }

    #[test]
    fn snapshot_must_be_an_array() {
        let frame = Frame::new(SNAPSHOT_EVENT, json!({"busId": "BUS_1"}));
        let err = InboundEvent::decode(frame, received_at()).expect_err("should reject");
        assert_eq!(err.code(), "invalid_format");
    }

    #[test]
    fn negative_speed_rejected() {
        let frame = Frame::new(
            SNAPSHOT_EVENT,
            json!([{"busId": "BUS_1", "routeId": "R1", "lat": 0, "lon": 0, "speed": -4}]),
        );
        let err = InboundEvent::decode(frame, received_at()).expect_err("should reject");
        assert_eq!(err.code(), "invalid_value");
    }

    #[test]
    fn unknown_occupancy_rejected() {
        let frame = Frame::new(
            SNAPSHOT_EVENT,
            json!([{"busId": "BUS_1", "routeId": "R1", "lat": 0, "lon": 0, "speed": 4, "occupancy": "Packed"}]),
        );
        assert!(InboundEvent::decode(frame, received_at()).is_err());
    }

    #[test]
    fn alert_defaults_type() {
        let frame = Frame::new(
            ALERT_EVENT,
            json!({"busId": "BUS_3", "message": "Arrived at Tank Bund", "timestamp": 1_760_000_000_000_i64}),
        );

        let event = InboundEvent::decode(frame, received_at()).expect("should decode");
        let Some(InboundEvent::AlertEvent(alert)) = event else {
            panic!("expected an alert");
        };
        assert_eq!(alert.kind, "arrival");
        assert_eq!(alert.timestamp, received_at());
    }

    #[test]
    fn alert_bad_timestamp() {
        let frame = Frame::new(
            ALERT_EVENT,
            json!({"busId": "BUS_3", "message": "m", "timestamp": "yesterday", "type": "geofence"}),
        );
        let err = InboundEvent::decode(frame, received_at()).expect_err("should reject");
        assert_eq!(err.code(), "invalid_value");
    }

    #[test]
    fn unknown_event_ignored() {
        let frame = Frame::new("driver_chat", json!({"text": "hi"}));
        assert_eq!(InboundEvent::decode(frame, received_at()).expect("should decode"), None);
    }

    #[test]
    fn epoch_ordering() {
        let first = Epoch::new(1);
        assert!(first.next() > first);
        assert_eq!(first.next().value(), 2);
    }
}
