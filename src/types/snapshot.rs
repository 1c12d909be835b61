//! Vehicle state snapshot
//!
//! Typed view of the `vehicleState` object. Sub-objects that depend on the
//! vehicle's hardware (charger, GNSS, OTA) are optional and may be absent or
//! null without making the snapshot invalid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Coarse classification of the reported power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerPhase {
    Ready,
    Sleep,
    Other,
}

impl PowerPhase {
    /// Classify a raw `powerState` value (`ready`, `go`, `standby`, `sleep`, ...)
    pub fn from_power_state(power_state: &str) -> Self {
        match power_state {
            "ready" => PowerPhase::Ready,
            "sleep" => PowerPhase::Sleep,
            _ => PowerPhase::Other,
        }
    }
}

/// GNSS position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Over-the-air update fields, present in the full field set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtaStatus {
    pub current_version: Option<String>,
    pub available_version: Option<String>,
    pub status: Option<String>,
    pub current_status: Option<String>,
    pub install_type: Option<String>,
    pub install_ready: Option<String>,
    pub download_progress: Option<String>,
    pub install_progress: Option<String>,
}

impl OtaStatus {
    fn is_empty(&self) -> bool {
        *self == OtaStatus::default()
    }
}

/// One fetched reading of the vehicle state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    /// When the fetch completed locally
    pub fetched_at: DateTime<Utc>,
    /// Last time the vehicle synced with the cloud
    pub last_sync: Option<DateTime<Utc>>,
    pub power_state: String,
    pub drive_mode: String,
    pub gear_status: String,
    pub mileage_meters: f64,
    pub battery_level_pct: f64,
    pub range_remaining_km: f64,
    pub battery_limit_pct: f64,
    pub charger_state: Option<String>,
    pub charger_status: Option<String>,
    pub time_to_end_of_charge_minutes: Option<f64>,
    pub location: Option<Location>,
    pub ota: Option<OtaStatus>,
    /// Every other field returned by the gateway, untouched
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl VehicleSnapshot {
    /// Observed power phase of this snapshot
    pub fn power_phase(&self) -> PowerPhase {
        PowerPhase::from_power_state(&self.power_state)
    }

    /// Build a snapshot from the `data.vehicleState` object
    pub fn from_state_json(state: Value, fetched_at: DateTime<Utc>) -> crate::Result<Self> {
        let wire: VehicleStateWire = serde_json::from_value(state)?;

        let ota = OtaStatus {
            current_version: text(wire.ota_current_version),
            available_version: text(wire.ota_available_version),
            status: text(wire.ota_status),
            current_status: text(wire.ota_current_status),
            install_type: text(wire.ota_install_type),
            install_ready: text(wire.ota_install_ready),
            download_progress: text(wire.ota_download_progress),
            install_progress: text(wire.ota_install_progress),
        };

        let last_sync = wire
            .cloud_connection
            .and_then(|c| c.last_sync)
            .and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
                Ok(at) => Some(at.with_timezone(&Utc)),
                Err(e) => {
                    debug!("Ignoring unparsable lastSync '{}': {}", raw, e);
                    None
                }
            });

        let location = wire.gnss_location.and_then(|g| match (g.latitude, g.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        });

        let mut extra = wire.extra;
        extra.remove("__typename");

        Ok(Self {
            fetched_at,
            last_sync,
            power_state: required(wire.power_state, "powerState")?,
            drive_mode: required(wire.drive_mode, "driveMode")?,
            gear_status: required(wire.gear_status, "gearStatus")?,
            mileage_meters: required(wire.vehicle_mileage, "vehicleMileage")?,
            battery_level_pct: required(wire.battery_level, "batteryLevel")?,
            range_remaining_km: required(wire.distance_to_empty, "distanceToEmpty")?,
            battery_limit_pct: required(wire.battery_limit, "batteryLimit")?,
            charger_state: optional(wire.charger_state),
            charger_status: optional(wire.charger_status),
            time_to_end_of_charge_minutes: optional(wire.time_to_end_of_charge),
            location,
            ota: (!ota.is_empty()).then_some(ota),
            extra,
        })
    }
}

/// `{ value, timeStamp }` wrapper used by every scalar vehicle-state field
#[derive(Debug, Deserialize)]
struct Reading<T> {
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudConnection {
    last_sync: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GnssWire {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleStateWire {
    cloud_connection: Option<CloudConnection>,
    power_state: Option<Reading<String>>,
    drive_mode: Option<Reading<String>>,
    gear_status: Option<Reading<String>>,
    vehicle_mileage: Option<Reading<f64>>,
    battery_level: Option<Reading<f64>>,
    distance_to_empty: Option<Reading<f64>>,
    battery_limit: Option<Reading<f64>>,
    charger_state: Option<Reading<String>>,
    charger_status: Option<Reading<String>>,
    time_to_end_of_charge: Option<Reading<f64>>,
    gnss_location: Option<GnssWire>,
    ota_current_version: Option<Reading<Value>>,
    ota_available_version: Option<Reading<Value>>,
    ota_status: Option<Reading<Value>>,
    ota_current_status: Option<Reading<Value>>,
    ota_install_type: Option<Reading<Value>>,
    ota_install_ready: Option<Reading<Value>>,
    ota_download_progress: Option<Reading<Value>>,
    ota_install_progress: Option<Reading<Value>>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

fn required<T>(reading: Option<Reading<T>>, field: &str) -> crate::Result<T> {
    reading.and_then(|r| r.value).ok_or_else(|| crate::Error::Validation {
        field: field.to_string(),
        message: "missing from vehicle state".to_string(),
        value: None,
    })
}

fn optional<T>(reading: Option<Reading<T>>) -> Option<T> {
    reading.and_then(|r| r.value)
}

fn text(reading: Option<Reading<Value>>) -> Option<String> {
    match reading.and_then(|r| r.value)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
