//! Operation documents for the telemetry queries

use crate::types::GraphQlRequest;
use serde_json::json;

/// Which vehicle-state fields to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldSet {
    /// Only what the polling engine needs
    #[default]
    Minimal,
    /// Every field the gateway exposes for the vehicle state
    Full,
}

const MINIMAL_STATE: &str = "query GetVehicleState($vehicleID: String!) { vehicleState(id: $vehicleID) { \
cloudConnection { lastSync } \
powerState { value } \
driveMode { value } \
gearStatus { value } \
vehicleMileage { value } \
batteryLevel { value } \
distanceToEmpty { value } \
gnssLocation { latitude longitude } \
chargerStatus { value } \
chargerState { value } \
batteryLimit { value } \
timeToEndOfCharge { value } \
} }";

/// Scalar readings of the full field set, each selected as `{ __typename timeStamp value }`
const FULL_STATE_READINGS: &[&str] = &[
    "alarmSoundStatus",
    "timeToEndOfCharge",
    "doorFrontLeftLocked",
    "doorFrontLeftClosed",
    "doorFrontRightLocked",
    "doorFrontRightClosed",
    "doorRearLeftLocked",
    "doorRearLeftClosed",
    "doorRearRightLocked",
    "doorRearRightClosed",
    "windowFrontLeftClosed",
    "windowFrontRightClosed",
    "windowRearLeftClosed",
    "windowRearRightClosed",
    "windowFrontLeftCalibrated",
    "windowFrontRightCalibrated",
    "windowRearLeftCalibrated",
    "windowRearRightCalibrated",
    "closureFrunkLocked",
    "closureFrunkClosed",
    "gearGuardLocked",
    "closureLiftgateLocked",
    "closureLiftgateClosed",
    "closureSideBinLeftLocked",
    "closureSideBinLeftClosed",
    "closureSideBinRightLocked",
    "closureSideBinRightClosed",
    "closureTailgateLocked",
    "closureTailgateClosed",
    "closureTonneauLocked",
    "closureTonneauClosed",
    "wiperFluidState",
    "powerState",
    "batteryHvThermalEventPropagation",
    "vehicleMileage",
    "brakeFluidLow",
    "gearStatus",
    "tirePressureStatusFrontLeft",
    "tirePressureStatusValidFrontLeft",
    "tirePressureStatusFrontRight",
    "tirePressureStatusValidFrontRight",
    "tirePressureStatusRearLeft",
    "tirePressureStatusValidRearLeft",
    "tirePressureStatusRearRight",
    "tirePressureStatusValidRearRight",
    "batteryLevel",
    "chargerState",
    "batteryLimit",
    "remoteChargingAvailable",
    "batteryHvThermalEvent",
    "rangeThreshold",
    "distanceToEmpty",
    "otaAvailableVersion",
    "otaAvailableVersionWeek",
    "otaAvailableVersionYear",
    "otaCurrentVersion",
    "otaCurrentVersionWeek",
    "otaCurrentVersionYear",
    "otaDownloadProgress",
    "otaInstallDuration",
    "otaInstallProgress",
    "otaInstallReady",
    "otaInstallTime",
    "otaInstallType",
    "otaStatus",
    "otaCurrentStatus",
    "cabinClimateInteriorTemperature",
    "cabinPreconditioningStatus",
    "cabinPreconditioningType",
    "petModeStatus",
    "petModeTemperatureStatus",
    "cabinClimateDriverTemperature",
    "gearGuardVideoStatus",
    "gearGuardVideoMode",
    "gearGuardVideoTermsAccepted",
    "defrostDefogStatus",
    "steeringWheelHeat",
    "seatFrontLeftHeat",
    "seatFrontRightHeat",
    "seatRearLeftHeat",
    "seatRearRightHeat",
    "chargerStatus",
    "seatFrontLeftVent",
    "seatFrontRightVent",
    "chargerDerateStatus",
    "driveMode",
];

const LAST_CONNECTION: &str = "query GetVehicleLastConnection($vehicleID: String!) { vehicleState(id: $vehicleID) { __typename cloudConnection { __typename lastSync } } }";

fn full_state_document() -> String {
    let mut query = String::from(
        "query GetVehicleState($vehicleID: String!) { vehicleState(id: $vehicleID) { __typename \
cloudConnection { __typename lastSync } \
gnssLocation { __typename latitude longitude timeStamp } ",
    );
    for field in FULL_STATE_READINGS {
        query.push_str(field);
        query.push_str(" { __typename timeStamp value } ");
    }
    query.push_str("} }");
    query
}

/// `GetVehicleState` for one vehicle
pub fn vehicle_state(vehicle_id: &str, field_set: FieldSet) -> GraphQlRequest {
    let query = match field_set {
        FieldSet::Minimal => MINIMAL_STATE.to_string(),
        FieldSet::Full => full_state_document(),
    };
    GraphQlRequest::new("GetVehicleState", query).with_variables(json!({ "vehicleID": vehicle_id }))
}

/// `GetVehicleLastConnection` for one vehicle
pub fn last_connection(vehicle_id: &str) -> GraphQlRequest {
    GraphQlRequest::new("GetVehicleLastConnection", LAST_CONNECTION)
        .with_variables(json!({ "vehicleID": vehicle_id }))
}
