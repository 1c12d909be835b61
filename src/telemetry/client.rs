//! Vehicle-state queries
//!
//! Single-shot fetches with no retry logic; the caller owns retry policy.

use crate::{
    Result,
    session::AuthClient,
    telemetry::queries::{self, FieldSet},
    types::{GraphQlRequest, Session, VehicleSnapshot, graphql},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Trait for telemetry operations to enable testing with mocks
#[async_trait::async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Fetch one vehicle-state snapshot
    async fn fetch_vehicle_state(
        &self,
        vehicle_id: &str,
        field_set: FieldSet,
    ) -> Result<VehicleSnapshot>;

    /// Last time the vehicle synced with the cloud
    async fn fetch_last_connection(&self, vehicle_id: &str) -> Result<DateTime<Utc>>;
}

/// Telemetry client bound to one logged-in session
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    auth: Arc<AuthClient>,
    session: Session,
}

impl TelemetryClient {
    /// Create a telemetry client
    pub fn new(auth: Arc<AuthClient>, session: Session) -> Self {
        Self { auth, session }
    }

    /// POST `request` with authorized headers and return `data.vehicleState`
    async fn vehicle_state_payload(&self, request: &GraphQlRequest) -> Result<Value> {
        let operation = request.operation_name.as_str();
        let headers = self.auth.authorized_headers(&self.session).await?;

        let body = self
            .auth
            .network()
            .post(request, &headers)
            .await
            .map_err(|e| match e {
                crate::Error::Network {
                    status: Some(401), ..
                } => crate::Error::auth_required("the gateway rejected the stored session"),
                other => crate::Error::fetch(operation.to_string(), other.to_string()),
            })?;

        let errors = graphql::response_errors(&body);
        if errors.iter().any(|e| e.is_unauthenticated()) {
            return Err(crate::Error::auth_required(format!(
                "the gateway rejected the stored session: {}",
                graphql::describe_errors(&errors)
            )));
        }

        match graphql::data_field(&body, "vehicleState") {
            Some(state) => Ok(state.clone()),
            None if errors.is_empty() => Err(crate::Error::fetch(
                operation,
                "response has no vehicleState",
            )),
            None => Err(crate::Error::fetch(
                operation.to_string(),
                graphql::describe_errors(&errors),
            )),
        }
    }
}

#[async_trait::async_trait]
impl TelemetryProvider for TelemetryClient {
    async fn fetch_vehicle_state(
        &self,
        vehicle_id: &str,
        field_set: FieldSet,
    ) -> Result<VehicleSnapshot> {
        let request = queries::vehicle_state(vehicle_id, field_set);
        let state = self.vehicle_state_payload(&request).await?;
        let fetched_at = Utc::now();

        let snapshot = VehicleSnapshot::from_state_json(state, fetched_at).map_err(|e| {
            crate::Error::fetch("GetVehicleState".to_string(), format!("malformed vehicle state: {}", e))
        })?;
        debug!(
            vehicle_id,
            power_state = %snapshot.power_state,
            "Fetched vehicle state"
        );
        Ok(snapshot)
    }

    async fn fetch_last_connection(&self, vehicle_id: &str) -> Result<DateTime<Utc>> {
        let request = queries::last_connection(vehicle_id);
        let state = self.vehicle_state_payload(&request).await?;

        let raw = state
            .get("cloudConnection")
            .and_then(|c| c.get("lastSync"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                crate::Error::fetch("GetVehicleLastConnection", "response has no lastSync")
            })?;

        let last_sync = DateTime::parse_from_rfc3339(raw).map_err(|e| {
            crate::Error::fetch(
                "GetVehicleLastConnection".to_string(),
                format!("invalid lastSync '{}': {}", raw, e),
            )
        })?;
        Ok(last_sync.with_timezone(&Utc))
    }
}
