//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rivian_telemetry::{
    Result, Settings,
    poll::{Scheduler, SleepOutcome},
    session::{AuthClient, NetworkManager},
    telemetry::{FieldSet, TelemetryProvider},
    types::VehicleSnapshot,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test configuration factory
pub struct TestConfig;

impl TestConfig {
    /// Settings pointing at a mock gateway
    pub fn for_server(server: &MockServer) -> Settings {
        let mut settings = Settings::default();
        settings.api.gateway_url = format!("{}/graphql", server.uri());
        settings.api.request_timeout = Duration::from_secs(5);
        settings.logging.level = "debug".to_string();
        settings
    }

    /// Auth client against a mock gateway with a fast CSRF retry
    pub fn auth_client(server: &MockServer) -> AuthClient {
        let network = NetworkManager::new(&Self::for_server(server)).unwrap();
        AuthClient::with_network(network, Duration::from_millis(10))
    }
}

/// Test data factory
pub struct MockData;

impl MockData {
    /// `data.vehicleState` of the minimal field set
    pub fn vehicle_state(power_state: &str, mileage_meters: f64) -> Value {
        json!({
            "cloudConnection": { "lastSync": "2024-03-01T17:22:05.123Z" },
            "powerState": { "value": power_state },
            "driveMode": { "value": "everyday" },
            "gearStatus": { "value": "park" },
            "vehicleMileage": { "value": mileage_meters },
            "batteryLevel": { "value": 81.5 },
            "distanceToEmpty": { "value": 402.0 },
            "gnssLocation": { "latitude": 37.5, "longitude": -122.25 },
            "chargerStatus": { "value": "chrgr_sts_not_connected" },
            "chargerState": { "value": "charging_ready" },
            "batteryLimit": { "value": 85.0 },
            "timeToEndOfCharge": { "value": 0 }
        })
    }

    pub fn snapshot(power_state: &str, mileage_meters: f64) -> VehicleSnapshot {
        VehicleSnapshot::from_state_json(Self::vehicle_state(power_state, mileage_meters), Utc::now())
            .unwrap()
    }

    pub fn state_response(state: Value) -> Value {
        json!({ "data": { "vehicleState": state } })
    }

    pub fn csrf_response() -> Value {
        json!({
            "data": { "createCsrfToken": {
                "__typename": "CreateCsrfTokenResponse",
                "csrfToken": "csrf-token-1",
                "appSessionToken": "app-session-1"
            } }
        })
    }

    pub fn login_response() -> Value {
        json!({
            "data": { "login": {
                "__typename": "MobileLoginResponse",
                "accessToken": "access-1",
                "refreshToken": "refresh-1",
                "userSessionToken": "user-session-1"
            } }
        })
    }

    pub fn mfa_response() -> Value {
        json!({
            "data": { "login": {
                "__typename": "MobileMFALoginResponse",
                "otpToken": "otp-token-1"
            } }
        })
    }

    pub fn otp_response() -> Value {
        json!({
            "data": { "loginWithOTP": {
                "__typename": "MobileLoginResponse",
                "accessToken": "access-otp",
                "refreshToken": "refresh-otp",
                "userSessionToken": "user-session-otp"
            } }
        })
    }

    pub fn graphql_error(message: &str, code: &str) -> Value {
        json!({
            "data": null,
            "errors": [ { "message": message, "extensions": { "code": code } } ]
        })
    }
}

/// Mock server factory
pub struct MockServerFactory;

impl MockServerFactory {
    pub async fn new() -> MockServer {
        MockServer::start().await
    }

    fn operation(name: &str) -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_partial_json(json!({ "operationName": name })))
    }

    pub async fn setup_csrf(server: &MockServer) {
        Self::operation("CreateCSRFToken")
            .respond_with(ResponseTemplate::new(200).set_body_json(MockData::csrf_response()))
            .mount(server)
            .await;
    }

    pub async fn setup_operation(server: &MockServer, name: &str, body: Value) {
        Self::operation(name)
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    pub async fn setup_operation_status(server: &MockServer, name: &str, status: u16) {
        Self::operation(name)
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream error"))
            .mount(server)
            .await;
    }

    pub async fn setup_vehicle_state(server: &MockServer, state: Value) {
        Self::setup_operation(server, "GetVehicleState", MockData::state_response(state)).await;
    }

    /// Number of requests received for one operation
    pub async fn count(server: &MockServer, name: &str) -> usize {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| {
                serde_json::from_slice::<Value>(&request.body)
                    .map(|body| body["operationName"] == name)
                    .unwrap_or(false)
            })
            .count()
    }
}

/// Provider replaying a scripted sequence, then repeating a fallback snapshot
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<VehicleSnapshot>>>,
    fallback: Option<VehicleSnapshot>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<VehicleSnapshot>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: Mutex::new(0),
        }
    }

    pub fn repeating(snapshot: VehicleSnapshot) -> Self {
        Self::new(Vec::new()).then_repeat(snapshot)
    }

    pub fn then_repeat(mut self, snapshot: VehicleSnapshot) -> Self {
        self.fallback = Some(snapshot);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl TelemetryProvider for ScriptedProvider {
    async fn fetch_vehicle_state(&self, _: &str, _: FieldSet) -> Result<VehicleSnapshot> {
        *self.calls.lock().unwrap() += 1;
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        self.fallback.clone().ok_or_else(|| {
            rivian_telemetry::Error::fetch("GetVehicleState", "script exhausted")
        })
    }

    async fn fetch_last_connection(&self, _: &str) -> Result<DateTime<Utc>> {
        Ok(ManualScheduler::epoch())
    }
}

#[derive(Debug)]
struct ManualState {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
    cancel_after: Option<usize>,
    cancelled: bool,
}

/// Scheduler with a virtual clock advanced only by `sleep`
#[derive(Debug)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Self::epoch(),
                sleeps: Vec::new(),
                cancel_after: None,
                cancelled: false,
            }),
        }
    }

    /// Cancel on the `n`th sleep
    pub fn cancel_after(self, n: usize) -> Self {
        self.state.lock().unwrap().cancel_after = Some(n);
        self
    }

    pub fn cancelled() -> Self {
        let scheduler = Self::new();
        scheduler.state.lock().unwrap().cancelled = true;
        scheduler
    }

    /// Advance the clock without recording a sleep (simulated fetch latency)
    pub fn advance(&self, by: Duration) {
        self.state.lock().unwrap().now += chrono::TimeDelta::from_std(by).unwrap();
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap().sleeps.clone()
    }
}

#[async_trait::async_trait]
impl Scheduler for ManualScheduler {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().now
    }

    async fn sleep(&self, duration: Duration) -> SleepOutcome {
        let mut state = self.state.lock().unwrap();
        if state.cancelled {
            return SleepOutcome::Cancelled;
        }
        state.sleeps.push(duration);
        if state.cancel_after == Some(state.sleeps.len()) {
            state.cancelled = true;
            return SleepOutcome::Cancelled;
        }
        state.now += chrono::TimeDelta::from_std(duration).unwrap();
        SleepOutcome::Elapsed
    }

    fn is_cancelled(&self) -> bool {
        self.state.lock().unwrap().cancelled
    }
}
