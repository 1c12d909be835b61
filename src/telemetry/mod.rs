//! Vehicle telemetry
//!
//! Fetches vehicle-state snapshots and the last cloud connection time
//! through the authenticated gateway.

pub mod client;
pub mod queries;

pub use client::{TelemetryClient, TelemetryProvider};
pub use queries::FieldSet;
