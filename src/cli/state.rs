//! One-shot inspection commands: `state` and `last-seen`

use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::debug;

use crate::{
    cli::{connect, init_logging, load_settings, require_vehicle_id},
    error::format_error,
    telemetry::{FieldSet, TelemetryProvider},
};

/// Arguments for the state command
#[derive(Debug)]
pub struct StateArgs {
    pub config: Option<PathBuf>,
    pub vehicle_id: Option<String>,
    pub minimal: bool,
    pub verbose: bool,
}

/// Arguments for the last-seen command
#[derive(Debug)]
pub struct LastSeenArgs {
    pub config: Option<PathBuf>,
    pub vehicle_id: Option<String>,
    pub verbose: bool,
}

/// Print one vehicle-state snapshot as JSON
pub async fn run_state_mode(args: StateArgs) -> Result<()> {
    let settings = load_settings(args.config)?;
    init_logging(args.verbose, &settings);

    let vehicle_id = require_vehicle_id(args.vehicle_id, &settings)?;
    let client = connect(&settings, None)
        .await
        .map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    let field_set = if args.minimal {
        FieldSet::Minimal
    } else {
        FieldSet::Full
    };
    debug!(?field_set, "Fetching vehicle state");

    let snapshot = client
        .fetch_vehicle_state(&vehicle_id, field_set)
        .await
        .map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Print the last time the vehicle synced with the cloud, in local time
pub async fn run_last_seen_mode(args: LastSeenArgs) -> Result<()> {
    let settings = load_settings(args.config)?;
    init_logging(args.verbose, &settings);

    let vehicle_id = require_vehicle_id(args.vehicle_id, &settings)?;
    let client = connect(&settings, None)
        .await
        .map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    let last_sync = client
        .fetch_last_connection(&vehicle_id)
        .await
        .map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    println!(
        "Vehicle last seen: {}",
        last_sync.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %Z")
    );
    Ok(())
}
