//! Command runners for the `rivian-telemetry` binary
//!
//! Each runner loads configuration before initializing logging so the
//! configured log level applies from the first line.

pub mod login;
pub mod poll;
pub mod state;

use crate::{
    Settings,
    config::ConfigLoader,
    error::format_error,
    session::{AuthClient, SessionStore},
    telemetry::TelemetryClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch::Receiver;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Load settings with precedence: file (from `--config`, `RIVIAN_CONFIG` or
/// the default location), then environment. CLI overrides are applied by
/// the caller.
pub fn load_settings(config: Option<PathBuf>) -> anyhow::Result<Settings> {
    let config_path = config.or_else(ConfigLoader::get_config_path);
    ConfigLoader::new()
        .load(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!(format_error(&e)))
}

/// Log filter with precedence: `--verbose`, then `RUST_LOG`, then the
/// configured level
pub fn build_env_filter(verbose: bool, settings: &Settings) -> EnvFilter {
    if verbose || settings.logging.verbose {
        EnvFilter::new("debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(&settings.logging.level)
    }
}

/// Install the stderr subscriber; stdout carries command output
pub fn init_logging(verbose: bool, settings: &Settings) {
    // A subscriber may already be installed when runners are invoked in-process
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbose, settings))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Restore the stored session and build a telemetry client on top of it
///
/// With `cancel_rx`, a pending CSRF retry stops once it turns true.
pub async fn connect(
    settings: &Settings,
    cancel_rx: Option<Receiver<bool>>,
) -> crate::Result<TelemetryClient> {
    let store = SessionStore::from_settings(settings)?;
    let session = store.load().await?;
    let mut auth = AuthClient::new(settings)?;
    if let Some(cancel_rx) = cancel_rx {
        auth = auth.with_cancellation(cancel_rx);
    }
    Ok(TelemetryClient::new(Arc::new(auth), session))
}

/// Vehicle id from the command line or configuration
pub fn require_vehicle_id(cli_value: Option<String>, settings: &Settings) -> anyhow::Result<String> {
    cli_value
        .or_else(|| settings.polling.vehicle_id.clone())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("No vehicle id given. Pass --vehicle-id or set RIVIAN_VEHICLE_ID")
        })
}
