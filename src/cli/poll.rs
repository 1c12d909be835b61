//! Poll command
//!
//! Streams the change-driven CSV log to stdout until Ctrl-C, or prints a
//! single record with `--query`.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    Settings,
    cli::{connect, init_logging, load_settings, require_vehicle_id},
    error::format_error,
    poll::{PollConfig, PollingEngine, RunOutcome, TokioScheduler, WriterSink},
};

/// Arguments for the poll command
#[derive(Debug, Default)]
pub struct PollArgs {
    pub config: Option<PathBuf>,
    pub vehicle_id: Option<String>,
    pub interval: Option<u64>,
    pub inactivity_wait: Option<u64>,
    pub sleep_wait: Option<u64>,
    pub all: bool,
    pub query: bool,
    pub metric: bool,
    pub privacy: bool,
    pub verbose: bool,
}

/// Apply command-line overrides on top of the loaded settings
pub fn apply_overrides(settings: &mut Settings, args: &PollArgs) -> crate::Result<()> {
    if let Some(secs) = args.interval {
        settings.polling.poll_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.inactivity_wait {
        settings.polling.inactivity_wait = Duration::from_secs(secs);
    }
    if let Some(secs) = args.sleep_wait {
        settings.polling.sleep_wait = Duration::from_secs(secs);
    }
    settings.polling.show_all_samples |= args.all;
    settings.polling.metric |= args.metric;
    settings.polling.privacy |= args.privacy;
    settings.validate()
}

/// Run the poll command
pub async fn run_poll_mode(args: PollArgs) -> Result<()> {
    let mut settings = load_settings(args.config.clone())?;
    apply_overrides(&mut settings, &args).map_err(|e| anyhow::anyhow!(format_error(&e)))?;
    init_logging(args.verbose, &settings);

    let vehicle_id = require_vehicle_id(args.vehicle_id.clone(), &settings)?;
    let (scheduler, cancel_tx) = TokioScheduler::new();
    let client = connect(&settings, Some(cancel_tx.subscribe()))
        .await
        .map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    let config = PollConfig::from_settings(vehicle_id, &settings.polling).with_single_shot(args.query);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                let _ = cancel_tx.send(true);
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    info!(
        vehicle_id = %config.vehicle_id,
        interval = config.poll_interval.as_secs(),
        inactivity_wait = config.inactivity_wait.as_secs(),
        sleep_wait = config.sleep_wait.as_secs(),
        "Starting polling"
    );

    let mut engine = PollingEngine::new(client, scheduler, config);
    let mut sink = WriterSink::stdio();
    match engine.run(&mut sink).await {
        Ok(RunOutcome::Completed) | Ok(RunOutcome::Cancelled) => Ok(()),
        Err(e) => Err(anyhow::anyhow!(format_error(&e))),
    }
}
