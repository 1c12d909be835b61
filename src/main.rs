//! Command-line entry point for rivian-telemetry
//!
//! # Usage
//!
//! ```bash
//! rivian-telemetry login --username me@example.com
//! rivian-telemetry poll --vehicle-id 01-234567890 --inactivity-wait 1800
//! rivian-telemetry poll --vehicle-id 01-234567890 --query
//! rivian-telemetry state --vehicle-id 01-234567890
//! rivian-telemetry last-seen --vehicle-id 01-234567890
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rivian_telemetry::cli::{
    login::{LoginArgs, run_login_mode},
    poll::{PollArgs, run_poll_mode},
    state::{LastSeenArgs, StateArgs, run_last_seen_mode, run_state_mode},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "rivian-telemetry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account email
        #[arg(short, long, env = "RIVIAN_USERNAME")]
        username: Option<String>,

        /// Account password
        #[arg(short, long, env = "RIVIAN_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// One-time passcode, prompted for when required and not given
        #[arg(long)]
        otp: Option<String>,
    },

    /// Poll the vehicle state and log changes as CSV
    Poll {
        /// Vehicle to poll (required unless RIVIAN_VEHICLE_ID or [polling].vehicle_id is set)
        #[arg(long, value_name = "ID")]
        vehicle_id: Option<String>,

        /// Seconds between polls
        #[arg(short, long, value_name = "SECS")]
        interval: Option<u64>,

        /// Seconds without changes before pausing so the vehicle can sleep (0 disables)
        #[arg(long, value_name = "SECS")]
        inactivity_wait: Option<u64>,

        /// Seconds to pause polling once inactive
        #[arg(long, value_name = "SECS")]
        sleep_wait: Option<u64>,

        /// Print every sample, not only changes
        #[arg(short, long)]
        all: bool,

        /// Print a single record and exit
        #[arg(short, long)]
        query: bool,

        /// Kilometres and km/h instead of miles and mph
        #[arg(long)]
        metric: bool,

        /// Omit location columns
        #[arg(long)]
        privacy: bool,
    },

    /// Print the vehicle state as JSON
    State {
        /// Vehicle to query (required unless RIVIAN_VEHICLE_ID or [polling].vehicle_id is set)
        #[arg(long, value_name = "ID")]
        vehicle_id: Option<String>,

        /// Only the fields used by the poller
        #[arg(long)]
        minimal: bool,
    },

    /// Print when the vehicle last connected to the cloud
    LastSeen {
        /// Vehicle to query (required unless RIVIAN_VEHICLE_ID or [polling].vehicle_id is set)
        #[arg(long, value_name = "ID")]
        vehicle_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Login {
            username,
            password,
            otp,
        } => {
            run_login_mode(LoginArgs {
                config: cli.config,
                username,
                password,
                otp,
                verbose: cli.verbose,
            })
            .await
        }
        Commands::Poll {
            vehicle_id,
            interval,
            inactivity_wait,
            sleep_wait,
            all,
            query,
            metric,
            privacy,
        } => {
            run_poll_mode(PollArgs {
                config: cli.config,
                vehicle_id,
                interval,
                inactivity_wait,
                sleep_wait,
                all,
                query,
                metric,
                privacy,
                verbose: cli.verbose,
            })
            .await
        }
        Commands::State {
            vehicle_id,
            minimal,
        } => {
            run_state_mode(StateArgs {
                config: cli.config,
                vehicle_id,
                minimal,
                verbose: cli.verbose,
            })
            .await
        }
        Commands::LastSeen { vehicle_id } => {
            run_last_seen_mode(LastSeenArgs {
                config: cli.config,
                vehicle_id,
                verbose: cli.verbose,
            })
            .await
        }
    }
}
