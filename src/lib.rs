//! Rivian vehicle telemetry client
//!
//! Authenticates against the Rivian GraphQL gateway and samples a vehicle's
//! live state, turning snapshots into a change-driven CSV log while backing
//! off so the vehicle is still allowed to fall asleep.
//!
//! # Architecture
//!
//! - [`session::SessionStore`] persists the long-lived token triple
//! - [`session::AuthClient`] logs in, completes OTP challenges and bootstraps
//!   the per-process CSRF pair
//! - [`telemetry::TelemetryClient`] fetches vehicle-state snapshots
//! - [`poll::PollingEngine`] runs the fetch, compare, emit, sleep loop
//!
//! # Examples
//!
//! ```no_run
//! use rivian_telemetry::{
//!     Settings,
//!     poll::{PollConfig, PollingEngine, TokioScheduler, WriterSink},
//!     session::{AuthClient, SessionStore},
//!     telemetry::TelemetryClient,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = Settings::default();
//! let session = SessionStore::from_settings(&settings)?.load().await?;
//! let auth = Arc::new(AuthClient::new(&settings)?);
//! let client = TelemetryClient::new(auth, session);
//!
//! let (scheduler, _cancel) = TokioScheduler::new();
//! let config = PollConfig::from_settings("01-234567890", &settings.polling);
//! PollingEngine::new(client, scheduler, config)
//!     .run(&mut WriterSink::stdio())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod poll;
pub mod session;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use config::{ConfigLoader, Settings};
pub use error::{Error, Result};
pub use poll::{PollConfig, PollingEngine};
pub use session::{AuthClient, SessionStore};
pub use telemetry::{TelemetryClient, TelemetryProvider};
pub use types::{Session, VehicleSnapshot};
