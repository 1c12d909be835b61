//! Change-driven, sleep-aware polling
//!
//! Each iteration fetches a minimal snapshot, derives the speed from the
//! previous sample, emits a CSV record when the comparable projection
//! changed, and picks the next delay. Once per wake cycle, after a long
//! enough idle period, the engine stops polling for an extended window so
//! the vehicle can fall asleep; a transition back into `ready` starts a new
//! cycle.

use crate::{
    Result,
    config::settings::PollingSettings,
    error::format_error_for_logging,
    poll::{
        output::{LineKind, OutputSink},
        scheduler::{Scheduler, SleepOutcome},
    },
    telemetry::{FieldSet, TelemetryProvider},
    types::{PowerPhase, VehicleSnapshot},
    utils::UnitSystem,
};
use chrono::{DateTime, Local, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Polling run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub vehicle_id: String,
    pub poll_interval: Duration,
    /// Zero disables the long sleep
    pub inactivity_wait: Duration,
    pub sleep_wait: Duration,
    pub show_all_samples: bool,
    pub single_shot: bool,
    pub units: UnitSystem,
    /// Suppress location columns
    pub privacy: bool,
}

impl PollConfig {
    /// Configuration for `vehicle_id` with default timings
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self::from_settings(vehicle_id, &PollingSettings::default())
    }

    /// Configuration for `vehicle_id` from the `[polling]` settings
    pub fn from_settings(vehicle_id: impl Into<String>, settings: &PollingSettings) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            poll_interval: settings.poll_interval,
            inactivity_wait: settings.inactivity_wait,
            sleep_wait: settings.sleep_wait,
            show_all_samples: settings.show_all_samples,
            single_shot: false,
            units: UnitSystem::from_metric_flag(settings.metric),
            privacy: settings.privacy,
        }
    }

    pub fn with_single_shot(mut self, single_shot: bool) -> Self {
        self.single_shot = single_shot;
        self
    }

    /// CSV header matching the emitted records
    pub fn header(&self) -> String {
        let mut columns = vec![
            "timestamp",
            "Power",
            "Drive Mode",
            "Gear",
            "Mileage",
            "Speed",
            "Battery",
            "Range",
        ];
        if !self.privacy {
            columns.extend(["Latitude", "Longitude"]);
        }
        columns.extend(["Charger Status", "Charge State", "Battery Limit", "Charge End"]);
        columns.join(",")
    }
}

/// Engine-internal state carried across iterations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollCursor {
    /// Projection of the last successful sample; cleared by a failed fetch
    pub last_comparable: Option<Vec<String>>,
    pub last_change_at: Option<DateTime<Utc>>,
    pub last_power_phase: Option<PowerPhase>,
    /// Whether this wake cycle's long sleep was taken
    pub long_sleep_used: bool,
    pub last_mileage_meters: Option<f64>,
    pub last_sample_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

/// What the loop should do after an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Wait the regular poll interval
    Poll(Duration),
    /// Take this cycle's long sleep
    LongSleep(Duration),
    /// Single-shot run finished
    Done,
}

/// How a polling run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Single-shot record emitted
    Completed,
    /// Cancellation requested
    Cancelled,
}

/// Instantaneous speed between two samples, in distance units per hour
///
/// Returns 0 without a previous sample or when no time elapsed.
pub fn instantaneous_speed(
    previous: Option<(f64, DateTime<Utc>)>,
    mileage_meters: f64,
    at: DateTime<Utc>,
    units: UnitSystem,
) -> f64 {
    let Some((previous_meters, previous_at)) = previous else {
        return 0.0;
    };
    let elapsed_secs = (at - previous_at).num_milliseconds() as f64 / 1000.0;
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    units.from_meters(mileage_meters - previous_meters) / elapsed_secs * 3600.0
}

/// Fields of a sample that decide whether a record is emitted
///
/// Everything in the record except the timestamp, in record order. Absent
/// optional fields render as empty columns.
pub fn comparable_projection(
    snapshot: &VehicleSnapshot,
    speed: f64,
    units: UnitSystem,
    privacy: bool,
) -> Vec<String> {
    let mut fields = vec![
        snapshot.power_state.clone(),
        snapshot.drive_mode.clone(),
        snapshot.gear_status.clone(),
        format!("{:.1}", units.from_meters(snapshot.mileage_meters)),
        format!("{:.1}", speed),
        format!("{:.1}%", snapshot.battery_level_pct),
        format!("{:.1}", units.from_km(snapshot.range_remaining_km)),
    ];
    if !privacy {
        match snapshot.location {
            Some(location) => {
                fields.push(location.latitude.to_string());
                fields.push(location.longitude.to_string());
            }
            None => fields.extend([String::new(), String::new()]),
        }
    }
    fields.push(snapshot.charger_status.clone().unwrap_or_default());
    fields.push(snapshot.charger_state.clone().unwrap_or_default());
    fields.push(format!("{:.1}%", snapshot.battery_limit_pct));
    fields.push(
        snapshot
            .time_to_end_of_charge_minutes
            .map(|minutes| minutes.to_string())
            .unwrap_or_default(),
    );
    fields
}

/// Local wall-clock prefix of every output line
pub fn local_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

fn record_line(at: DateTime<Utc>, projection: &[String]) -> String {
    let mut line = local_timestamp(at);
    for column in projection {
        line.push(',');
        line.push_str(column);
    }
    line
}

/// Polling state machine over a telemetry provider and a scheduler
pub struct PollingEngine<P, S> {
    provider: P,
    scheduler: S,
    config: PollConfig,
    cursor: PollCursor,
}

impl<P: TelemetryProvider, S: Scheduler> PollingEngine<P, S> {
    pub fn new(provider: P, scheduler: S, config: PollConfig) -> Self {
        Self {
            provider,
            scheduler,
            config,
            cursor: PollCursor::default(),
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn cursor(&self) -> &PollCursor {
        &self.cursor
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Fetch, compare, emit; returns the next step
    ///
    /// Only authentication failures and cancellation are returned as errors;
    /// every other fetch failure is absorbed and retried at the poll interval.
    pub async fn iterate(&mut self, sink: &mut dyn OutputSink) -> Result<NextStep> {
        let fetched = self
            .provider
            .fetch_vehicle_state(&self.config.vehicle_id, FieldSet::Minimal)
            .await;
        let now = self.scheduler.now();

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_auth_failure() || e.is_cancelled() => return Err(e),
            Err(e) => {
                self.record_failure(&e, now, sink)?;
                return Ok(NextStep::Poll(self.config.poll_interval));
            }
        };

        if self.cursor.consecutive_failures > 0 {
            info!(
                failures = self.cursor.consecutive_failures,
                "Telemetry service reachable again"
            );
            self.cursor.consecutive_failures = 0;
        }

        let phase = snapshot.power_phase();
        if self.cursor.last_power_phase != Some(PowerPhase::Ready) && phase == PowerPhase::Ready {
            if self.cursor.long_sleep_used {
                debug!("Vehicle re-entered ready, long sleep allowance restored");
            }
            self.cursor.long_sleep_used = false;
        }
        self.cursor.last_power_phase = Some(phase);

        let previous = self.cursor.last_mileage_meters.zip(self.cursor.last_sample_at);
        let speed = instantaneous_speed(previous, snapshot.mileage_meters, now, self.config.units);
        self.cursor.last_mileage_meters = Some(snapshot.mileage_meters);
        self.cursor.last_sample_at = Some(now);

        let projection =
            comparable_projection(&snapshot, speed, self.config.units, self.config.privacy);
        let changed = self.cursor.last_comparable.as_ref() != Some(&projection);
        if changed {
            self.cursor.last_change_at = Some(now);
        }
        if changed || self.config.show_all_samples || self.config.single_shot {
            sink.emit(LineKind::Record, &record_line(now, &projection))?;
        }
        self.cursor.last_comparable = Some(projection);

        if self.config.single_shot {
            return Ok(NextStep::Done);
        }

        Ok(self.next_step(phase, now))
    }

    fn record_failure(
        &mut self,
        error: &crate::Error,
        now: DateTime<Utc>,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        self.cursor.consecutive_failures = self.cursor.consecutive_failures.saturating_add(1);
        self.cursor.last_comparable = None;

        if self.cursor.consecutive_failures == 1 {
            warn!(error = %format_error_for_logging(error), "Vehicle state fetch failed");
            sink.emit(
                LineKind::Notice,
                &format!(
                    "{} Telemetry service appears unreachable, retrying every {} seconds",
                    local_timestamp(now),
                    self.config.poll_interval.as_secs()
                ),
            )?;
        } else {
            debug!(
                failures = self.cursor.consecutive_failures,
                "Vehicle state fetch failed again: {}", error
            );
        }
        Ok(())
    }

    fn next_step(&self, phase: PowerPhase, now: DateTime<Utc>) -> NextStep {
        if phase == PowerPhase::Sleep {
            return NextStep::Poll(self.config.poll_interval);
        }

        let inactivity_wait = self.config.inactivity_wait;
        if !inactivity_wait.is_zero() && !self.cursor.long_sleep_used {
            let idle = self
                .cursor
                .last_change_at
                .map(|changed_at| now - changed_at)
                .unwrap_or_else(chrono::TimeDelta::zero);
            let threshold = chrono::TimeDelta::from_std(inactivity_wait)
                .unwrap_or(chrono::TimeDelta::MAX);
            if idle >= threshold {
                return NextStep::LongSleep(self.config.sleep_wait);
            }
        }

        NextStep::Poll(self.config.poll_interval)
    }

    /// Run until cancelled, or until the single-shot record is emitted
    pub async fn run(&mut self, sink: &mut dyn OutputSink) -> Result<RunOutcome> {
        if !self.config.single_shot {
            self.emit_banner(sink)?;
        }
        sink.emit(LineKind::Header, &self.config.header())?;

        loop {
            if self.scheduler.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }

            let step = match self.iterate(sink).await {
                Ok(step) => step,
                Err(e) if e.is_cancelled() => {
                    info!("Polling cancelled");
                    return Ok(RunOutcome::Cancelled);
                }
                Err(e) => return Err(e),
            };

            let outcome = match step {
                NextStep::Done => return Ok(RunOutcome::Completed),
                NextStep::Poll(delay) => self.scheduler.sleep(delay).await,
                NextStep::LongSleep(delay) => {
                    info!(minutes = delay.as_secs() / 60, "Pausing polling so the vehicle can sleep");
                    sink.emit(
                        LineKind::Notice,
                        &format!(
                            "{} Sleeping for {} minutes",
                            local_timestamp(self.scheduler.now()),
                            delay.as_secs() / 60
                        ),
                    )?;
                    let outcome = self.scheduler.sleep(delay).await;
                    self.cursor.long_sleep_used = true;
                    if outcome == SleepOutcome::Elapsed {
                        sink.emit(LineKind::Notice, &self.resume_notice())?;
                    }
                    outcome
                }
            };

            if outcome == SleepOutcome::Cancelled {
                info!("Polling cancelled");
                return Ok(RunOutcome::Cancelled);
            }
        }
    }

    fn emit_banner(&self, sink: &mut dyn OutputSink) -> Result<()> {
        let samples = if self.config.show_all_samples {
            "showing every sample"
        } else {
            "only showing changes"
        };
        sink.emit(
            LineKind::Notice,
            &format!(
                "Polling vehicle every {} seconds, {}",
                self.config.poll_interval.as_secs(),
                samples
            ),
        )?;
        if !self.config.inactivity_wait.is_zero() {
            sink.emit(
                LineKind::Notice,
                &format!(
                    "If ready and inactive for {} minutes, polling pauses once per ready cycle for {} minutes to let the vehicle sleep",
                    self.config.inactivity_wait.as_secs() / 60,
                    self.config.sleep_wait.as_secs() / 60
                ),
            )?;
        }
        Ok(())
    }

    fn resume_notice(&self) -> String {
        let samples = if self.config.show_all_samples {
            "showing every sample"
        } else {
            "showing changes only"
        };
        format!(
            "{} Back to polling every {} seconds, {}",
            local_timestamp(self.scheduler.now()),
            self.config.poll_interval.as_secs(),
            samples
        )
    }
}
