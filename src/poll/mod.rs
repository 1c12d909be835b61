//! Adaptive polling of the vehicle state
//!
//! The engine owns the per-run cursor; the scheduler and output sink are
//! injected so the state machine can be driven without real delays.

pub mod engine;
pub mod output;
pub mod scheduler;

pub use engine::{NextStep, PollConfig, PollCursor, PollingEngine, RunOutcome};
pub use output::{LineKind, MemorySink, OutputSink, WriterSink};
pub use scheduler::{Scheduler, SleepOutcome, TokioScheduler};
