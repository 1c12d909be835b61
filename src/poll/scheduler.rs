//! Clock and sleep abstraction for the polling loop

use chrono::{DateTime, Utc};
use std::future;
use std::time::Duration;
use tokio::sync::watch::{self, Receiver, Sender};
use tracing::trace;

/// How a scheduled sleep ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full delay elapsed
    Elapsed,
    /// Cancellation was requested before the delay elapsed
    Cancelled,
}

/// Wall clock plus cancellable sleep
#[async_trait::async_trait]
pub trait Scheduler: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Sleep for `duration` unless cancelled first
    async fn sleep(&self, duration: Duration) -> SleepOutcome;

    /// Whether cancellation has been requested
    fn is_cancelled(&self) -> bool;
}

/// Scheduler backed by the tokio timer and a cancellation channel
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    cancel_rx: Receiver<bool>,
}

impl TokioScheduler {
    /// Create a scheduler and the sender that cancels it
    pub fn new() -> (Self, Sender<bool>) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (Self { cancel_rx }, cancel_tx)
    }

    /// Create a scheduler listening on an existing channel
    pub fn with_receiver(cancel_rx: Receiver<bool>) -> Self {
        Self { cancel_rx }
    }
}

#[async_trait::async_trait]
impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) -> SleepOutcome {
        let mut cancel_rx = self.cancel_rx.clone();
        if *cancel_rx.borrow_and_update() {
            return SleepOutcome::Cancelled;
        }

        let cancelled = async move {
            // A dropped sender can never cancel
            if cancel_rx.wait_for(|cancelled| *cancelled).await.is_err() {
                future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(duration) => SleepOutcome::Elapsed,
            _ = cancelled => {
                trace!("sleep cancelled");
                SleepOutcome::Cancelled
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }
}
