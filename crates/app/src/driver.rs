//! Polling driver — the loop that keeps the bell ringing.
//!
//! Each iteration yields for a short tick, runs one [`ScheduleEngine::cycle`]
//! and suspends for as long as the outcome allows. A schedule mutation wakes
//! the driver early; a failed cycle is logged and retried after a backoff.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::{Cycle, ScheduleEngine};
use crate::ports::{Actuator, Clock, ScheduleStore};

/// Suspension intervals used by the [`PollingDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Yield before every cycle.
    pub tick: Duration,
    /// Nothing scheduled today.
    pub idle: Duration,
    /// Nothing eligible right now.
    pub retry: Duration,
    /// After a failed cycle.
    pub error_backoff: Duration,
    /// While the clock is unsynchronized.
    pub unsynced_backoff: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            idle: Duration::from_secs(50),
            retry: Duration::from_secs(50),
            error_backoff: Duration::from_secs(1),
            unsynced_backoff: Duration::from_secs(5),
        }
    }
}

fn seconds(value: i64) -> Duration {
    Duration::from_secs(u64::try_from(value).unwrap_or_default())
}

pub struct PollingDriver<S, A, C> {
    engine: Arc<ScheduleEngine<S, A, C>>,
    config: DriverConfig,
}

impl<S, A, C> PollingDriver<S, A, C>
where
    S: ScheduleStore,
    A: Actuator,
    C: Clock,
{
    pub fn new(engine: Arc<ScheduleEngine<S, A, C>>, config: DriverConfig) -> Self {
        Self { engine, config }
    }

    /// How long to suspend after `cycle`.
    #[must_use]
    pub fn pause_after(&self, cycle: Cycle) -> Duration {
        match cycle {
            Cycle::Unsynchronized => self.config.unsynced_backoff,
            Cycle::Idle => self.config.idle,
            Cycle::Exhausted => self.config.retry,
            Cycle::Fired { .. } => Duration::ZERO,
            Cycle::WaitUntil(secs) | Cycle::WaitForGap(secs) => seconds(secs),
        }
    }

    /// Run one cycle and return the suspension that should follow it.
    /// Never fails: errors are logged and turned into a backoff.
    pub async fn step(&self) -> Duration {
        match self.engine.cycle().await {
            Ok(cycle) => self.pause_after(cycle),
            Err(err) => {
                tracing::error!(error = %err, "polling cycle failed");
                self.config.error_backoff
            }
        }
    }

    /// Loop forever. Cancel by aborting the task.
    pub async fn run(self) {
        tracing::info!(tick = ?self.config.tick, "polling driver started");
        loop {
            tokio::time::sleep(self.config.tick).await;
            let pause = self.step().await;
            if pause.is_zero() {
                continue;
            }
            tracing::trace!(?pause, "driver suspended");
            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                () = self.engine.woken() => tracing::debug!("driver woken by schedule change"),
            }
        }
    }
}
