//! Actuator port — the relay driving the bell.

use std::future::Future;
use std::time::Duration;

use belfry_domain::error::BelfryError;

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// Physical (or simulated) bell relay.
///
/// Only [`turn_on`](Self::turn_on) and [`turn_off`](Self::turn_off) are
/// required; pulses are built from them and block for their whole duration.
pub trait Actuator: Send + Sync {
    fn turn_on(&self) -> impl Future<Output = Result<(), BelfryError>> + Send;

    fn turn_off(&self) -> impl Future<Output = Result<(), BelfryError>> + Send;

    /// On for `on_seconds`, then off.
    fn pulse(&self, on_seconds: f64) -> impl Future<Output = Result<(), BelfryError>> + Send {
        async move {
            self.turn_on().await?;
            tokio::time::sleep(seconds(on_seconds)).await;
            self.turn_off().await
        }
    }

    /// `count` pulses, each followed by `off_seconds` of silence.
    fn repeat_pulse(
        &self,
        count: u32,
        on_seconds: f64,
        off_seconds: f64,
    ) -> impl Future<Output = Result<(), BelfryError>> + Send {
        async move {
            for _ in 0..count {
                self.pulse(on_seconds).await?;
                tokio::time::sleep(seconds(off_seconds)).await;
            }
            Ok(())
        }
    }
}
