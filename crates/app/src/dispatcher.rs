//! Ring dispatcher — turns a decoded [`ActionSpec`] into actuator calls.

use belfry_domain::action::ActionSpec;
use belfry_domain::error::BelfryError;

use crate::ports::Actuator;

/// Drives the actuator for one action.
pub struct RingDispatcher<A> {
    actuator: A,
}

impl<A: Actuator> RingDispatcher<A> {
    pub fn new(actuator: A) -> Self {
        Self { actuator }
    }

    #[must_use]
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Perform `action`. Blocks for the whole pulse sequence.
    ///
    /// Unrecognized actions are skipped with a warning and reported as
    /// `Ok(false)`; nothing is actuated.
    ///
    /// # Errors
    ///
    /// Propagates the actuator's failure.
    pub async fn dispatch(&self, action: &ActionSpec) -> Result<bool, BelfryError> {
        match action {
            ActionSpec::On => self.actuator.turn_on().await?,
            ActionSpec::Off => self.actuator.turn_off().await?,
            ActionSpec::Timer { seconds } => self.actuator.pulse(*seconds).await?,
            ActionSpec::Repeat {
                count,
                on_seconds,
                off_seconds,
            } => {
                self.actuator
                    .repeat_pulse(*count, *on_seconds, *off_seconds)
                    .await?;
            }
            ActionSpec::Unrecognized(raw) => {
                tracing::warn!(action = %raw, "ignoring unrecognized ring action");
                return Ok(false);
            }
        }
        tracing::debug!(%action, "ring action dispatched");
        Ok(true)
    }
}
