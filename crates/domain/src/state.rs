//! Engine runtime state and tunables.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// `progress` value meaning "nothing fired today".
pub const NO_PROGRESS: i64 = -1;

/// Runtime state written by the engine after every firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// Normalized time of the last fired trigger, or [`NO_PROGRESS`].
    pub progress: i64,
    /// Time of day of the last actuation; drives the minimum-gap guard.
    pub last_ring: i64,
    pub is_complete: bool,
    /// Epoch second at which the day's run completed.
    pub completed_on: i64,
    /// Day-boundary wraps observed since the last reset.
    pub midnight_reset_count: u32,
}

impl EngineState {
    /// Fresh state for the given tunables: nothing fired, gap guard open.
    #[must_use]
    pub fn fresh(tunables: Tunables) -> Self {
        Self {
            progress: NO_PROGRESS,
            last_ring: -tunables.gap,
            is_complete: false,
            completed_on: 0,
            midnight_reset_count: 0,
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::fresh(Tunables::default())
    }
}

/// Operator-adjustable engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunables {
    /// Minimum seconds between two actuations.
    pub gap: i64,
    /// Seconds a missed trigger stays eligible for catch-up firing.
    pub max_wait: i64,
}

impl Tunables {
    pub const DEFAULT_GAP: i64 = 5;
    pub const DEFAULT_MAX_WAIT: i64 = 60;

    /// Apply optional overrides, validating each.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTunable`] for a negative gap or a
    /// non-positive catch-up window.
    pub fn with(self, gap: Option<i64>, max_wait: Option<i64>) -> Result<Self, ValidationError> {
        let gap = gap.unwrap_or(self.gap);
        let max_wait = max_wait.unwrap_or(self.max_wait);
        if gap < 0 {
            return Err(ValidationError::InvalidTunable {
                name: "gap",
                reason: "must not be negative",
            });
        }
        if max_wait <= 0 {
            return Err(ValidationError::InvalidTunable {
                name: "max_wait",
                reason: "must be positive",
            });
        }
        Ok(Self { gap, max_wait })
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            gap: Self::DEFAULT_GAP,
            max_wait: Self::DEFAULT_MAX_WAIT,
        }
    }
}
