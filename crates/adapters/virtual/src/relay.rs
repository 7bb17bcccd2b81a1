//! Virtual relay — responds to `turn_on` / `turn_off` and records each call.

use std::sync::{Mutex, MutexGuard, PoisonError};

use belfry_app::ports::Actuator;
use belfry_domain::error::BelfryError;
use belfry_domain::time::{Timestamp, now};

/// Position of the relay contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    On,
    #[default]
    Off,
}

/// One recorded relay transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actuation {
    pub state: RelayState,
    pub at: Timestamp,
}

/// A simulated bell relay.
#[derive(Default)]
pub struct VirtualRelay {
    state: Mutex<RelayState>,
    log: Mutex<Vec<Actuation>>,
}

impl VirtualRelay {
    #[must_use]
    pub fn state(&self) -> RelayState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every transition so far, oldest first.
    #[must_use]
    pub fn actuations(&self) -> Vec<Actuation> {
        self.lock_log().clone()
    }

    fn switch(&self, state: RelayState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        self.lock_log().push(Actuation { state, at: now() });
        tracing::info!(?state, "relay switched");
    }

    fn lock_log(&self) -> MutexGuard<'_, Vec<Actuation>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Actuator for VirtualRelay {
    fn turn_on(&self) -> impl Future<Output = Result<(), BelfryError>> + Send {
        self.switch(RelayState::On);
        async { Ok(()) }
    }

    fn turn_off(&self) -> impl Future<Output = Result<(), BelfryError>> + Send {
        self.switch(RelayState::Off);
        async { Ok(()) }
    }
}
