//! Schedule service — management use-cases on top of the [`ScheduleEngine`].
//!
//! Every mutating call is a single locked read-modify-commit and wakes the
//! polling driver afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use belfry_domain::action::ActionSpec;
use belfry_domain::book::{Activation, Assignment, Deletion, DocumentKey, ScheduleMap};
use belfry_domain::error::{BelfryError, ValidationError};
use belfry_domain::state::{EngineState, Tunables};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::engine::ScheduleEngine;
use crate::ports::{Actuator, Clock, ScheduleStore};

/// One merged trigger of today's timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingTrigger {
    /// Seconds since local midnight.
    pub at: i64,
    pub action: ActionSpec,
}

/// Engine state as reported to operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    #[serde(flatten)]
    pub state: EngineState,
    #[serde(flatten)]
    pub tunables: Tunables,
    pub synchronized: bool,
    pub local_time: String,
    pub today: Vec<UpcomingTrigger>,
}

/// Application service for managing schedules and the engine.
pub struct ScheduleService<S, A, C> {
    engine: Arc<ScheduleEngine<S, A, C>>,
}

impl<S, A, C> Clone for ScheduleService<S, A, C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S, A, C> ScheduleService<S, A, C>
where
    S: ScheduleStore,
    A: Actuator,
    C: Clock,
{
    pub fn new(engine: Arc<ScheduleEngine<S, A, C>>) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<ScheduleEngine<S, A, C>> {
        &self.engine
    }

    /// The stored document, restricted to `keys` when given.
    ///
    /// # Errors
    ///
    /// Only fails if encoding the document fails.
    pub async fn document(
        &self,
        keys: Option<Vec<DocumentKey>>,
    ) -> Result<Map<String, Value>, BelfryError> {
        let keys = keys.unwrap_or_else(|| DocumentKey::ALL.to_vec());
        let snapshot = self.engine.read(|book, _| book.snapshot(&keys)).await?;
        Ok(snapshot)
    }

    /// Create schedules (replacing existing ones when `overwrite` is set) and
    /// add names to the weekly, monthly and once indices, as one commit.
    ///
    /// # Errors
    ///
    /// Returns [`BelfryError::NotFound`] for an assigned name that neither
    /// exists nor is being saved, [`BelfryError::Validation`] for a blank name
    /// or an out-of-range day, or a storage error. Nothing is saved on error.
    #[tracing::instrument(skip(self, schedules, assignment), fields(count = schedules.len()))]
    pub async fn save_schedules(
        &self,
        schedules: ScheduleMap,
        overwrite: bool,
        assignment: Assignment,
        remove_existing: bool,
    ) -> Result<Vec<String>, BelfryError> {
        let written = self
            .engine
            .mutate(|book, _| book.save(schedules, overwrite, assignment, remove_existing))
            .await?;
        tracing::info!(?written, "schedules saved");
        Ok(written)
    }

    /// Delete schedules and purge every reference to them.
    ///
    /// # Errors
    ///
    /// Returns a storage error when saving fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_schedules(
        &self,
        names: Vec<String>,
        force: bool,
    ) -> Result<Deletion, BelfryError> {
        let deletion = self
            .engine
            .mutate(|book, _| Ok(book.delete_schedules(&names, force)))
            .await?;
        tracing::info!(
            deleted = ?deletion.deleted.keys().collect::<Vec<_>>(),
            skipped = ?deletion.skipped_active,
            "schedules deleted"
        );
        Ok(deletion)
    }

    /// Replace the active set.
    ///
    /// # Errors
    ///
    /// Returns [`BelfryError::NotFound`] for an unknown schedule, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_active(&self, names: Vec<String>) -> Result<(), BelfryError> {
        self.engine
            .mutate(|book, _| Ok(book.set_active(names)?))
            .await
    }

    /// Replace the skip set of each given date.
    ///
    /// # Errors
    ///
    /// Returns [`BelfryError::NotFound`] for an unknown schedule, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn update_skip(
        &self,
        skip: BTreeMap<NaiveDate, Vec<String>>,
    ) -> Result<(), BelfryError> {
        self.engine
            .mutate(|book, _| Ok(book.update_skip(skip)?))
            .await
    }

    /// Run `name` today: instantiate a wild template, or schedule a
    /// recurring schedule as a one-time run.
    ///
    /// # Errors
    ///
    /// Returns [`BelfryError::NotFound`] for an unknown schedule, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn activate(&self, name: &str) -> Result<Activation, BelfryError> {
        let activation = self
            .engine
            .mutate(|book, now| Ok(book.activate(name, now)?))
            .await?;
        tracing::info!(schedule = name, ?activation, "schedule activated");
        Ok(activation)
    }

    /// Ring the bell once with a raw `mode/p1/p2/p3` action.
    ///
    /// Returns `false` when the action was not recognized and nothing rang.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAction`] for a blank action, or the
    /// actuator's failure.
    #[tracing::instrument(skip(self))]
    pub async fn ring(&self, action: &str) -> Result<bool, BelfryError> {
        if action.trim().is_empty() {
            return Err(ValidationError::EmptyAction.into());
        }
        self.engine.ring(&ActionSpec::parse(action)).await
    }

    /// Current engine state, tunables and today's merged timeline.
    pub async fn engine_status(&self) -> EngineStatus {
        let synchronized = self.engine.clock().is_synchronized();
        self.engine
            .read(|book, now| EngineStatus {
                state: *book.state(),
                tunables: book.tunables(),
                synchronized,
                local_time: now.to_string(),
                today: book
                    .resolve(now)
                    .slots()
                    .iter()
                    .map(|slot| UpcomingTrigger {
                        at: slot.time_of_day(),
                        action: slot.action.clone(),
                    })
                    .collect(),
            })
            .await
    }

    /// Override the gap and/or catch-up window.
    ///
    /// # Errors
    ///
    /// Returns [`BelfryError::Validation`] for an out-of-range value, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_tunables(
        &self,
        gap: Option<i64>,
        max_wait: Option<i64>,
    ) -> Result<Tunables, BelfryError> {
        self.engine
            .mutate(|book, _| Ok(book.set_tunables(gap, max_wait)?))
            .await
    }

    /// Forget all progress and restore the default engine state.
    ///
    /// # Errors
    ///
    /// Returns a storage error when removing the stored state fails.
    #[tracing::instrument(skip(self))]
    pub async fn reset_engine_state(&self) -> Result<(), BelfryError> {
        self.engine.reset_state().await
    }

    /// Set the wall clock and mark it synchronized.
    #[tracing::instrument(skip(self))]
    pub fn synchronize_clock(&self, epoch: i64) {
        self.engine.clock().synchronize(epoch);
        self.engine.wake();
        tracing::info!(epoch, "clock synchronized");
    }
}
