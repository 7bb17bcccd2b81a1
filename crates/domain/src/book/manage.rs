//! Management mutations. Each validates its whole input before touching
//! the book, so a rejected request leaves the document unchanged.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ScheduleBook, ScheduleMap};
use crate::assignment::DAYS_IN_WEEK;
use crate::book::DocumentKey;
use crate::error::{BelfryError, NotFoundError, ValidationError};
use crate::schedule::Schedule;
use crate::state::{EngineState, Tunables};

/// Names to add to the weekly, monthly and one-time indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assignment {
    pub weekly: BTreeMap<u8, Vec<String>>,
    pub monthly: BTreeMap<u32, Vec<String>>,
    pub once: BTreeMap<NaiveDate, Vec<String>>,
}

impl Assignment {
    /// `true` when no index receives a name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weekly.is_empty() && self.monthly.is_empty() && self.once.is_empty()
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        self.weekly
            .values()
            .chain(self.monthly.values())
            .chain(self.once.values())
            .flatten()
    }
}

/// Outcome of [`ScheduleBook::delete_schedules`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Deletion {
    pub deleted: ScheduleMap,
    /// Active names left in place because `force` was not set.
    pub skipped_active: Vec<String>,
    pub missing: Vec<String>,
}

fn check_days(assignment: &Assignment) -> Result<(), ValidationError> {
    if let Some(weekday) = assignment
        .weekly
        .keys()
        .find(|day| usize::from(**day) >= DAYS_IN_WEEK)
    {
        return Err(ValidationError::WeekdayOutOfRange { weekday: *weekday });
    }
    if let Some(day) = assignment
        .monthly
        .keys()
        .find(|day| !(1..=31).contains(*day))
    {
        return Err(ValidationError::DayOfMonthOutOfRange { day: *day });
    }
    Ok(())
}

impl ScheduleBook {
    fn ensure_exists<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> Result<(), NotFoundError> {
        match names.into_iter().find(|name| !self.schedules.contains_key(*name)) {
            Some(missing) => Err(NotFoundError::schedule(missing.clone())),
            None => Ok(()),
        }
    }

    /// Insert schedules. Existing names are kept unless `overwrite` is set.
    ///
    /// Returns the names actually written.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] if any name is blank.
    pub fn upsert_schedules(
        &mut self,
        schedules: ScheduleMap,
        overwrite: bool,
    ) -> Result<Vec<String>, ValidationError> {
        if schedules.keys().any(|name| name.trim().is_empty()) {
            return Err(ValidationError::EmptyName);
        }
        let mut written = Vec::new();
        for (name, schedule) in schedules {
            if !overwrite && self.schedules.contains_key(&name) {
                continue;
            }
            if schedule.is_template() {
                self.wild_schedules.insert(name.clone());
            } else {
                self.wild_schedules.remove(&name);
            }
            self.schedules.insert(name.clone(), schedule);
            written.push(name);
        }
        if !written.is_empty() {
            self.mark(&[DocumentKey::Schedules, DocumentKey::WildSchedules]);
        }
        Ok(written)
    }

    /// Union names into the weekly, monthly and once indices.
    ///
    /// With `remove_existing`, every mentioned name is first stripped from
    /// all three indices, so the request replaces its previous assignment.
    ///
    /// # Errors
    ///
    /// Fails on an unknown name or an out-of-range weekday / day of month.
    pub fn assign(
        &mut self,
        assignment: Assignment,
        remove_existing: bool,
    ) -> Result<(), BelfryError> {
        self.ensure_exists(assignment.names())?;
        check_days(&assignment)?;
        self.apply_assignment(assignment, remove_existing)
    }

    /// Upsert schedules and assign names in one step.
    ///
    /// The assignment may name schedules from `schedules`. Everything is
    /// checked before the book changes, so a rejected call writes nothing.
    ///
    /// # Errors
    ///
    /// Same as [`ScheduleBook::upsert_schedules`] and [`ScheduleBook::assign`].
    pub fn save(
        &mut self,
        schedules: ScheduleMap,
        overwrite: bool,
        assignment: Assignment,
        remove_existing: bool,
    ) -> Result<Vec<String>, BelfryError> {
        if let Some(missing) = assignment
            .names()
            .find(|name| !self.schedules.contains_key(*name) && !schedules.contains_key(*name))
        {
            return Err(NotFoundError::schedule(missing.clone()).into());
        }
        check_days(&assignment)?;
        let written = self.upsert_schedules(schedules, overwrite)?;
        if !assignment.is_empty() {
            self.apply_assignment(assignment, remove_existing)?;
        }
        Ok(written)
    }

    fn apply_assignment(
        &mut self,
        assignment: Assignment,
        remove_existing: bool,
    ) -> Result<(), BelfryError> {
        if remove_existing {
            for name in assignment.names() {
                self.weekly.remove(name);
                self.monthly.remove(name);
                self.once.remove(name);
            }
        }
        for (weekday, names) in assignment.weekly {
            self.weekly.assign(weekday, names)?;
        }
        for (day, names) in assignment.monthly {
            self.monthly.add(day, names);
        }
        for (date, names) in assignment.once {
            self.once.add(date, names);
        }
        self.mark(&[DocumentKey::Weekly, DocumentKey::Monthly, DocumentKey::Once]);
        Ok(())
    }

    /// Delete schedules and every reference to them.
    ///
    /// Active schedules are only deleted with `force`.
    pub fn delete_schedules(&mut self, names: &[String], force: bool) -> Deletion {
        let mut outcome = Deletion::default();
        for name in names {
            if !self.schedules.contains_key(name) {
                outcome.missing.push(name.clone());
                continue;
            }
            if self.active.contains(name) && !force {
                outcome.skipped_active.push(name.clone());
                continue;
            }
            if let Some(schedule) = self.schedules.remove(name) {
                outcome.deleted.insert(name.clone(), schedule);
            }
        }
        if !outcome.deleted.is_empty() {
            self.prune_dangling();
            self.mark(&[DocumentKey::Schedules]);
        }
        outcome
    }

    /// Replace the active set. Duplicates collapse to their last position.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn set_active(&mut self, names: Vec<String>) -> Result<(), NotFoundError> {
        self.ensure_exists(&names)?;
        self.active = names.into();
        self.mark(&[DocumentKey::Active]);
        Ok(())
    }

    /// Replace the skip set of each given date. An empty list clears the date.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn update_skip(
        &mut self,
        skip: BTreeMap<NaiveDate, Vec<String>>,
    ) -> Result<(), NotFoundError> {
        self.ensure_exists(skip.values().flatten())?;
        for (date, names) in skip {
            self.skip.replace(date, names.into_iter().collect());
        }
        self.mark(&[DocumentKey::Skip]);
        Ok(())
    }

    /// Override the gap and/or catch-up window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTunable`] for an out-of-range value.
    pub fn set_tunables(
        &mut self,
        gap: Option<i64>,
        max_wait: Option<i64>,
    ) -> Result<Tunables, ValidationError> {
        self.tunables = self.tunables.with(gap, max_wait)?;
        self.mark(&[DocumentKey::Gap, DocumentKey::MaxWait]);
        Ok(self.tunables)
    }

    /// Restore the default engine state. The caller removes
    /// [`DocumentKey::ENGINE_STATE`] from the store.
    pub fn reset_engine_state(&mut self) {
        self.state = EngineState::fresh(self.tunables);
        self.dirty
            .retain(|key| !DocumentKey::ENGINE_STATE.contains(key));
    }

    /// Drop every index reference to a schedule that no longer exists.
    ///
    /// Returns `true` if anything was removed.
    pub fn prune_dangling(&mut self) -> bool {
        let schedules = &self.schedules;
        let known = |name: &str| schedules.contains_key(name);
        let mut changed = false;
        changed |= self.weekly.retain(known);
        changed |= self.monthly.retain(known);
        changed |= self.once.retain(known);
        changed |= self.skip.retain(known);
        changed |= self.active.retain(known);
        let before = self.wild_schedules.len();
        self.wild_schedules.retain(|name| known(name.as_str()));
        changed |= self.wild_schedules.len() != before;
        if changed {
            self.mark(&[
                DocumentKey::Weekly,
                DocumentKey::Monthly,
                DocumentKey::Once,
                DocumentKey::Skip,
                DocumentKey::Active,
                DocumentKey::WildSchedules,
            ]);
        }
        changed
    }

    /// Look up a schedule by name.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if it does not exist.
    pub fn require(&self, name: &str) -> Result<&Schedule, NotFoundError> {
        self.schedules
            .get(name)
            .ok_or_else(|| NotFoundError::schedule(name))
    }
}
