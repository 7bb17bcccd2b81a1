//! Resolver and template instantiator.

use serde::Serialize;

use super::ScheduleBook;
use crate::book::DocumentKey;
use crate::error::NotFoundError;
use crate::time::Moment;
use crate::timeline::Timeline;

/// Outcome of [`ScheduleBook::instantiate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instantiation {
    /// The template was anchored at this epoch second.
    Instantiated { anchor: i64 },
    NotFound,
    /// The schedule exists but is not a template.
    NotApplicable,
}

/// Outcome of a manual "run today" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Activation {
    /// A wild template was instantiated.
    Instantiated { anchor: i64 },
    /// A wild schedule whose current run has not finished yet.
    AlreadyRunning,
    /// A recurring schedule was added to today's one-time assignments.
    ScheduledToday,
}

impl ScheduleBook {
    /// Whether the active schedule `name` applies on the day of `now`.
    #[must_use]
    pub fn applies_on(&self, name: &str, now: Moment) -> bool {
        let date = now.date();
        if self.skip.contains(&date, name) {
            return false;
        }
        self.weekly
            .on(now.weekday())
            .is_some_and(|names| names.contains(name))
            || self.monthly.contains(&now.day_of_month(), name)
            || self.once.contains(&date, name)
    }

    /// Merge every active, non-template schedule that applies today.
    ///
    /// Schedules are merged in active-set order; on an identical trigger time
    /// the schedule that comes later in that order wins.
    #[must_use]
    pub fn resolve(&self, now: Moment) -> Timeline {
        let triggers = self
            .active
            .names()
            .iter()
            .filter(|name| self.applies_on(name, now))
            .filter_map(|name| self.schedules.get(name.as_str()))
            .filter(|schedule| !schedule.is_template())
            .flat_map(|schedule| {
                schedule
                    .triggers()
                    .into_iter()
                    .map(|(at, action)| (now.day_relative(at), action))
            });
        Timeline::merge(triggers)
    }

    /// Anchor the wild template `name` at `now` and enable it for today.
    pub fn instantiate(&mut self, name: &str, now: Moment) -> Instantiation {
        let Some(schedule) = self.schedules.get(name) else {
            return Instantiation::NotFound;
        };
        let anchor = now.epoch();
        let Some(live) = schedule.instantiate(anchor) else {
            return Instantiation::NotApplicable;
        };
        let finish = live
            .triggers()
            .last()
            .map_or(anchor, |(at, _)| *at);
        self.schedules.insert(name.to_string(), live);
        self.wild_schedules.insert(name.to_string());
        self.schedule_today(name, now);
        // a run crossing midnight must also resolve on the following days
        let last_day = Moment::new(finish, now.offset()).date();
        for date in now.date().iter_days().skip(1).take_while(|d| *d <= last_day) {
            self.once.add(date, [name.to_string()]);
        }
        self.mark(&[DocumentKey::Schedules, DocumentKey::WildSchedules]);
        Instantiation::Instantiated { anchor }
    }

    /// Restore the template form of a running wild schedule.
    ///
    /// Returns `false` when `name` is not a running wild schedule.
    pub fn deinstantiate(&mut self, name: &str) -> bool {
        if !self.wild_schedules.contains(name) {
            return false;
        }
        let Some(template) = self.schedules.get(name).and_then(|s| s.to_template()) else {
            return false;
        };
        self.schedules.insert(name.to_string(), template);
        self.mark(&[DocumentKey::Schedules]);
        true
    }

    /// Add `name` to the active set and to today's one-time assignments.
    fn schedule_today(&mut self, name: &str, now: Moment) {
        self.active.push(name.to_string());
        self.once.add(now.date(), [name.to_string()]);
        self.mark(&[DocumentKey::Active, DocumentKey::Once]);
    }

    /// Manual activation: instantiate a wild template, or schedule an
    /// existing recurring schedule for today.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no schedule is named `name`.
    pub fn activate(&mut self, name: &str, now: Moment) -> Result<Activation, NotFoundError> {
        match self.instantiate(name, now) {
            Instantiation::Instantiated { anchor } => Ok(Activation::Instantiated { anchor }),
            Instantiation::NotFound => Err(NotFoundError::schedule(name)),
            Instantiation::NotApplicable if self.is_wild(name) => Ok(Activation::AlreadyRunning),
            Instantiation::NotApplicable => {
                self.schedule_today(name, now);
                Ok(Activation::ScheduledToday)
            }
        }
    }
}
