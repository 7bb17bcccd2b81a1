//! Schedule book — the typed, in-memory form of the persisted document.
//!
//! One field per top-level store key. Every mutation marks the keys it
//! touched as dirty so the caller can write back exactly those keys.
//!
//! The behaviour is split by concern:
//!
//! - [`document`]: key mapping, load and snapshot
//! - [`resolve`]: today's timeline and wild-schedule activation
//! - [`progress`]: recording firings, resets and day-rollover maintenance
//! - [`manage`]: management mutations (upsert, assign, delete, …)

use std::collections::{BTreeMap, BTreeSet};

use crate::assignment::{ActiveSet, DateIndex, MonthlyIndex, NameSet, WeeklyIndex};
use crate::schedule::Schedule;
use crate::state::{EngineState, Tunables};

pub mod document;
pub mod manage;
pub mod progress;
pub mod resolve;

pub use document::DocumentKey;
pub use manage::{Assignment, Deletion};
pub use progress::{Reset, Rollover};
pub use resolve::{Activation, Instantiation};

/// Schedule name → schedule.
pub type ScheduleMap = BTreeMap<String, Schedule>;

/// The whole schedule document plus a dirty-key tracker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleBook {
    schedules: ScheduleMap,
    weekly: WeeklyIndex,
    monthly: MonthlyIndex,
    once: DateIndex,
    skip: DateIndex,
    active: ActiveSet,
    wild_schedules: NameSet,
    state: EngineState,
    tunables: Tunables,
    dirty: BTreeSet<DocumentKey>,
}

impl ScheduleBook {
    #[must_use]
    pub fn schedules(&self) -> &ScheduleMap {
        &self.schedules
    }

    #[must_use]
    pub fn schedule(&self, name: &str) -> Option<&Schedule> {
        self.schedules.get(name)
    }

    #[must_use]
    pub fn weekly(&self) -> &WeeklyIndex {
        &self.weekly
    }

    #[must_use]
    pub fn monthly(&self) -> &MonthlyIndex {
        &self.monthly
    }

    #[must_use]
    pub fn once(&self) -> &DateIndex {
        &self.once
    }

    #[must_use]
    pub fn skip(&self) -> &DateIndex {
        &self.skip
    }

    #[must_use]
    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    #[must_use]
    pub fn wild_schedules(&self) -> &NameSet {
        &self.wild_schedules
    }

    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    #[must_use]
    pub fn tunables(&self) -> Tunables {
        self.tunables
    }

    /// `true` if `name` is a wild schedule, templated or running.
    #[must_use]
    pub fn is_wild(&self, name: &str) -> bool {
        self.wild_schedules.contains(name)
    }

    /// Keys changed since the last [`ScheduleBook::take_dirty`].
    #[must_use]
    pub fn dirty(&self) -> &BTreeSet<DocumentKey> {
        &self.dirty
    }

    /// Drain the dirty-key set.
    pub fn take_dirty(&mut self) -> BTreeSet<DocumentKey> {
        std::mem::take(&mut self.dirty)
    }

    /// Mark `key` as needing a write, e.g. after a failed save.
    pub fn touch(&mut self, key: DocumentKey) {
        self.dirty.insert(key);
    }

    fn mark(&mut self, keys: &[DocumentKey]) {
        self.dirty.extend(keys.iter().copied());
    }
}
