//! Timeline — today's merged, sorted trigger sequence, plus the trigger
//! selector and the per-cycle firing decision.
//!
//! Slots are ordered by their time relative to today's local midnight. The
//! selector compares in the normalized seconds-since-midnight domain, so an
//! instantiated wild schedule that crosses midnight shows up as a decrease in
//! normalized time: a *day-boundary wrap*.

use std::collections::BTreeMap;

use crate::action::ActionSpec;
use crate::state::{EngineState, Tunables};
use crate::time::SECONDS_PER_DAY;

/// A single merged trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Seconds relative to today's local midnight; may be negative or exceed a day.
    pub at: i64,
    pub action: ActionSpec,
}

impl Slot {
    /// Normalized seconds since midnight.
    #[must_use]
    pub fn time_of_day(&self) -> i64 {
        self.at.rem_euclid(SECONDS_PER_DAY)
    }
}

/// Sorted merge of every schedule that applies today.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    slots: Vec<Slot>,
}

/// What the polling driver should do with the current timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing applies today.
    Idle,
    /// Dispatch the slot at `index` now. `late_by` is zero for an on-time ring.
    Fire { index: usize, late_by: i64 },
    /// The selected trigger is this many seconds in the future.
    WaitUntil(i64),
    /// The selected trigger is due but the minimum gap has not elapsed yet.
    WaitForGap(i64),
    /// No slot qualifies, usually because today's run is over.
    Exhausted,
}

impl Timeline {
    /// Merge `(day_relative_time, action)` pairs. On an exact time collision
    /// the pair seen last wins.
    pub fn merge<'a>(triggers: impl IntoIterator<Item = (i64, &'a ActionSpec)>) -> Self {
        let merged: BTreeMap<i64, &ActionSpec> = triggers.into_iter().collect();
        Self {
            slots: merged
                .into_iter()
                .map(|(at, action)| Slot {
                    at,
                    action: action.clone(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.slots.len()
    }

    fn time_of_day(&self, index: usize) -> i64 {
        self.slots[index].time_of_day()
    }

    /// Index of the first slot after `midnight_resets` day-boundary wraps,
    /// or `0` when there are fewer wraps than that.
    fn wrap_start(&self, midnight_resets: u32) -> usize {
        let mut start = 0;
        let mut remaining = midnight_resets;
        while remaining > 0 {
            let wrap = (start + 1..self.slots.len())
                .find(|&i| self.time_of_day(i) < self.time_of_day(i - 1));
            match wrap {
                Some(index) => {
                    start = index;
                    remaining -= 1;
                }
                None => break,
            }
        }
        start
    }

    /// Pick the single slot that should act now.
    ///
    /// A slot qualifies when it has not been recorded yet (`progress < t`)
    /// and is either upcoming (`now <= t`) or missed by less than `max_wait`
    /// seconds.
    #[must_use]
    pub fn select(
        &self,
        progress: i64,
        now: i64,
        max_wait: i64,
        midnight_resets: u32,
    ) -> Option<usize> {
        let start = self.wrap_start(midnight_resets);
        (start..self.slots.len()).find(|&index| {
            let at = self.time_of_day(index);
            let late = now - at;
            progress < at && (late <= 0 || late < max_wait)
        })
    }

    /// Decide what to do at normalized time `now`.
    #[must_use]
    pub fn decide(&self, state: &EngineState, tunables: Tunables, now: i64) -> Decision {
        if self.slots.is_empty() {
            return Decision::Idle;
        }
        let Some(index) = self.select(
            state.progress,
            now,
            tunables.max_wait,
            state.midnight_reset_count,
        ) else {
            return Decision::Exhausted;
        };
        let at = self.time_of_day(index);
        if now < at {
            return Decision::WaitUntil(at - now);
        }
        let gap_ends = state.last_ring + tunables.gap;
        if gap_ends < now {
            Decision::Fire {
                index,
                late_by: now - at,
            }
        } else {
            Decision::WaitForGap(gap_ends + 1 - now)
        }
    }
}
