//! Progress tracker: recording firings, resets and day-rollover maintenance.

use super::ScheduleBook;
use crate::book::DocumentKey;
use crate::state::NO_PROGRESS;
use crate::time::Moment;
use crate::timeline::Timeline;

/// What [`ScheduleBook::reset`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reset {
    /// Progress was ahead of the clock: a day boundary was crossed.
    pub midnight_wrap: bool,
    /// A completed run was reopened after the catch-up window.
    pub reopened: bool,
}

/// Maintenance performed when the day's run completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rollover {
    /// Wild schedules restored to template form.
    pub reverted: Vec<String>,
    /// Names dropped from the active set.
    pub retired: Vec<String>,
}

impl ScheduleBook {
    /// Record that slot `index` of `timeline` fired at `now`.
    ///
    /// Returns the rollover report when this firing completed the day's run.
    /// Completion is one-shot per slot and date: recording the same last
    /// slot again on the day it completed does nothing beyond updating
    /// progress. A completion flag left over from an earlier run is
    /// overwritten.
    pub fn record(&mut self, timeline: &Timeline, index: usize, now: Moment) -> Option<Rollover> {
        let slot = timeline.get(index)?;
        let previous = self.state.progress;
        self.state.progress = slot.time_of_day();
        self.state.last_ring = now.time_of_day();
        self.mark(&[DocumentKey::Progress, DocumentKey::LastRing]);

        if !timeline.is_last(index) || self.completed(slot.time_of_day(), previous, now) {
            return None;
        }
        self.state.is_complete = true;
        self.state.completed_on = now.epoch();
        self.state.midnight_reset_count = 0;
        self.mark(&[
            DocumentKey::IsComplete,
            DocumentKey::CompletedOn,
            DocumentKey::MidnightResetCount,
        ]);
        Some(self.rollover(now))
    }

    /// Whether the run already completed today on the slot at `time_of_day`.
    fn completed(&self, time_of_day: i64, previous: i64, now: Moment) -> bool {
        self.state.is_complete
            && previous == time_of_day
            && Moment::new(self.state.completed_on, now.offset()).date() == now.date()
    }

    /// Day-rollover maintenance for every active name.
    fn rollover(&mut self, now: Moment) -> Rollover {
        let today = now.date();
        let mut report = Rollover::default();
        for name in self.active.names().to_vec() {
            if self.deinstantiate(&name) {
                report.reverted.push(name.clone());
            }
            self.once.remove_from(&today, &name);
            if !self.weekly.mentions(&name) && !self.monthly.mentions(&name) {
                self.active.remove(&name);
                report.retired.push(name);
            }
        }
        self.once.drop_before(&today);
        self.skip.drop_before(&today);
        self.prune_dangling();
        self.mark(&[DocumentKey::Active, DocumentKey::Once, DocumentKey::Skip]);
        report
    }

    /// Detect a crossed day boundary and reopen a completed run.
    pub fn reset(&mut self, now: Moment) -> Reset {
        let mut outcome = Reset::default();
        let gap = self.tunables.gap;

        if self.state.progress >= 0 && now.normalize(self.state.progress) > now.time_of_day() {
            self.state.midnight_reset_count += 1;
            self.state.progress = 0;
            self.state.last_ring = -gap;
            self.mark(&[
                DocumentKey::MidnightResetCount,
                DocumentKey::Progress,
                DocumentKey::LastRing,
            ]);
            outcome.midnight_wrap = true;
        }

        if self.state.is_complete && now.epoch() - self.state.completed_on > self.tunables.max_wait
        {
            self.state.is_complete = false;
            self.state.last_ring = -gap;
            self.state.progress = NO_PROGRESS;
            self.skip.clear(&now.date());
            self.mark(&[
                DocumentKey::IsComplete,
                DocumentKey::LastRing,
                DocumentKey::Progress,
                DocumentKey::Skip,
            ]);
            outcome.reopened = true;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::ops::Range;

    use chrono::NaiveDate;

    use super::super::fixtures::{at, book, names, points, tuesday, wild};
    use super::*;
    use crate::action::ActionSpec;
    use crate::book::Assignment;
    use crate::time::SECONDS_PER_DAY;
    use crate::timeline::Decision;

    fn weekly(list: &[&str]) -> Assignment {
        Assignment {
            weekly: BTreeMap::from([(1, names(list))]),
            ..Assignment::default()
        }
    }

    /// Drive `book` once per second over `seconds` of `date` and return the
    /// time of day of every slot that fired.
    fn poll(book: &mut ScheduleBook, date: NaiveDate, seconds: Range<i64>) -> Vec<i64> {
        let mut fired = Vec::new();
        for second in seconds {
            let now = at(date, second);
            book.reset(now);
            let timeline = book.resolve(now);
            let decision = timeline.decide(book.state(), book.tunables(), now.time_of_day());
            if let Decision::Fire { index, .. } = decision {
                fired.push(timeline.slots()[index].time_of_day());
                book.record(&timeline, index, now);
            }
        }
        fired
    }

    #[test]
    fn should_record_progress_and_last_ring() {
        let mut book = book(&[("morning", points(&[(100, ActionSpec::On), (200, ActionSpec::Off)]))]);
        book.assign(weekly(&["morning"]), false).unwrap();
        book.set_active(names(&["morning"])).unwrap();
        let now = at(tuesday(), 105);
        let timeline = book.resolve(now);

        assert!(book.record(&timeline, 0, now).is_none());
        assert_eq!(book.state().progress, 100);
        assert_eq!(book.state().last_ring, 105);
        assert!(!book.state().is_complete);
    }

    #[test]
    fn should_complete_once_per_day() {
        let mut book = book(&[("morning", points(&[(100, ActionSpec::On)]))]);
        book.assign(weekly(&["morning"]), false).unwrap();
        book.set_active(names(&["morning"])).unwrap();
        let now = at(tuesday(), 100);
        let timeline = book.resolve(now);

        let first = book.record(&timeline, 0, now);
        assert!(first.is_some());
        assert!(book.state().is_complete);
        assert_eq!(book.state().completed_on, now.epoch());

        let later = at(tuesday(), 110);
        assert!(book.record(&timeline, 0, later).is_none());
        assert_eq!(book.state().completed_on, now.epoch());
        // recurring schedule stays active
        assert!(book.active().contains("morning"));
    }

    #[test]
    fn should_complete_again_after_midnight_without_ringing_twice() {
        let mut book = book(&[
            ("late", points(&[(SECONDS_PER_DAY - 30, ActionSpec::On)])),
            ("early", points(&[(20, ActionSpec::Off)])),
        ]);
        book.assign(
            Assignment {
                weekly: BTreeMap::from([(1, names(&["late"])), (2, names(&["early"]))]),
                ..Assignment::default()
            },
            false,
        )
        .unwrap();
        book.set_active(names(&["late", "early"])).unwrap();

        let fired = poll(&mut book, tuesday(), SECONDS_PER_DAY - 40..SECONDS_PER_DAY);
        assert_eq!(fired, vec![SECONDS_PER_DAY - 30]);
        assert!(book.state().is_complete);

        let wednesday = tuesday().succ_opt().unwrap();
        let fired = poll(&mut book, wednesday, 0..120);
        assert_eq!(fired, vec![20]);
        assert_eq!(book.state().midnight_reset_count, 0);
    }

    #[test]
    fn should_complete_wild_run_started_shortly_after_completion() {
        let mut book = book(&[
            ("morning", points(&[(100, ActionSpec::On)])),
            ("drill", wild(&[10])),
        ]);
        book.assign(weekly(&["morning"]), false).unwrap();
        book.set_active(names(&["morning"])).unwrap();

        assert_eq!(poll(&mut book, tuesday(), 90..110), vec![100]);
        assert!(book.state().is_complete);

        book.activate("drill", at(tuesday(), 110)).unwrap();
        assert_eq!(poll(&mut book, tuesday(), 110..300), vec![110, 120]);
        assert_eq!(book.state().completed_on, at(tuesday(), 120).epoch());
        assert_eq!(book.schedule("drill"), Some(&wild(&[10])));
        assert!(!book.active().contains("drill"));
    }

    #[test]
    fn should_revert_wild_schedule_and_retire_it_after_its_run() {
        let mut book = book(&[("drill", wild(&[10]))]);
        let start = at(tuesday(), 1_000);
        book.instantiate("drill", start);
        let timeline = book.resolve(start);

        book.record(&timeline, 0, start);
        let end = at(tuesday(), 1_010);
        let report = book.record(&timeline, 1, end).unwrap();

        assert_eq!(report.reverted, names(&["drill"]));
        assert_eq!(report.retired, names(&["drill"]));
        assert_eq!(book.schedule("drill"), Some(&wild(&[10])));
        assert!(!book.active().contains("drill"));
        assert!(book.once().is_empty());
        assert!(book.is_wild("drill"));
    }

    #[test]
    fn should_prune_stale_dates_on_rollover() {
        let mut book = book(&[("morning", points(&[(100, ActionSpec::On)]))]);
        book.assign(weekly(&["morning"]), false).unwrap();
        let yesterday = tuesday().pred_opt().unwrap();
        let tomorrow = tuesday().succ_opt().unwrap();
        book.update_skip(BTreeMap::from([
            (yesterday, names(&["morning"])),
            (tomorrow, names(&["morning"])),
        ]))
        .unwrap();
        book.set_active(names(&["morning"])).unwrap();

        let now = at(tuesday(), 100);
        let timeline = book.resolve(now);
        book.record(&timeline, 0, now);

        assert!(book.skip().on(&yesterday).is_none());
        assert!(book.skip().on(&tomorrow).is_some());
    }

    #[test]
    fn should_detect_midnight_wrap() {
        let mut book = ScheduleBook::default();
        book.state.progress = 80_000;
        book.state.last_ring = 80_000;

        let reset = book.reset(at(tuesday(), 30));
        assert!(reset.midnight_wrap);
        assert_eq!(book.state().midnight_reset_count, 1);
        assert_eq!(book.state().progress, 0);
        assert_eq!(book.state().last_ring, -5);

        assert_eq!(book.reset(at(tuesday(), 31)), Reset::default());
    }

    #[test]
    fn should_reopen_completed_day_after_max_wait() {
        let mut book = book(&[("x", points(&[(100, ActionSpec::On)]))]);
        book.update_skip(BTreeMap::from([(tuesday(), names(&["x"]))]))
            .unwrap();
        let done = at(tuesday(), 100);
        book.state.is_complete = true;
        book.state.completed_on = done.epoch();
        book.state.progress = 100;

        assert!(!book.reset(at(tuesday(), 160)).reopened);
        let reset = book.reset(at(tuesday(), 161));
        assert!(reset.reopened);
        assert!(!book.state().is_complete);
        assert_eq!(book.state().progress, NO_PROGRESS);
        assert!(book.skip().is_empty());
    }

    #[test]
    fn should_keep_progress_monotonic_through_a_wild_run_across_midnight() {
        let mut book = book(&[("late", wild(&[20]))]);
        let start = at(tuesday(), SECONDS_PER_DAY - 10);
        book.instantiate("late", start);
        let timeline = book.resolve(start);

        book.record(&timeline, 0, start);
        assert_eq!(book.state().progress, SECONDS_PER_DAY - 10);

        let wednesday = tuesday().succ_opt().unwrap();
        let after = at(wednesday, 10);
        assert!(book.reset(after).midnight_wrap);
        let timeline = book.resolve(after);
        assert_eq!(timeline.len(), 2);
        let selected = timeline.select(
            book.state().progress,
            after.time_of_day(),
            book.tunables().max_wait,
            book.state().midnight_reset_count,
        );
        assert_eq!(selected, Some(1));
    }
}
