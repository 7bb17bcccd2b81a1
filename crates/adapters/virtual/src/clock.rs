//! Wall clocks implementing the [`Clock`] port.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use belfry_app::ports::Clock;
use belfry_domain::time::{Moment, now};
use chrono::FixedOffset;

/// System time, corrected by the skew recorded on the last synchronization.
pub struct SystemClock {
    offset: FixedOffset,
    skew: AtomicI64,
    synchronized: AtomicBool,
}

impl SystemClock {
    /// A clock for the given UTC offset. When `assume_synchronized` is
    /// false the engine holds off until [`Clock::synchronize`] is called.
    #[must_use]
    pub fn new(offset: FixedOffset, assume_synchronized: bool) -> Self {
        Self {
            offset,
            skew: AtomicI64::new(0),
            synchronized: AtomicBool::new(assume_synchronized),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Moment {
        let epoch = now().timestamp() + self.skew.load(Ordering::Acquire);
        Moment::new(epoch, self.offset)
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::Acquire)
    }

    fn synchronize(&self, epoch: i64) {
        let skew = epoch - now().timestamp();
        self.skew.store(skew, Ordering::Release);
        self.synchronized.store(true, Ordering::Release);
        tracing::info!(skew, "system clock synchronized");
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    offset: FixedOffset,
    epoch: AtomicI64,
    synchronized: AtomicBool,
}

impl ManualClock {
    #[must_use]
    pub fn new(moment: Moment) -> Self {
        Self {
            offset: moment.offset(),
            epoch: AtomicI64::new(moment.epoch()),
            synchronized: AtomicBool::new(true),
        }
    }

    /// Start unsynchronized, as a controller does right after boot.
    #[must_use]
    pub fn unsynchronized(moment: Moment) -> Self {
        let clock = Self::new(moment);
        clock.synchronized.store(false, Ordering::Release);
        clock
    }

    pub fn advance(&self, seconds: i64) {
        self.epoch.fetch_add(seconds, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Moment {
        Moment::new(self.epoch.load(Ordering::Acquire), self.offset)
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::Acquire)
    }

    fn synchronize(&self, epoch: i64) {
        self.epoch.store(epoch, Ordering::Release);
        self.synchronized.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(3_600).unwrap()
    }

    #[test]
    fn should_shift_system_time_on_synchronize() {
        let clock = SystemClock::new(offset(), false);
        assert!(!clock.is_synchronized());

        let target = now().timestamp() - 7_200;
        clock.synchronize(target);
        assert!(clock.is_synchronized());
        let drift = clock.now().epoch() - target;
        assert!((0..=2).contains(&drift), "drift was {drift}");
        assert_eq!(clock.now().offset(), offset());
    }

    #[test]
    fn should_advance_manual_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let clock = ManualClock::new(Moment::at(date, 1_000, offset()));
        clock.advance(30);
        assert_eq!(clock.now().time_of_day(), 1_030);
        assert_eq!(clock.now().date(), date);
    }

    #[test]
    fn should_start_unsynchronized_when_asked() {
        let clock = ManualClock::unsynchronized(Moment::new(0, offset()));
        assert!(!clock.is_synchronized());
        clock.synchronize(1_717_459_200);
        assert!(clock.is_synchronized());
        assert_eq!(clock.now().epoch(), 1_717_459_200);
    }
}
