//! Time and time-of-day helpers.
//!
//! Triggers and progress markers are compared in a canonical
//! *seconds-since-local-midnight* domain, whatever day they were recorded on.
//! A [`Moment`] pairs an epoch second with the controller's fixed UTC offset so
//! the civil fields (date, weekday, day of month) can be derived without a
//! timezone database.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

/// UTC timestamp used for log records and API responses.
pub type Timestamp = DateTime<Utc>;

/// Number of seconds in a civil day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Fold a stored time value into the seconds-since-midnight domain.
///
/// Values already within `0..86400` are recurring times of day and pass
/// through unchanged; anything else is an absolute epoch second and is
/// converted to the local time of day.
#[must_use]
pub fn normalize(seconds: i64, offset: FixedOffset) -> i64 {
    if (0..SECONDS_PER_DAY).contains(&seconds) {
        return seconds;
    }
    (seconds + i64::from(offset.local_minus_utc())).rem_euclid(SECONDS_PER_DAY)
}

/// A wall-clock reading: epoch seconds plus the local UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    epoch: i64,
    offset: FixedOffset,
}

impl Moment {
    #[must_use]
    pub fn new(epoch: i64, offset: FixedOffset) -> Self {
        Self { epoch, offset }
    }

    /// Build a moment from a local calendar date and a time of day.
    #[must_use]
    pub fn at(date: NaiveDate, time_of_day: i64, offset: FixedOffset) -> Self {
        let local_midnight = date
            .and_hms_opt(0, 0, 0)
            .map_or(0, |midnight| midnight.and_utc().timestamp());
        let epoch = local_midnight + time_of_day - i64::from(offset.local_minus_utc());
        Self { epoch, offset }
    }

    #[must_use]
    pub fn epoch(self) -> i64 {
        self.epoch
    }

    #[must_use]
    pub fn offset(self) -> FixedOffset {
        self.offset
    }

    /// Seconds elapsed since local midnight.
    #[must_use]
    pub fn time_of_day(self) -> i64 {
        (self.epoch + i64::from(self.offset.local_minus_utc())).rem_euclid(SECONDS_PER_DAY)
    }

    /// Epoch second of today's local midnight.
    #[must_use]
    pub fn midnight(self) -> i64 {
        self.epoch - self.time_of_day()
    }

    /// Express a stored time value relative to today's local midnight.
    ///
    /// Recurring values are returned as they are. Absolute epoch values may
    /// land below zero (yesterday) or past `86400` (after the coming midnight).
    #[must_use]
    pub fn day_relative(self, seconds: i64) -> i64 {
        if (0..SECONDS_PER_DAY).contains(&seconds) {
            seconds
        } else {
            seconds - self.midnight()
        }
    }

    /// Normalize a stored time value with this moment's offset.
    #[must_use]
    pub fn normalize(self, seconds: i64) -> i64 {
        normalize(seconds, self.offset)
    }

    #[must_use]
    pub fn local(self) -> DateTime<FixedOffset> {
        DateTime::<Utc>::from_timestamp(self.epoch, 0)
            .unwrap_or_default()
            .with_timezone(&self.offset)
    }

    /// Local calendar date.
    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.local().date_naive()
    }

    /// Day of the week, `0` = Monday through `6` = Sunday.
    #[must_use]
    pub fn weekday(self) -> u8 {
        // num_days_from_monday is always < 7
        u8::try_from(self.local().weekday().num_days_from_monday()).unwrap_or_default()
    }

    /// Day of the month, `1..=31`.
    #[must_use]
    pub fn day_of_month(self) -> u32 {
        self.local().day()
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local().format("%Y-%m-%d %H:%M:%S"))
    }
}
