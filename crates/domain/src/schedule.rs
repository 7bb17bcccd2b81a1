//! Schedule — a named, ordered list of triggers.
//!
//! A schedule is either *recurring* (times are seconds since midnight, or
//! sessions that expand into such times) or *wild*: a session-relative
//! template whose first trigger is the pending anchor `"*"` and whose other
//! triggers are relative gaps `"+<seconds>"`. Activating a wild schedule
//! rewrites it into absolute epoch times; once its run is over it is turned
//! back into the exact template it came from.
//!
//! Stored form (JSON):
//!
//! ```json
//! [[25200, "on"], {"start": 28800, "end": 30600, "every": 600, "action": "timer/3"}]
//! [["*", "on"], ["+10", "off"]]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::ActionSpec;
use crate::error::ValidationError;
use crate::time::SECONDS_PER_DAY;

/// Longest span, in seconds, between the anchor and the last trigger of a
/// wild schedule.
pub const MAX_TEMPLATE_SPAN: i64 = 7 * SECONDS_PER_DAY;

/// The time field of a single-shot trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTime", into = "RawTime")]
pub enum TriggerTime {
    /// `"*"` — anchor pending activation.
    Anchor,
    /// `"+<seconds>"` — gap after the previous trigger of a template.
    After(i64),
    /// Seconds since midnight (recurring) or an epoch second (instantiated).
    At(i64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTime {
    Seconds(i64),
    Text(String),
}

impl TryFrom<RawTime> for TriggerTime {
    type Error = ValidationError;

    fn try_from(raw: RawTime) -> Result<Self, Self::Error> {
        match raw {
            RawTime::Seconds(secs) => Ok(Self::At(secs)),
            RawTime::Text(text) => text.parse(),
        }
    }
}

impl From<TriggerTime> for RawTime {
    fn from(time: TriggerTime) -> Self {
        match time {
            TriggerTime::At(secs) => Self::Seconds(secs),
            other => Self::Text(other.to_string()),
        }
    }
}

impl std::str::FromStr for TriggerTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTriggerTime {
            value: s.to_string(),
        };
        let s = s.trim();
        if s == "*" {
            return Ok(Self::Anchor);
        }
        if let Some(gap) = s.strip_prefix('+') {
            let gap: i64 = gap.parse().map_err(|_| invalid())?;
            return Ok(Self::After(gap));
        }
        s.parse().map(Self::At).map_err(|_| invalid())
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchor => f.write_str("*"),
            Self::After(gap) => write!(f, "+{gap}"),
            Self::At(secs) => write!(f, "{secs}"),
        }
    }
}

/// A recurring block of triggers: `start`, then every `every` seconds until `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub start: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every: Option<i64>,
    #[serde(default)]
    pub include_end: bool,
    pub action: ActionSpec,
}

impl Session {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.every.is_some_and(|every| every <= 0) {
            return Err(ValidationError::InvalidSession {
                reason: "repeat interval must be positive",
            });
        }
        if self.end.is_some_and(|end| end < self.start) {
            return Err(ValidationError::InvalidSession {
                reason: "end must not precede start",
            });
        }
        if self.every.is_some() && self.end.is_none() {
            return Err(ValidationError::InvalidSession {
                reason: "a repeating session needs an end",
            });
        }
        if !(0..SECONDS_PER_DAY).contains(&self.start)
            || self.end.is_some_and(|end| end > SECONDS_PER_DAY)
        {
            return Err(ValidationError::InvalidSession {
                reason: "start and end must fall within one day",
            });
        }
        Ok(())
    }

    /// Expand into individual trigger times.
    ///
    /// `start, start + every, …` while strictly before `end`; `end` itself is
    /// appended when `include_end` is set. Expansion stops early if a time
    /// would overflow.
    #[must_use]
    pub fn expand(&self) -> Vec<i64> {
        let mut times = vec![self.start];
        match (self.end, self.every) {
            (Some(end), Some(every)) if every > 0 => {
                let mut next = self.start.checked_add(every);
                while let Some(at) = next.filter(|at| *at < end) {
                    times.push(at);
                    next = at.checked_add(every);
                }
                if self.include_end && times.last() != Some(&end) {
                    times.push(end);
                }
            }
            (Some(end), None) if self.include_end && end != self.start => times.push(end),
            _ => {}
        }
        times
    }
}

/// One item of a schedule: a single trigger or a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Point(TriggerTime, ActionSpec),
    Session(Session),
}

/// An ordered trigger list, validated to be either recurring, fully
/// templated, or fully instantiated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct Schedule {
    entries: Vec<Entry>,
}

impl TryFrom<Vec<Entry>> for Schedule {
    type Error = ValidationError;

    fn try_from(entries: Vec<Entry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<Schedule> for Vec<Entry> {
    fn from(schedule: Schedule) -> Self {
        schedule.entries
    }
}

impl Schedule {
    /// Check the template invariant and session shapes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MixedTemplate`] when `"*"`/`"+gap"` entries
    /// are not exactly "anchor first, gaps after", [`ValidationError::NegativeGap`]
    /// for a gap below zero, [`ValidationError::TemplateTooLong`] when the
    /// gaps add up to more than [`MAX_TEMPLATE_SPAN`] and
    /// [`ValidationError::InvalidSession`] for a malformed session.
    pub fn new(entries: Vec<Entry>) -> Result<Self, ValidationError> {
        let templated = matches!(entries.first(), Some(Entry::Point(TriggerTime::Anchor, _)));
        let mut span: i64 = 0;
        for (idx, entry) in entries.iter().enumerate() {
            match entry {
                Entry::Point(TriggerTime::Anchor, _) if idx == 0 => {}
                Entry::Point(TriggerTime::After(gap), _) if templated => {
                    if *gap < 0 {
                        return Err(ValidationError::NegativeGap { gap: *gap });
                    }
                    span = span
                        .checked_add(*gap)
                        .filter(|span| *span <= MAX_TEMPLATE_SPAN)
                        .ok_or(ValidationError::TemplateTooLong {
                            max: MAX_TEMPLATE_SPAN,
                        })?;
                }
                Entry::Point(TriggerTime::At(_), _) if !templated => {}
                Entry::Session(session) if !templated => session.validate()?,
                _ => return Err(ValidationError::MixedTemplate),
            }
        }
        Ok(Self { entries })
    }

    /// Convenience constructor for single-shot triggers.
    ///
    /// # Errors
    ///
    /// Same as [`Schedule::new`].
    pub fn from_points(
        points: impl IntoIterator<Item = (TriggerTime, ActionSpec)>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            points
                .into_iter()
                .map(|(time, action)| Entry::Point(time, action))
                .collect(),
        )
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` when this is a wild schedule still in template form.
    #[must_use]
    pub fn is_template(&self) -> bool {
        matches!(
            self.entries.first(),
            Some(Entry::Point(TriggerTime::Anchor, _))
        )
    }

    /// Expanded `(time, action)` pairs. Empty for a template.
    #[must_use]
    pub fn triggers(&self) -> Vec<(i64, &ActionSpec)> {
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                Entry::Point(TriggerTime::At(at), action) => out.push((*at, action)),
                Entry::Session(session) => {
                    out.extend(session.expand().into_iter().map(|at| (at, &session.action)));
                }
                Entry::Point(..) => return Vec::new(),
            }
        }
        out
    }

    /// Anchor a template at `anchor`, turning every gap into an absolute time.
    ///
    /// Returns `None` when the schedule is not a template, or when an
    /// absolute time would overflow.
    #[must_use]
    pub fn instantiate(&self, anchor: i64) -> Option<Self> {
        if !self.is_template() {
            return None;
        }
        let mut at = anchor;
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            entries.push(match entry {
                Entry::Point(TriggerTime::After(gap), action) => {
                    at = at.checked_add(*gap)?;
                    Entry::Point(TriggerTime::At(at), action.clone())
                }
                Entry::Point(_, action) => Entry::Point(TriggerTime::At(at), action.clone()),
                Entry::Session(session) => Entry::Session(session.clone()),
            });
        }
        Some(Self { entries })
    }

    /// Turn an instantiated wild schedule back into its template.
    ///
    /// Gaps are the successive differences between absolute times. Returns
    /// `None` when the schedule is empty, already a template, or contains
    /// sessions.
    #[must_use]
    pub fn to_template(&self) -> Option<Self> {
        let mut previous = None;
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let Entry::Point(TriggerTime::At(at), action) = entry else {
                return None;
            };
            let time = match previous {
                None => TriggerTime::Anchor,
                Some(prev) => TriggerTime::After(at.checked_sub(prev)?),
            };
            entries.push(Entry::Point(time, action.clone()));
            previous = Some(*at);
        }
        if entries.is_empty() {
            return None;
        }
        Some(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(gaps: &[i64]) -> Schedule {
        let mut points = vec![(TriggerTime::Anchor, ActionSpec::On)];
        points.extend(gaps.iter().map(|g| (TriggerTime::After(*g), ActionSpec::Off)));
        Schedule::from_points(points).unwrap()
    }

    #[test]
    fn should_parse_trigger_time_text_forms() {
        assert_eq!("*".parse::<TriggerTime>().unwrap(), TriggerTime::Anchor);
        assert_eq!("+10".parse::<TriggerTime>().unwrap(), TriggerTime::After(10));
        assert_eq!("25200".parse::<TriggerTime>().unwrap(), TriggerTime::At(25_200));
        assert!("soon".parse::<TriggerTime>().is_err());
    }

    #[test]
    fn should_deserialize_stored_pairs() {
        let json = serde_json::json!([["*", "on"], ["+10", "off"]]);
        let schedule: Schedule = serde_json::from_value(json.clone()).unwrap();
        assert!(schedule.is_template());
        assert_eq!(serde_json::to_value(&schedule).unwrap(), json);
    }

    #[test]
    fn should_deserialize_mixed_points_and_sessions() {
        let json = serde_json::json!([
            [25200, "on"],
            {"start": 28800, "end": 30000, "every": 600, "action": "timer/3"}
        ]);
        let schedule: Schedule = serde_json::from_value(json).unwrap();
        assert_eq!(schedule.entries().len(), 2);
        assert!(!schedule.is_template());
        assert_eq!(schedule.triggers().len(), 3);
    }

    #[test]
    fn should_reject_half_converted_template() {
        let json = serde_json::json!([["*", "on"], [1010, "off"]]);
        let result: Result<Schedule, _> = serde_json::from_value(json);
        assert!(result.is_err());

        let result = Schedule::from_points([
            (TriggerTime::At(1000), ActionSpec::On),
            (TriggerTime::After(10), ActionSpec::Off),
        ]);
        assert_eq!(result, Err(ValidationError::MixedTemplate));
    }

    #[test]
    fn should_reject_negative_gap() {
        let result = Schedule::from_points([
            (TriggerTime::Anchor, ActionSpec::On),
            (TriggerTime::After(-5), ActionSpec::Off),
        ]);
        assert_eq!(result, Err(ValidationError::NegativeGap { gap: -5 }));
    }

    #[test]
    fn should_reject_repeating_session_without_end() {
        let result = Schedule::new(vec![Entry::Session(Session {
            start: 100,
            end: None,
            every: Some(10),
            include_end: false,
            action: ActionSpec::On,
        })]);
        assert!(matches!(result, Err(ValidationError::InvalidSession { .. })));
    }

    #[test]
    fn should_reject_session_outside_one_day() {
        let overflowing = serde_json::json!([
            {"start": i64::MAX - 5, "end": i64::MAX, "every": 10, "action": "on"}
        ]);
        assert!(serde_json::from_value::<Schedule>(overflowing).is_err());

        let endless = serde_json::json!([
            {"start": 0, "end": 1_000_000_000_000_000_i64, "every": 1, "action": "on"}
        ]);
        assert!(serde_json::from_value::<Schedule>(endless).is_err());

        let result = Schedule::new(vec![Entry::Session(Session {
            start: -10,
            end: None,
            every: None,
            include_end: false,
            action: ActionSpec::On,
        })]);
        assert!(matches!(result, Err(ValidationError::InvalidSession { .. })));
    }

    #[test]
    fn should_stop_expanding_before_overflow() {
        let session = Session {
            start: i64::MAX - 5,
            end: Some(i64::MAX),
            every: Some(10),
            include_end: false,
            action: ActionSpec::On,
        };
        assert_eq!(session.expand(), vec![i64::MAX - 5]);
    }

    #[test]
    fn should_reject_template_longer_than_max_span() {
        let result = Schedule::from_points([
            (TriggerTime::Anchor, ActionSpec::On),
            (TriggerTime::After(i64::MAX), ActionSpec::Off),
            (TriggerTime::After(10), ActionSpec::On),
        ]);
        assert_eq!(
            result,
            Err(ValidationError::TemplateTooLong {
                max: MAX_TEMPLATE_SPAN
            })
        );
        assert!(template(&[MAX_TEMPLATE_SPAN]).instantiate(1_000).is_some());
    }

    #[test]
    fn should_not_instantiate_past_the_end_of_time() {
        assert!(template(&[10]).instantiate(i64::MAX - 5).is_none());
    }

    #[test]
    fn should_expand_session_excluding_end_by_default() {
        let session = Session {
            start: 100,
            end: Some(130),
            every: Some(10),
            include_end: false,
            action: ActionSpec::On,
        };
        assert_eq!(session.expand(), vec![100, 110, 120]);
    }

    #[test]
    fn should_expand_session_including_end_when_flagged() {
        let session = Session {
            start: 100,
            end: Some(130),
            every: Some(10),
            include_end: true,
            action: ActionSpec::On,
        };
        assert_eq!(session.expand(), vec![100, 110, 120, 130]);
    }

    #[test]
    fn should_expand_start_end_pair_without_interval() {
        let session = Session {
            start: 100,
            end: Some(500),
            every: None,
            include_end: true,
            action: ActionSpec::Off,
        };
        assert_eq!(session.expand(), vec![100, 500]);
    }

    #[test]
    fn should_expand_bare_session_to_its_start() {
        let session = Session {
            start: 42,
            end: None,
            every: None,
            include_end: false,
            action: ActionSpec::On,
        };
        assert_eq!(session.expand(), vec![42]);
    }

    #[test]
    fn should_instantiate_template_at_anchor() {
        let schedule = template(&[10]);
        let live = schedule.instantiate(1_000).unwrap();
        assert!(!live.is_template());
        assert_eq!(
            live.triggers(),
            vec![(1_000, &ActionSpec::On), (1_010, &ActionSpec::Off)]
        );
    }

    #[test]
    fn should_not_instantiate_recurring_schedule() {
        let schedule = Schedule::from_points([(TriggerTime::At(25_200), ActionSpec::On)]).unwrap();
        assert!(schedule.instantiate(1_000).is_none());
    }

    #[test]
    fn should_restore_exact_template_for_any_gap_sequence() {
        for gaps in [vec![], vec![10], vec![0, 5, 3600], vec![1, 1, 1, 1, 90]] {
            let original = template(&gaps);
            let restored = original
                .instantiate(1_717_480_800)
                .and_then(|live| live.to_template())
                .unwrap();
            assert_eq!(restored, original);
        }
    }

    #[test]
    fn should_yield_no_triggers_for_template() {
        assert!(template(&[10]).triggers().is_empty());
    }
}
