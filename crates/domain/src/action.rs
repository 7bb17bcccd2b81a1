//! Action — what the bell does when a trigger fires.
//!
//! On the wire an action is a slash-delimited string `"mode/p1/p2/p3"` with a
//! case-insensitive mode. It is parsed once when a document is loaded; input
//! that does not describe a known action is kept verbatim as
//! [`ActionSpec::Unrecognized`] so it survives a store round-trip and is
//! skipped at dispatch time instead of failing the whole document.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A decoded actuation command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionSpec {
    /// Energize the relay and leave it on.
    On,
    /// Release the relay.
    Off,
    /// Single pulse: on for `seconds`, then off.
    Timer { seconds: f64 },
    /// `count` pulses of `on_seconds`, each followed by `off_seconds` of silence.
    Repeat {
        count: u32,
        on_seconds: f64,
        off_seconds: f64,
    },
    /// Anything that failed to parse, kept as written.
    Unrecognized(String),
}

impl ActionSpec {
    /// Decode a `"mode/p1/p2/p3"` descriptor. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let params: Vec<&str> = raw.splitn(4, '/').map(str::trim).collect();
        let mode = params.first().map(|m| m.to_ascii_lowercase()).unwrap_or_default();
        let parsed = match mode.as_str() {
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            "timer" => duration(params.get(1)).map(|seconds| Self::Timer { seconds }),
            "repeat" => params
                .get(1)
                .and_then(|count| count.parse::<u32>().ok())
                .zip(duration(params.get(2)))
                .zip(duration(params.get(3)))
                .map(|((count, on_seconds), off_seconds)| Self::Repeat {
                    count,
                    on_seconds,
                    off_seconds,
                }),
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::Unrecognized(raw.to_string()))
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

fn duration(param: Option<&&str>) -> Option<f64> {
    param
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Timer { seconds } => write!(f, "timer/{seconds}"),
            Self::Repeat {
                count,
                on_seconds,
                off_seconds,
            } => write!(f, "repeat/{count}/{on_seconds}/{off_seconds}"),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for ActionSpec {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ActionSpec> for String {
    fn from(action: ActionSpec) -> Self {
        action.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_on_and_off_case_insensitively() {
        assert_eq!(ActionSpec::parse("ON"), ActionSpec::On);
        assert_eq!(ActionSpec::parse("Off"), ActionSpec::Off);
    }

    #[test]
    fn should_ignore_extra_parameters_for_on() {
        assert_eq!(ActionSpec::parse("on/12/x"), ActionSpec::On);
    }

    #[test]
    fn should_parse_timer_with_fractional_duration() {
        assert_eq!(
            ActionSpec::parse("timer/2.5"),
            ActionSpec::Timer { seconds: 2.5 }
        );
    }

    #[test]
    fn should_parse_repeat_with_count_and_durations() {
        assert_eq!(
            ActionSpec::parse("REPEAT/3/1.5/0.5"),
            ActionSpec::Repeat {
                count: 3,
                on_seconds: 1.5,
                off_seconds: 0.5,
            }
        );
    }

    #[test]
    fn should_keep_unknown_mode_verbatim() {
        assert_eq!(
            ActionSpec::parse("chime/3"),
            ActionSpec::Unrecognized("chime/3".to_string())
        );
    }

    #[test]
    fn should_treat_missing_timer_duration_as_unrecognized() {
        assert!(!ActionSpec::parse("timer").is_recognized());
        assert!(!ActionSpec::parse("timer/abc").is_recognized());
        assert!(!ActionSpec::parse("timer/-1").is_recognized());
    }

    #[test]
    fn should_treat_incomplete_repeat_as_unrecognized() {
        assert!(!ActionSpec::parse("repeat/3/1").is_recognized());
        assert!(!ActionSpec::parse("repeat/x/1/1").is_recognized());
    }

    #[test]
    fn should_display_in_wire_form() {
        assert_eq!(ActionSpec::Timer { seconds: 3.0 }.to_string(), "timer/3");
        assert_eq!(
            ActionSpec::Repeat {
                count: 2,
                on_seconds: 1.5,
                off_seconds: 0.5,
            }
            .to_string(),
            "repeat/2/1.5/0.5"
        );
    }

    #[test]
    fn should_serialize_as_slash_delimited_string() {
        let json = serde_json::to_value(ActionSpec::Timer { seconds: 4.0 }).unwrap();
        assert_eq!(json, serde_json::json!("timer/4"));

        let parsed: ActionSpec = serde_json::from_value(serde_json::json!("repeat/2/1/1")).unwrap();
        assert!(matches!(parsed, ActionSpec::Repeat { count: 2, .. }));
    }
}
