//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BelfryError`]
//! via `#[from]` / `From` impls. Adapter-specific failures are boxed into the
//! [`BelfryError::Storage`] and [`BelfryError::Actuator`] variants so the domain
//! never has to know about `sqlx` or hardware drivers.

/// Top-level error returned by domain logic, services and ports.
#[derive(Debug, thiserror::Error)]
pub enum BelfryError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A persistence read or write failed. The in-memory document is kept as is.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("actuator error")]
    Actuator(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant or input shape check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("invalid trigger time `{value}`")]
    InvalidTriggerTime { value: String },

    #[error("wild schedule mixes template and absolute trigger times")]
    MixedTemplate,

    #[error("invalid session: {reason}")]
    InvalidSession { reason: &'static str },

    #[error("relative gap must not be negative, got {gap}")]
    NegativeGap { gap: i64 },

    #[error("wild schedule must finish within {max} seconds of its anchor")]
    TemplateTooLong { max: i64 },

    #[error("weekday must be within 0..=6, got {weekday}")]
    WeekdayOutOfRange { weekday: u8 },

    #[error("day of month must be within 1..=31, got {day}")]
    DayOfMonthOutOfRange { day: u32 },

    #[error("invalid tunable `{name}`: {reason}")]
    InvalidTunable {
        name: &'static str,
        reason: &'static str,
    },

    #[error("ring action must not be empty")]
    EmptyAction,

    #[error("malformed document `{key}`: {reason}")]
    MalformedDocument { key: &'static str, reason: String },
}

/// A named item looked up by the caller does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    /// Shorthand for a missing schedule.
    #[must_use]
    pub fn schedule(name: impl Into<String>) -> Self {
        Self {
            entity: "Schedule",
            id: name.into(),
        }
    }
}
