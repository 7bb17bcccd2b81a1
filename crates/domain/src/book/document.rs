//! Mapping between the typed book and the store's top-level JSON keys.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ScheduleBook;
use crate::error::{NotFoundError, ValidationError};

/// A top-level key of the persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKey {
    Schedules,
    Weekly,
    Monthly,
    Once,
    Skip,
    Active,
    WildSchedules,
    Progress,
    LastRing,
    IsComplete,
    CompletedOn,
    MidnightResetCount,
    Gap,
    MaxWait,
}

impl DocumentKey {
    pub const ALL: [Self; 14] = [
        Self::Schedules,
        Self::Weekly,
        Self::Monthly,
        Self::Once,
        Self::Skip,
        Self::Active,
        Self::WildSchedules,
        Self::Progress,
        Self::LastRing,
        Self::IsComplete,
        Self::CompletedOn,
        Self::MidnightResetCount,
        Self::Gap,
        Self::MaxWait,
    ];

    /// Keys owned by the engine; removed on an engine reset.
    pub const ENGINE_STATE: [Self; 5] = [
        Self::Progress,
        Self::LastRing,
        Self::IsComplete,
        Self::CompletedOn,
        Self::MidnightResetCount,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedules => "schedules",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Once => "once",
            Self::Skip => "skip",
            Self::Active => "active",
            Self::WildSchedules => "wild_schedules",
            Self::Progress => "progress",
            Self::LastRing => "last_ring",
            Self::IsComplete => "is_complete",
            Self::CompletedOn => "completed_on",
            Self::MidnightResetCount => "midnight_reset_count",
            Self::Gap => "gap",
            Self::MaxWait => "max_wait",
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKey {
    type Err = NotFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| NotFoundError {
                entity: "Document key",
                id: s.to_string(),
            })
    }
}

fn decode<T: DeserializeOwned>(key: DocumentKey, value: Value) -> Result<T, ValidationError> {
    serde_json::from_value(value).map_err(|err| ValidationError::MalformedDocument {
        key: key.as_str(),
        reason: err.to_string(),
    })
}

fn encode<T: Serialize>(key: DocumentKey, value: &T) -> Result<Value, ValidationError> {
    serde_json::to_value(value).map_err(|err| ValidationError::MalformedDocument {
        key: key.as_str(),
        reason: err.to_string(),
    })
}

impl ScheduleBook {
    /// Build a book from stored documents. Absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedDocument`] naming the first key
    /// whose value does not have the expected shape.
    pub fn from_documents(
        documents: impl IntoIterator<Item = (DocumentKey, Value)>,
    ) -> Result<Self, ValidationError> {
        let mut book = Self::default();
        let mut has_last_ring = false;
        for (key, value) in documents {
            has_last_ring |= key == DocumentKey::LastRing;
            book.apply(key, value)?;
        }
        if !has_last_ring {
            book.state.last_ring = -book.tunables.gap;
        }
        Ok(book)
    }

    /// Replace the field behind `key` with a decoded `value`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedDocument`] if `value` has the wrong shape.
    pub fn apply(&mut self, key: DocumentKey, value: Value) -> Result<(), ValidationError> {
        match key {
            DocumentKey::Schedules => self.schedules = decode(key, value)?,
            DocumentKey::Weekly => self.weekly = decode(key, value)?,
            DocumentKey::Monthly => self.monthly = decode(key, value)?,
            DocumentKey::Once => self.once = decode(key, value)?,
            DocumentKey::Skip => self.skip = decode(key, value)?,
            DocumentKey::Active => self.active = decode(key, value)?,
            DocumentKey::WildSchedules => self.wild_schedules = decode(key, value)?,
            DocumentKey::Progress => self.state.progress = decode(key, value)?,
            DocumentKey::LastRing => self.state.last_ring = decode(key, value)?,
            DocumentKey::IsComplete => self.state.is_complete = decode(key, value)?,
            DocumentKey::CompletedOn => self.state.completed_on = decode(key, value)?,
            DocumentKey::MidnightResetCount => {
                self.state.midnight_reset_count = decode(key, value)?;
            }
            DocumentKey::Gap => self.tunables.gap = decode(key, value)?,
            DocumentKey::MaxWait => self.tunables.max_wait = decode(key, value)?,
        }
        Ok(())
    }

    /// Encode the field behind `key` in its stored form.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails.
    pub fn to_value(&self, key: DocumentKey) -> Result<Value, ValidationError> {
        match key {
            DocumentKey::Schedules => encode(key, &self.schedules),
            DocumentKey::Weekly => encode(key, &self.weekly),
            DocumentKey::Monthly => encode(key, &self.monthly),
            DocumentKey::Once => encode(key, &self.once),
            DocumentKey::Skip => encode(key, &self.skip),
            DocumentKey::Active => encode(key, &self.active),
            DocumentKey::WildSchedules => encode(key, &self.wild_schedules),
            DocumentKey::Progress => Ok(Value::from(self.state.progress)),
            DocumentKey::LastRing => Ok(Value::from(self.state.last_ring)),
            DocumentKey::IsComplete => Ok(Value::from(self.state.is_complete)),
            DocumentKey::CompletedOn => Ok(Value::from(self.state.completed_on)),
            DocumentKey::MidnightResetCount => Ok(Value::from(self.state.midnight_reset_count)),
            DocumentKey::Gap => Ok(Value::from(self.tunables.gap)),
            DocumentKey::MaxWait => Ok(Value::from(self.tunables.max_wait)),
        }
    }

    /// JSON object holding the requested keys, in key order.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails.
    pub fn snapshot(
        &self,
        keys: &[DocumentKey],
    ) -> Result<serde_json::Map<String, Value>, ValidationError> {
        keys.iter()
            .map(|key| Ok((key.as_str().to_string(), self.to_value(*key)?)))
            .collect()
    }
}
