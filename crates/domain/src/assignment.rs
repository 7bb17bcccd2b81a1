//! Assignment indices — which schedules apply on which days.
//!
//! - [`WeeklyIndex`]: weekday (`0` = Monday) → names
//! - [`MonthlyIndex`]: day of month (`1..=31`) → names
//! - [`DateIndex`]: calendar date → names (used for both `once` and `skip`)
//! - [`ActiveSet`]: ordered list of enabled names, no duplicates
//!
//! Every index can purge names that no longer exist in the schedule map.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An unordered set of schedule names.
pub type NameSet = BTreeSet<String>;

/// Number of weekday slots.
pub const DAYS_IN_WEEK: usize = 7;

/// Weekday → schedule names. Always exactly seven slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NameSet>", into = "Vec<NameSet>")]
pub struct WeeklyIndex(Vec<NameSet>);

impl Default for WeeklyIndex {
    fn default() -> Self {
        Self(vec![NameSet::new(); DAYS_IN_WEEK])
    }
}

impl TryFrom<Vec<NameSet>> for WeeklyIndex {
    type Error = String;

    fn try_from(days: Vec<NameSet>) -> Result<Self, Self::Error> {
        if days.len() == DAYS_IN_WEEK {
            Ok(Self(days))
        } else {
            Err(format!("expected {DAYS_IN_WEEK} weekdays, got {}", days.len()))
        }
    }
}

impl From<WeeklyIndex> for Vec<NameSet> {
    fn from(index: WeeklyIndex) -> Self {
        index.0
    }
}

impl WeeklyIndex {
    #[must_use]
    pub fn on(&self, weekday: u8) -> Option<&NameSet> {
        self.0.get(usize::from(weekday))
    }

    /// Whether `name` is assigned to any weekday.
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        self.0.iter().any(|day| day.contains(name))
    }

    /// Add names to a weekday.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::WeekdayOutOfRange`] when `weekday > 6`.
    pub fn assign(
        &mut self,
        weekday: u8,
        names: impl IntoIterator<Item = String>,
    ) -> Result<(), ValidationError> {
        let day = self
            .0
            .get_mut(usize::from(weekday))
            .ok_or(ValidationError::WeekdayOutOfRange { weekday })?;
        day.extend(names);
        Ok(())
    }

    /// Remove `name` from every weekday. Returns `true` if anything changed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.0
            .iter_mut()
            .fold(false, |changed, day| day.remove(name) || changed)
    }

    /// Drop names rejected by `keep`. Returns `true` if anything changed.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> bool {
        let mut changed = false;
        for day in &mut self.0 {
            let before = day.len();
            day.retain(|name| keep(name.as_str()));
            changed |= day.len() != before;
        }
        changed
    }
}

/// Keyed name sets that drop empty keys (monthly and date indices).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyedIndex<K: Ord>(BTreeMap<K, NameSet>);

impl<K: Ord> Default for KeyedIndex<K> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

/// Day of month → schedule names.
pub type MonthlyIndex = KeyedIndex<u32>;

/// Calendar date → schedule names (`once` and `skip`).
pub type DateIndex = KeyedIndex<NaiveDate>;

impl<K: Ord + Clone> KeyedIndex<K> {
    #[must_use]
    pub fn on(&self, key: &K) -> Option<&NameSet> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &K, name: &str) -> bool {
        self.0.get(key).is_some_and(|names| names.contains(name))
    }

    /// Whether `name` appears under any key.
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        self.0.values().any(|names| names.contains(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &NameSet)> {
        self.0.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union `names` into the set under `key`.
    pub fn add(&mut self, key: K, names: impl IntoIterator<Item = String>) {
        self.0.entry(key).or_default().extend(names);
        self.0.retain(|_, names| !names.is_empty());
    }

    /// Replace the set under `key`; an empty set removes the key.
    pub fn replace(&mut self, key: K, names: NameSet) {
        if names.is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, names);
        }
    }

    /// Remove the whole entry for `key`. Returns `true` if it existed.
    pub fn clear(&mut self, key: &K) -> bool {
        self.0.remove(key).is_some()
    }

    /// Remove `name` from the set under `key`. Returns `true` if it was there.
    pub fn remove_from(&mut self, key: &K, name: &str) -> bool {
        let Some(names) = self.0.get_mut(key) else {
            return false;
        };
        let removed = names.remove(name);
        if names.is_empty() {
            self.0.remove(key);
        }
        removed
    }

    /// Remove `name` under every key. Returns `true` if anything changed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.retain(|candidate| candidate != name)
    }

    /// Drop names rejected by `keep`, then empty keys.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> bool {
        let mut changed = false;
        for names in self.0.values_mut() {
            let before = names.len();
            names.retain(|name| keep(name.as_str()));
            changed |= names.len() != before;
        }
        let before = self.0.len();
        self.0.retain(|_, names| !names.is_empty());
        changed || self.0.len() != before
    }

    /// Drop every key strictly below `key`.
    pub fn drop_before(&mut self, key: &K) -> bool {
        let before = self.0.len();
        self.0.retain(|candidate, _| candidate >= key);
        self.0.len() != before
    }
}

/// Ordered set of enabled schedule names.
///
/// Appending a name that is already present moves it to the end, so the set
/// keeps the position of the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ActiveSet(Vec<String>);

impl From<Vec<String>> for ActiveSet {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<ActiveSet> for Vec<String> {
    fn from(active: ActiveSet) -> Self {
        active.0
    }
}

impl ActiveSet {
    /// Build from a list that may contain duplicates; each name keeps its
    /// last position.
    #[must_use]
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let mut set = Self::default();
        for name in names {
            set.push(name);
        }
        set
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append `name`, removing any earlier occurrence.
    pub fn push(&mut self, name: String) {
        self.0.retain(|n| *n != name);
        self.0.push(name);
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|n| n != name);
        self.0.len() != before
    }

    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> bool {
        let before = self.0.len();
        self.0.retain(|n| keep(n.as_str()));
        self.0.len() != before
    }
}
