//! Schedule store port — the persisted key/value document.

use std::future::Future;

use belfry_domain::book::DocumentKey;
use belfry_domain::error::BelfryError;
use serde_json::Value;

/// Persistence for the schedule document, one JSON value per top-level key.
///
/// Every `set` replaces the whole value stored under `key`. A failed write
/// must be returned as an error, never swallowed.
pub trait ScheduleStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(
        &self,
        key: DocumentKey,
    ) -> impl Future<Output = Result<Option<Value>, BelfryError>> + Send;

    /// Replace the value stored under `key`.
    fn set(
        &self,
        key: DocumentKey,
        value: Value,
    ) -> impl Future<Output = Result<(), BelfryError>> + Send;

    /// Delete `key`, returning the value it held.
    fn remove(
        &self,
        key: DocumentKey,
    ) -> impl Future<Output = Result<Option<Value>, BelfryError>> + Send;
}
