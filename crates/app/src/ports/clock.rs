//! Clock port — wall-clock time and its synchronization status.

use belfry_domain::time::Moment;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current time with the controller's UTC offset.
    fn now(&self) -> Moment;

    /// `true` once the time has been externally synchronized.
    fn is_synchronized(&self) -> bool;

    /// Set the current time to `epoch` and mark the clock synchronized.
    fn synchronize(&self, epoch: i64);
}
