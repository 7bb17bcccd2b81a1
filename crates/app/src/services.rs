//! Application services — use-case implementations.
//!
//! Services take the shared engine by `Arc`, so the HTTP layer and the
//! polling driver work on the same locked document.

pub mod schedule_service;

pub use schedule_service::{EngineStatus, ScheduleService, UpcomingTrigger};
