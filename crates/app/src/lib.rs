//! # belfry-app
//!
//! Application layer — the schedule engine, its polling loop, and the
//! **port definitions** (traits) adapters implement.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ScheduleStore` — get/set/remove of top-level document keys
//!   - `Actuator` — the bell relay (on, off, pulses)
//!   - `Clock` — local time and its synchronization status
//! - Own the in-memory schedule book behind a single lock (`ScheduleEngine`)
//!   and commit every mutation back to the store
//! - Drive the bell from the merged timeline (`PollingDriver`, `RingDispatcher`)
//! - Expose management use-cases (`ScheduleService`)
//!
//! ## Dependency rule
//! Depends on `belfry-domain` only (plus `tokio` for locking and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod driver;
pub mod engine;
pub mod ports;
pub mod services;
