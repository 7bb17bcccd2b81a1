//! # belfry-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON management API** under `/api` for reading the schedule
//!   document, editing schedules and their assignments, ringing the bell by
//!   hand, inspecting the engine and setting the clock
//! - Map HTTP requests into [`ScheduleService`](belfry_app::services::ScheduleService)
//!   calls (driving adapter)
//! - Map service results and errors into HTTP responses
//!
//! Authentication is left to whatever sits in front of the server.
//!
//! ## Dependency rule
//! Depends on `belfry-app` (for port traits and services) and `belfry-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
