//! # belfry-domain
//!
//! Pure domain model for the belfry bell controller.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, time-of-day normalization
//! - Define **Actions** (`on`, `off`, `timer`, `repeat`) parsed once from their
//!   slash-delimited wire form
//! - Define **Schedules** (named, ordered trigger lists) including the
//!   session-relative *wild* template form
//! - Define the **assignment indices** (weekly, monthly, once, skip, active)
//! - Define the **engine state** (progress marker, last ring, completion) and
//!   tunables (`gap`, `max_wait`)
//! - Contain the scheduling algorithms: resolving today's merged timeline,
//!   selecting the trigger to act on, recording progress and day rollover
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod action;
pub mod assignment;
pub mod book;
pub mod schedule;
pub mod state;
pub mod timeline;
