//! # belfry-adapter-virtual
//!
//! Simulated hardware for running the bell controller without a relay board.
//!
//! ## Provided adapters
//!
//! | Type | Port | Behaviour |
//! |------|------|-----------|
//! | [`VirtualRelay`] | `Actuator` | Tracks on/off state and logs every actuation |
//! | [`SystemClock`] | `Clock` | System time shifted by a skew set on synchronization |
//! | [`ManualClock`] | `Clock` | Time set explicitly; for demos and tests |
//!
//! ## Dependency rule
//!
//! Depends on `belfry-app` (port traits) and `belfry-domain` only.

mod clock;
mod relay;

pub use clock::{ManualClock, SystemClock};
pub use relay::{Actuation, RelayState, VirtualRelay};
