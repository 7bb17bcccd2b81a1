//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod bell;
#[allow(clippy::missing_errors_doc)]
pub mod clock;
#[allow(clippy::missing_errors_doc)]
pub mod engine;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;

use axum::Router;
use axum::routing::{get, post, put};

use belfry_app::ports::{Actuator, Clock, ScheduleStore};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, A, C>() -> Router<AppState<S, A, C>>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    Router::new()
        // Schedule document
        .route("/schedule", get(schedules::document::<S, A, C>))
        .route(
            "/schedules",
            post(schedules::create::<S, A, C>)
                .put(schedules::replace::<S, A, C>)
                .delete(schedules::delete::<S, A, C>),
        )
        .route("/schedules/active", put(schedules::set_active::<S, A, C>))
        .route("/schedules/skip", put(schedules::update_skip::<S, A, C>))
        .route("/schedules/run", put(schedules::run::<S, A, C>))
        // Manual ring
        .route("/bell/ring", post(bell::ring::<S, A, C>))
        // Engine
        .route("/engine", get(engine::status::<S, A, C>))
        .route("/engine/tunables", put(engine::set_tunables::<S, A, C>))
        .route("/engine/reset", post(engine::reset::<S, A, C>))
        // Clock
        .route("/time", put(clock::synchronize::<S, A, C>))
}
