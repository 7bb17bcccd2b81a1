//! Engine inspection and tuning.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use belfry_app::ports::{Actuator, Clock, ScheduleStore};
use belfry_app::services::EngineStatus;
use belfry_domain::state::Tunables;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `PUT /api/engine/tunables`. Absent fields keep their value.
#[derive(Deserialize)]
pub struct TunablesRequest {
    pub gap: Option<i64>,
    pub max_wait: Option<i64>,
}

/// `GET /api/engine` — engine state, tunables and today's timeline.
pub async fn status<S, A, C>(State(state): State<AppState<S, A, C>>) -> Json<EngineStatus>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    Json(state.schedule_service.engine_status().await)
}

/// `PUT /api/engine/tunables`
pub async fn set_tunables<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<TunablesRequest>,
) -> Result<Json<Tunables>, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    let tunables = state
        .schedule_service
        .set_tunables(req.gap, req.max_wait)
        .await?;
    Ok(Json(tunables))
}

/// `POST /api/engine/reset` — forget all progress.
pub async fn reset<S, A, C>(State(state): State<AppState<S, A, C>>) -> Result<StatusCode, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    state.schedule_service.reset_engine_state().await?;
    Ok(StatusCode::NO_CONTENT)
}
