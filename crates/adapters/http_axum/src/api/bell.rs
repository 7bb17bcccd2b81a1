//! Manual bell ring.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use belfry_app::ports::{Actuator, Clock, ScheduleStore};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a manual ring: `{"mode": "timer/3"}`.
#[derive(Deserialize)]
pub struct RingRequest {
    #[serde(default)]
    pub mode: String,
}

#[derive(Serialize)]
pub struct RingResult {
    /// `false` when the mode was not recognized and nothing rang.
    pub rang: bool,
}

/// `POST /api/bell/ring`
pub async fn ring<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<RingRequest>,
) -> Result<Json<RingResult>, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    let rang = state.schedule_service.ring(&req.mode).await?;
    Ok(Json(RingResult { rang }))
}
