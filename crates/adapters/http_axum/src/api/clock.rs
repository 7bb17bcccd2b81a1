//! Wall clock synchronization.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use belfry_app::ports::{Actuator, Clock, ScheduleStore};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetTimeRequest {
    /// Seconds since the Unix epoch.
    pub unixtime: i64,
}

#[derive(Serialize)]
pub struct ClockReading {
    pub local_time: String,
}

/// `PUT /api/time` — set the clock and mark it synchronized.
pub async fn synchronize<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<SetTimeRequest>,
) -> Json<ClockReading>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    state.schedule_service.synchronize_clock(req.unixtime);
    let now = state.schedule_service.engine().clock().now();
    Json(ClockReading {
        local_time: now.to_string(),
    })
}
