//! JSON REST handlers for schedules and their assignments.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use belfry_app::ports::{Actuator, Clock, ScheduleStore};
use belfry_domain::book::{Activation, Assignment, Deletion, DocumentKey, ScheduleMap};
use belfry_domain::error::BelfryError;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the document endpoint: `?key=schedules,active`.
#[derive(Deserialize)]
pub struct DocumentQuery {
    pub key: Option<String>,
}

/// Request body for creating or replacing schedules.
///
/// The assignment fields may name schedules defined in the same request.
/// Schedules and assignment are committed together or not at all.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct SaveSchedulesRequest {
    pub schedules: ScheduleMap,
    pub weekly: BTreeMap<u8, Vec<String>>,
    pub monthly: BTreeMap<u32, Vec<String>>,
    pub once: BTreeMap<NaiveDate, Vec<String>>,
    /// Only update the assignments; `schedules` is ignored.
    pub assign_only: bool,
    /// Strip the mentioned names from every existing assignment first.
    pub remove_existing: bool,
}

/// Request body for deleting schedules.
#[derive(Deserialize)]
pub struct DeleteSchedulesRequest {
    #[serde(default)]
    pub keys: Vec<String>,
    /// Also delete schedules that are currently active.
    #[serde(default)]
    pub force: bool,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateSkipRequest {
    #[serde(default)]
    pub skip: BTreeMap<NaiveDate, Vec<String>>,
}

#[derive(Deserialize)]
pub struct RunScheduleRequest {
    #[serde(default)]
    pub schedule: String,
}

/// Names of the schedules a save request wrote.
#[derive(Serialize)]
pub struct SavedSchedules {
    pub written: Vec<String>,
}

/// Possible responses from the save endpoints.
pub enum SaveResponse {
    Created(Json<SavedSchedules>),
}

impl IntoResponse for SaveResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the run endpoint.
pub enum RunResponse {
    Created(Json<Activation>),
}

impl IntoResponse for RunResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

fn parse_keys(raw: &str) -> Result<Vec<DocumentKey>, BelfryError> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| key.parse::<DocumentKey>().map_err(BelfryError::from))
        .collect()
}

/// `GET /api/schedule[?key=…]` — the stored document or a subset of its keys.
pub async fn document<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Map<String, Value>>, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    let keys = query.key.as_deref().map(parse_keys).transpose()?;
    let document = state.schedule_service.document(keys).await?;
    Ok(Json(document))
}

async fn save<S, A, C>(
    state: AppState<S, A, C>,
    req: SaveSchedulesRequest,
    overwrite: bool,
) -> Result<SaveResponse, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    let assignment = Assignment {
        weekly: req.weekly,
        monthly: req.monthly,
        once: req.once,
    };
    if req.assign_only && assignment.is_empty() {
        return Err(ApiError::MissingParameters("no assignment given"));
    }
    if !req.assign_only && req.schedules.is_empty() {
        return Err(ApiError::MissingParameters(
            "no schedules given to add or update",
        ));
    }

    let schedules = if req.assign_only {
        ScheduleMap::new()
    } else {
        req.schedules
    };
    let written = state
        .schedule_service
        .save_schedules(schedules, overwrite, assignment, req.remove_existing)
        .await?;
    Ok(SaveResponse::Created(Json(SavedSchedules { written })))
}

/// `POST /api/schedules` — add schedules, leaving existing names untouched.
pub async fn create<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<SaveSchedulesRequest>,
) -> Result<SaveResponse, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    save(state, req, false).await
}

/// `PUT /api/schedules` — add or overwrite schedules.
pub async fn replace<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<SaveSchedulesRequest>,
) -> Result<SaveResponse, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    save(state, req, true).await
}

/// `DELETE /api/schedules`
pub async fn delete<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<DeleteSchedulesRequest>,
) -> Result<Json<Deletion>, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    if req.keys.is_empty() {
        return Err(ApiError::MissingParameters("no schedules given to delete"));
    }
    let deletion = state
        .schedule_service
        .delete_schedules(req.keys, req.force)
        .await?;
    Ok(Json(deletion))
}

/// `PUT /api/schedules/active` — replace the active set.
pub async fn set_active<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<Map<String, Value>>, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    state.schedule_service.set_active(req.active).await?;
    let document = state
        .schedule_service
        .document(Some(vec![DocumentKey::Active]))
        .await?;
    Ok(Json(document))
}

/// `PUT /api/schedules/skip` — replace the skip set of each given date.
pub async fn update_skip<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<UpdateSkipRequest>,
) -> Result<Json<Map<String, Value>>, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    if req.skip.is_empty() {
        return Err(ApiError::MissingParameters("no skip dates given"));
    }
    state.schedule_service.update_skip(req.skip).await?;
    let document = state
        .schedule_service
        .document(Some(vec![DocumentKey::Skip]))
        .await?;
    Ok(Json(document))
}

/// `PUT /api/schedules/run` — run a schedule today.
pub async fn run<S, A, C>(
    State(state): State<AppState<S, A, C>>,
    Json(req): Json<RunScheduleRequest>,
) -> Result<RunResponse, ApiError>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    if req.schedule.trim().is_empty() {
        return Err(ApiError::MissingParameters("no schedule given to run"));
    }
    let activation = state.schedule_service.activate(&req.schedule).await?;
    Ok(RunResponse::Created(Json(activation)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_comma_separated_keys() {
        let keys = parse_keys("schedules, active,").unwrap();
        assert_eq!(keys, vec![DocumentKey::Schedules, DocumentKey::Active]);
    }

    #[test]
    fn should_reject_unknown_key() {
        let err = parse_keys("schedules,bogus").unwrap_err();
        assert!(matches!(err, BelfryError::NotFound(_)));
    }
}
