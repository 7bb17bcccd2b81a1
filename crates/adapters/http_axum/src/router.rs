//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use belfry_app::ports::{Actuator, Clock, ScheduleStore};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the management API under `/api` and includes a [`TraceLayer`] that
/// logs each HTTP request/response at the `DEBUG` level.
pub fn build<S, A, C>(state: AppState<S, A, C>) -> Router
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use belfry_adapter_virtual::RelayState;
    use serde_json::json;

    use super::*;
    use crate::test_support::{TestApp, test_app};

    async fn with_night_schedule(app: &TestApp) {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/schedules",
                Some(json!({
                    "schedules": {"night": [[79200, "on"], [79260, "off"]]},
                    "weekly": {"1": ["night"]}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = app
            .send(
                Method::PUT,
                "/api/schedules/active",
                Some(json!({"active": ["night"]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = test_app();
        let (status, _) = app.send(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn should_return_whole_document_without_keys() {
        let app = test_app();
        let (status, body) = app.send(Method::GET, "/api/schedule", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], json!([]));
        assert_eq!(body["progress"], json!(-1));
        assert_eq!(body["gap"], json!(5));
    }

    #[tokio::test]
    async fn should_save_assign_and_activate_schedule() {
        let app = test_app();
        with_night_schedule(&app).await;

        let (status, body) = app
            .send(Method::GET, "/api/schedule?key=weekly,active", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weekly"][1], json!(["night"]));
        assert_eq!(body["active"], json!(["night"]));
        assert!(body.get("schedules").is_none());

        let (_, body) = app.send(Method::GET, "/api/engine", None).await;
        assert_eq!(body["today"].as_array().unwrap().len(), 2);
        assert_eq!(body["today"][0]["at"], json!(79200));
    }

    #[tokio::test]
    async fn should_not_overwrite_existing_schedule_on_post() {
        let app = test_app();
        with_night_schedule(&app).await;

        let payload = json!({"schedules": {"night": [[100, "on"]]}});
        let (status, body) = app
            .send(Method::POST, "/api/schedules", Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["written"], json!([]));

        let (_, body) = app.send(Method::PUT, "/api/schedules", Some(payload)).await;
        assert_eq!(body["written"], json!(["night"]));
    }

    #[tokio::test]
    async fn should_reject_empty_save_request() {
        let app = test_app();
        let (status, body) = app
            .send(Method::POST, "/api/schedules", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("no schedules"));
    }

    #[tokio::test]
    async fn should_reject_out_of_range_weekday() {
        let app = test_app();
        with_night_schedule(&app).await;
        let (status, _) = app
            .send(
                Method::POST,
                "/api/schedules",
                Some(json!({"assign_only": true, "weekly": {"9": ["night"]}})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn should_save_nothing_when_assignment_is_rejected() {
        let app = test_app();
        let (status, _) = app
            .send(
                Method::POST,
                "/api/schedules",
                Some(json!({
                    "schedules": {"noon": [[43200, "on"]]},
                    "weekly": {"9": ["noon"]}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/schedules",
                Some(json!({
                    "schedules": {"noon": [[43200, "on"]]},
                    "monthly": {"1": ["noon", "ghost"]}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = app
            .send(Method::GET, "/api/schedule?key=schedules,monthly", None)
            .await;
        assert_eq!(body["schedules"], json!({}));
        assert!(body["monthly"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_document_key() {
        let app = test_app();
        let (status, _) = app
            .send(Method::GET, "/api/schedule?key=bogus", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_skip_active_schedule_on_delete_without_force() {
        let app = test_app();
        with_night_schedule(&app).await;

        let (status, body) = app
            .send(
                Method::DELETE,
                "/api/schedules",
                Some(json!({"keys": ["night"]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skipped_active"], json!(["night"]));

        let (_, body) = app
            .send(
                Method::DELETE,
                "/api/schedules",
                Some(json!({"keys": ["night"], "force": true})),
            )
            .await;
        assert!(body["deleted"].get("night").is_some());
    }

    #[tokio::test]
    async fn should_return_not_found_when_running_unknown_schedule() {
        let app = test_app();
        let (status, body) = app
            .send(
                Method::PUT,
                "/api/schedules/run",
                Some(json!({"schedule": "ghost"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn should_instantiate_wild_schedule_on_run() {
        let app = test_app();
        app.send(
            Method::PUT,
            "/api/schedules",
            Some(json!({"schedules": {"fire": [["*", "on"], ["+30", "off"]]}})),
        )
        .await;

        let (status, body) = app
            .send(
                Method::PUT,
                "/api/schedules/run",
                Some(json!({"schedule": "fire"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["outcome"], json!("instantiated"));
        assert_eq!(body["anchor"], json!(crate::test_support::TUESDAY_10AM));
    }

    #[tokio::test]
    async fn should_ring_bell_manually() {
        let app = test_app();
        let (status, body) = app
            .send(Method::POST, "/api/bell/ring", Some(json!({"mode": "on"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rang"], json!(true));
        assert_eq!(app.relay_state(), RelayState::On);

        let (_, body) = app
            .send(
                Method::POST,
                "/api/bell/ring",
                Some(json!({"mode": "chime"})),
            )
            .await;
        assert_eq!(body["rang"], json!(false));
    }

    #[tokio::test]
    async fn should_reject_blank_ring_mode() {
        let app = test_app();
        let (status, _) = app
            .send(Method::POST, "/api/bell/ring", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn should_update_and_validate_tunables() {
        let app = test_app();
        let (status, body) = app
            .send(
                Method::PUT,
                "/api/engine/tunables",
                Some(json!({"gap": 10})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"gap": 10, "max_wait": 60}));

        let (status, _) = app
            .send(
                Method::PUT,
                "/api/engine/tunables",
                Some(json!({"max_wait": 0})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn should_reset_engine_state() {
        let app = test_app();
        let (status, _) = app.send(Method::POST, "/api/engine/reset", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn should_set_clock() {
        let app = test_app();
        let (status, body) = app
            .send(Method::PUT, "/api/time", Some(json!({"unixtime": 1_717_459_200})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["local_time"], json!("2024-06-04 00:00:00"));
    }
}
