//! In-memory wiring for router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use belfry_adapter_virtual::{ManualClock, RelayState, VirtualRelay};
use belfry_app::engine::ScheduleEngine;
use belfry_app::ports::ScheduleStore;
use belfry_app::services::ScheduleService;
use belfry_domain::book::{DocumentKey, ScheduleBook};
use belfry_domain::error::BelfryError;
use belfry_domain::time::Moment;
use chrono::FixedOffset;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::state::AppState;

/// 2024-06-04 10:00:00 UTC, a Tuesday.
pub const TUESDAY_10AM: i64 = 1_717_495_200;

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<DocumentKey, Value>>,
}

impl ScheduleStore for MemoryStore {
    fn get(&self, key: DocumentKey) -> impl Future<Output = Result<Option<Value>, BelfryError>> + Send {
        let value = self.documents.lock().unwrap().get(&key).cloned();
        async { Ok(value) }
    }

    fn set(
        &self,
        key: DocumentKey,
        value: Value,
    ) -> impl Future<Output = Result<(), BelfryError>> + Send {
        self.documents.lock().unwrap().insert(key, value);
        async { Ok(()) }
    }

    fn remove(
        &self,
        key: DocumentKey,
    ) -> impl Future<Output = Result<Option<Value>, BelfryError>> + Send {
        let value = self.documents.lock().unwrap().remove(&key);
        async { Ok(value) }
    }
}

pub type TestState = AppState<MemoryStore, VirtualRelay, ManualClock>;

pub struct TestApp {
    state: TestState,
    router: Router,
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub fn relay_state(&self) -> RelayState {
        self.state.schedule_service.engine().actuator().state()
    }
}

pub fn test_app() -> TestApp {
    let clock = ManualClock::new(Moment::new(TUESDAY_10AM, FixedOffset::east_opt(0).unwrap()));
    let engine = ScheduleEngine::new(
        MemoryStore::default(),
        VirtualRelay::default(),
        clock,
        ScheduleBook::default(),
    );
    let state = AppState::new(ScheduleService::new(Arc::new(engine)));
    let router = crate::router::build(state.clone());
    TestApp { state, router }
}
