//! Shared application state for axum handlers.

use belfry_app::ports::{Actuator, Clock, ScheduleStore};
use belfry_app::services::ScheduleService;

/// Application state shared across all axum handlers.
///
/// Generic over the store, actuator and clock to avoid dynamic dispatch.
/// `Clone` is implemented manually so the port types themselves do not need
/// to be `Clone`; the service only holds an `Arc` to the engine.
pub struct AppState<S, A, C> {
    pub schedule_service: ScheduleService<S, A, C>,
}

impl<S, A, C> Clone for AppState<S, A, C> {
    fn clone(&self) -> Self {
        Self {
            schedule_service: self.schedule_service.clone(),
        }
    }
}

impl<S, A, C> AppState<S, A, C>
where
    S: ScheduleStore + 'static,
    A: Actuator + 'static,
    C: Clock + 'static,
{
    pub fn new(schedule_service: ScheduleService<S, A, C>) -> Self {
        Self { schedule_service }
    }
}
