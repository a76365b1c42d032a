// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Pure layout of a caller-supplied day
        .route("/layout", post(handlers::layout_schedule))
        // Doctor calendar, loaded from the appointments table
        .route("/doctors/{doctor_id}/day", get(handlers::get_doctor_day_schedule))
        .with_state(state)
}
