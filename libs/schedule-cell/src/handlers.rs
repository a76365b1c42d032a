// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{DayScheduleQuery, LayoutRequest, ScheduleError, ScheduleGeometry};
use crate::services::{
    day_schedule::DayScheduleService,
    geometry::apply_geometry,
    overlap::{layout_with_strategy, max_overlap},
};

/// Lays out a caller-supplied list of appointments.
#[axum::debug_handler]
pub async fn layout_schedule(
    Json(request): Json<LayoutRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Layout requested for {} appointments", request.appointments.len());

    let LayoutRequest { appointments, date, geometry, strategy } = request;

    let mut positioned = layout_with_strategy(appointments, strategy)
        .map_err(ScheduleError::from)?;

    if let Some(geometry) = geometry {
        let date = date.ok_or_else(|| {
            ScheduleError::Validation("date is required when geometry is requested".to_string())
        })?;
        apply_geometry(&geometry, date, &mut positioned)?;
    }

    Ok(Json(json!({
        "appointments": positioned,
        "total": positioned.len(),
        "max_overlap": max_overlap(&positioned),
        "strategy": strategy,
    })))
}

/// Loads and lays out one doctor's appointments for a day.
#[axum::debug_handler]
pub async fn get_doctor_day_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DayScheduleQuery>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.as_ref().map(|TypedHeader(auth)| auth.token());
    let schedule_service = DayScheduleService::new(&state);

    let geometry = query
        .with_geometry
        .unwrap_or(false)
        .then(|| ScheduleGeometry::from(&state.schedule_window));

    let schedule = schedule_service
        .build_day_schedule(
            doctor_id,
            query.date,
            geometry.as_ref(),
            query.strategy.unwrap_or_default(),
            token,
        )
        .await?;

    Ok(Json(json!(schedule)))
}
