//! Stub scheduling backend: the two endpoints the client calls, served by
//! whatever `ScheduleService` the state carries.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::info;

use crate::client::dto::ApiResponse;
use crate::client::{CALENDAR_PATH, GENERATE_PATH};
use crate::error::AppError;
use crate::models::{CalendarSubmission, ScheduleRequest, ScheduleResult};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(GENERATE_PATH, post(generate_schedule))
        .route(CALENDAR_PATH, post(add_to_calendar))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn generate_schedule(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ScheduleResult>>, AppError> {
    let Json(mut req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    req.courses.retain(|course| !course.trim().is_empty());
    if req.courses.is_empty() {
        return Err(AppError::BadRequest("At least one course is required".to_string()));
    }
    if req.days_of_week.is_empty() {
        return Err(AppError::BadRequest("A day of week is required".to_string()));
    }

    info!("generate-schedule: {} course(s)", req.courses.len());
    let result = state.service.generate(&req).await?;
    Ok(Json(ApiResponse::ok(result)))
}

async fn add_to_calendar(
    State(state): State<AppState>,
    payload: Result<Json<CalendarSubmission>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Json(submission) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if submission.schedule.is_empty() {
        return Err(AppError::BadRequest("Schedule is empty".to_string()));
    }

    info!(
        "add-to-calendar: {} event(s) into '{}'",
        submission.schedule.len(),
        submission.calendar_name
    );
    state.service.submit(&submission).await?;
    Ok(Json(ApiResponse::ok_empty()))
}
