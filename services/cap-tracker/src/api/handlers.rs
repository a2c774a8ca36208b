use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::tracker::error::{validate_cap_limit, validate_time_frame_hours};
use crate::tracker::{TrackerError, ValidationError};

use super::types::{
    ConfigResponse, ErrorResponse, RecordEventResponse, ResetResponse, StatusResponse,
    UpdateConfigRequest,
};
use super::ApiState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn record_event(State(state): State<Arc<ApiState>>) -> ApiResult<RecordEventResponse> {
    let message_count = state.tracker.record_event().await.map_err(tracker_error)?;
    let status = state.tracker.compute_status().await.map_err(tracker_error)?;

    Ok(Json(RecordEventResponse {
        message_count,
        status: status.into(),
    }))
}

pub async fn get_status(State(state): State<Arc<ApiState>>) -> ApiResult<StatusResponse> {
    let status = state.tracker.compute_status().await.map_err(tracker_error)?;
    Ok(Json(status.into()))
}

pub async fn get_badge(
    State(state): State<Arc<ApiState>>,
) -> ApiResult<crate::refresh::BoardEntry> {
    match state.board.current().await {
        Some(entry) => Ok(Json(entry)),
        None => Err(not_found("status_not_ready", "no status has been computed yet")),
    }
}

pub async fn reset_window(State(state): State<Arc<ApiState>>) -> ApiResult<ResetResponse> {
    state.tracker.reset().await.map_err(tracker_error)?;
    info!("usage window reset via API");
    Ok(Json(ResetResponse { success: true }))
}

pub async fn get_config(State(state): State<Arc<ApiState>>) -> ApiResult<ConfigResponse> {
    let config = state.tracker.config().await.map_err(tracker_error)?;
    Ok(Json(ConfigResponse {
        cap_limit: config.cap_limit,
        time_frame_hours: config.time_frame_hours,
    }))
}

pub async fn update_config(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<UpdateConfigRequest>,
) -> ApiResult<ConfigResponse> {
    if request.cap_limit.is_none() && request.time_frame_hours.is_none() {
        return Err(bad_request(
            "empty_update",
            "provide cap_limit and/or time_frame_hours",
        ));
    }

    // Reject the whole request before touching the store.
    if let Some(limit) = request.cap_limit {
        validate_cap_limit(limit).map_err(validation_error)?;
    }
    if let Some(hours) = request.time_frame_hours {
        validate_time_frame_hours(hours).map_err(validation_error)?;
    }

    if let Some(limit) = request.cap_limit {
        state
            .tracker
            .set_cap_limit(limit)
            .await
            .map_err(tracker_error)?;
    }
    if let Some(hours) = request.time_frame_hours {
        state
            .tracker
            .set_time_frame_hours(hours)
            .await
            .map_err(tracker_error)?;
    }

    get_config(State(state)).await
}

pub async fn health_check(State(state): State<Arc<ApiState>>) -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "cap-watch-tracker",
        "store": state.config.store_backend.to_string(),
    })))
}

fn tracker_error(err: TrackerError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        TrackerError::Validation(err) => validation_error(err),
        TrackerError::Store(err) => internal_error(err),
    }
}

fn validation_error(err: ValidationError) -> (StatusCode, Json<ErrorResponse>) {
    bad_request("invalid_config", &err.to_string())
}

fn bad_request(code: &str, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn not_found(code: &str, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %err, "usage API internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
            code: "internal_error".to_string(),
            details: Some(serde_json::json!({ "message": err.to_string() })),
        }),
    )
}
