//! Device registry endpoints (operators only)

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use bantay_common::api::ApiResponse;
use bantay_common::models::{Device, NewDevice};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, RequireActor};
use crate::workflow;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

/// POST /api/devices
pub async fn register(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiJson(new_device): ApiJson<NewDevice>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Device>>)> {
    let device = workflow::register_device(&state.workflow(), actor, new_device).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Device registered", device))))
}

/// POST /api/devices/:id/enabled
pub async fn set_enabled(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<EnabledRequest>,
) -> ApiResult<Json<ApiResponse<Device>>> {
    let device = workflow::set_device_enabled(&state.workflow(), actor, id, request.enabled).await?;
    let message = if device.enabled { "Device enabled" } else { "Device disabled" };
    Ok(Json(ApiResponse::ok(message, device)))
}

pub fn device_routes() -> Router<AppState> {
    Router::new()
        .route("/devices", post(register))
        .route("/devices/:id/enabled", post(set_enabled))
}
