//! Accident endpoints
//!
//! POST /api/accidents              report (anonymous allowed)
//! GET  /api/accidents/:id          detail (reporter or operator)
//! POST /api/accidents/:id/media    attach a photo or recording

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bantay_common::api::ApiResponse;
use bantay_common::models::{Accident, IncidentMedia, MediaSource, NewAccident};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, MaybeActor, RequireActor};
use super::uploads::read_file_field;
use crate::workflow::{self, load_visible_accident};
use crate::{ApiResult, AppState};

pub async fn report(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    ApiJson(new_accident): ApiJson<NewAccident>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Accident>>)> {
    let accident = workflow::report_accident(&state.workflow(), actor, new_accident).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Accident reported", accident))))
}

pub async fn get_accident(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Accident>>> {
    let accident = load_visible_accident(&state.db, id, actor).await?;
    Ok(Json(ApiResponse::ok("Accident retrieved", accident)))
}

pub async fn attach_media(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<IncidentMedia>>)> {
    let bytes = read_file_field(multipart, "file").await?;
    let record = workflow::attach_media(
        &state.workflow(),
        &state.media_store,
        MediaSource::Accident(id),
        &bytes,
        actor,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Media attached", record))))
}

pub fn accident_routes() -> Router<AppState> {
    Router::new()
        .route("/accidents", post(report))
        .route("/accidents/:id", get(get_accident))
        .route("/accidents/:id/media", post(attach_media))
}
