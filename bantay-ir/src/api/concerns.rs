//! Concern endpoints
//!
//! POST   /api/concerns                    submit (anonymous allowed)
//! GET    /api/concerns/:id                detail with distribution
//! DELETE /api/concerns/:id                soft delete
//! GET    /api/concerns/:id/history        chronological history
//! POST   /api/concerns/:id/assign         distribute to a purok leader
//! POST   /api/concerns/:id/transition     status change
//! GET    /api/concerns/:id/media          attachments
//! POST   /api/concerns/:id/media          attach a photo or recording

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bantay_common::api::ApiResponse;
use bantay_common::models::{
    Concern, ConcernStatus, Distribution, HistoryEntry, IncidentMedia, MediaSource, NewConcern,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, MaybeActor, RequireActor};
use super::uploads::read_file_field;
use crate::db::{distributions, history, media};
use crate::workflow::{self, load_visible_concern};
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ConcernDetail {
    pub concern: Concern,
    pub distribution: Option<Distribution>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub handler_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// One of pending, ongoing, escalated, resolved
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub previous_status: ConcernStatus,
    pub new_status: ConcernStatus,
    pub concern: Concern,
    pub distribution: Distribution,
    pub history: HistoryEntry,
}

/// POST /api/concerns
pub async fn submit(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    ApiJson(new_concern): ApiJson<NewConcern>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Concern>>)> {
    let concern = workflow::submit_concern(&state.workflow(), actor, new_concern).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Concern submitted", concern)),
    ))
}

/// GET /api/concerns/:id
pub async fn get_concern(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<ConcernDetail>>> {
    let concern = load_visible_concern(&state.db, id, actor).await?;
    let distribution = distributions::get_for_concern(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(
        "Concern retrieved",
        ConcernDetail {
            concern,
            distribution,
        },
    )))
}

/// DELETE /api/concerns/:id
pub async fn delete_concern(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Uuid>>> {
    workflow::soft_delete_concern(&state.workflow(), id, actor).await?;
    Ok(Json(ApiResponse::ok("Concern deleted", id)))
}

/// GET /api/concerns/:id/history
pub async fn get_history(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<HistoryEntry>>>> {
    load_visible_concern(&state.db, id, actor).await?;
    let entries = history::list_for_concern(&state.db, id).await?;
    Ok(Json(ApiResponse::ok("History retrieved", entries)))
}

/// POST /api/concerns/:id/assign
pub async fn assign(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<AssignRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Distribution>>)> {
    let distribution =
        workflow::assign_concern(&state.workflow(), id, request.handler_id, actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Concern assigned", distribution)),
    ))
}

/// POST /api/concerns/:id/transition
pub async fn transition(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<TransitionRequest>,
) -> ApiResult<Json<ApiResponse<TransitionResponse>>> {
    let requested = ConcernStatus::from_str(request.status.trim())?;
    let outcome = state
        .transitions
        .apply_transition(id, requested, actor, request.remarks.as_deref())
        .await?;

    Ok(Json(ApiResponse::ok(
        format!("Concern is now {}", outcome.new_status().label()),
        TransitionResponse {
            previous_status: outcome.previous_status(),
            new_status: outcome.new_status(),
            concern: outcome.concern,
            distribution: outcome.distribution,
            history: outcome.history,
        },
    )))
}

/// GET /api/concerns/:id/media
pub async fn list_media(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<IncidentMedia>>>> {
    load_visible_concern(&state.db, id, actor).await?;
    let items = media::list_for_source(&state.db, MediaSource::Concern(id)).await?;
    Ok(Json(ApiResponse::ok("Media retrieved", items)))
}

/// POST /api/concerns/:id/media (multipart field `file`)
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
        MediaSource::Concern(id),
        &bytes,
        actor,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Media attached", record))))
}

/// Build concern routes (nested under /api)
pub fn concern_routes() -> Router<AppState> {
    Router::new()
        .route("/concerns", post(submit))
        .route("/concerns/:id", get(get_concern).delete(delete_concern))
        .route("/concerns/:id/history", get(get_history))
        .route("/concerns/:id/assign", post(assign))
        .route("/concerns/:id/transition", post(transition))
        .route("/concerns/:id/media", get(list_media).post(attach_media))
}
