//! Public tracking lookup
//!
//! GET /track/:tracking_code returns the status of a concern to whoever holds
//! its tracking code. No actor, no signature; only the public subset of the
//! concern is exposed.

use axum::{extract::State, routing::get, Json, Router};
use bantay_common::api::ApiResponse;
use bantay_common::models::{Category, ConcernStatus};
use bantay_common::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::extract::ApiPath;
use crate::db::concerns;
use crate::workflow::tracking::is_well_formed;
use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct TrackingStatus {
    pub tracking_code: String,
    pub status: ConcernStatus,
    pub status_label: &'static str,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn track(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> ApiResult<Json<ApiResponse<TrackingStatus>>> {
    let code = code.trim().to_ascii_uppercase();
    let not_found = || Error::NotFoundOrUnauthorized(format!("Tracking code {} not found", code));

    if !is_well_formed(&code) {
        return Err(not_found().into());
    }

    let concern = concerns::get_by_tracking_code(&state.db, &code)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok(
        "Concern found",
        TrackingStatus {
            status_label: concern.status.label(),
            tracking_code: concern.tracking_code,
            status: concern.status,
            category: concern.category,
            created_at: concern.created_at,
            updated_at: concern.updated_at,
        },
    )))
}

pub fn track_routes() -> Router<AppState> {
    Router::new().route("/track/:tracking_code", get(track))
}
