//! GET /api/media?source_type=&source_id= (operators only)

use axum::{extract::State, routing::get, Json, Router};
use bantay_common::api::ApiResponse;
use bantay_common::models::{IncidentMedia, MediaSource, MediaSourceKind};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use super::extract::{ApiQuery, RequireActor};
use crate::db::media;
use crate::workflow::registry::require_operator;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub source_type: String,
    pub source_id: Uuid,
}

pub async fn list_media(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiQuery(query): ApiQuery<MediaQuery>,
) -> ApiResult<Json<ApiResponse<Vec<IncidentMedia>>>> {
    require_operator(actor)?;
    let kind = MediaSourceKind::from_str(&query.source_type)?;
    let source = MediaSource::from_parts(kind, query.source_id);

    let items = media::list_for_source(&state.db, source).await?;
    Ok(Json(ApiResponse::ok("Media retrieved", items)))
}

pub fn media_routes() -> Router<AppState> {
    Router::new().route("/media", get(list_media))
}
