//! GET /api/distributions: the calling handler's work queue

use axum::{extract::State, routing::get, Json, Router};
use bantay_common::api::ApiResponse;
use bantay_common::models::{Concern, DistributionStatus};
use serde::Deserialize;
use std::str::FromStr;

use super::extract::{ApiQuery, RequireActor};
use crate::db::concerns;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct DistributionFilter {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list_for_handler(
    State(state): State<AppState>,
    RequireActor(actor): RequireActor,
    ApiQuery(filter): ApiQuery<DistributionFilter>,
) -> ApiResult<Json<ApiResponse<Vec<Concern>>>> {
    let status = filter
        .status
        .as_deref()
        .map(DistributionStatus::from_str)
        .transpose()?;

    let items = concerns::list_for_handler(&state.db, actor.id, status).await?;
    Ok(Json(ApiResponse::ok(
        format!("{} concern(s) assigned", items.len()),
        items,
    )))
}

pub fn distribution_routes() -> Router<AppState> {
    Router::new().route("/distributions", get(list_for_handler))
}
