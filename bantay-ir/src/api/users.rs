//! POST /api/users

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use bantay_common::api::ApiResponse;
use bantay_common::models::{NewUser, User};

use super::extract::{ApiJson, MaybeActor};
use crate::workflow;
use crate::{ApiResult, AppState};

pub async fn register(
    State(state): State<AppState>,
    MaybeActor(actor): MaybeActor,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = workflow::register_user(&state.workflow(), actor, new_user).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("User registered", user))))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", post(register))
}
