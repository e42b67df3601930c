//! Request extractors
//!
//! Wrappers around axum's extractors that reject with `ApiError` so every
//! failure uses the response envelope, plus actor resolution from the
//! `X-Actor-Id` header.

use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use bantay_common::models::Actor;
use uuid::Uuid;

use crate::db::users;
use crate::{ApiError, AppState};

/// Header naming the acting user
pub const ACTOR_HEADER: &str = "x-actor-id";

#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Actor that must be present and registered
#[derive(Debug, Clone, Copy)]
pub struct RequireActor(pub Actor);

/// Actor that may be absent (anonymous submissions); a header naming an
/// unknown user is still rejected
#[derive(Debug, Clone, Copy)]
pub struct MaybeActor(pub Option<Actor>);

#[async_trait]
impl FromRequestParts<AppState> for RequireActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_actor(parts, state).await? {
            Some(actor) => Ok(RequireActor(actor)),
            None => Err(ApiError::Unauthorized(format!("Missing {} header", ACTOR_HEADER))),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeActor(resolve_actor(parts, state).await?))
    }
}

/// Look the header's user up; the role always comes from storage
async fn resolve_actor(parts: &Parts, state: &AppState) -> Result<Option<Actor>, ApiError> {
    let Some(value) = parts.headers.get(ACTOR_HEADER) else {
        return Ok(None);
    };

    let id = value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("Malformed {} header", ACTOR_HEADER)))?;

    let user = users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown actor".to_string()))?;

    Ok(Some(user.as_actor()))
}
