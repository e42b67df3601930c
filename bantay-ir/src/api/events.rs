//! GET /events: live domain events as Server-Sent Events

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use bantay_common::sse::create_event_sse_stream;

use crate::AppState;

pub async fn event_stream(State(state): State<AppState>) -> impl IntoResponse {
    create_event_sse_stream("bantay-ir", state.event_bus.subscribe())
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}
