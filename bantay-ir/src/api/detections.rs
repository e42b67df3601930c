//! POST /api/detections
//!
//! Multipart upload from an edge device:
//! - `device_id`   registered device UUID
//! - `image`       the snapshot (JPEG/PNG/WebP)
//! - `detected_at` optional RFC 3339 capture time
//! - `detections`  optional JSON array of `{label, confidence}`

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bantay_common::api::ApiResponse;
use bantay_common::models::DetectedObject;
use bantay_common::time;
use uuid::Uuid;

use crate::ingest::{DetectionUpload, IngestOutcome};
use crate::{ApiError, ApiResult, AppState};

pub async fn ingest_detection(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<IngestOutcome>>)> {
    let upload = read_upload(multipart).await?;
    let outcome = state.ingestor.ingest(upload).await?;

    // A raised concern is a created resource; a dismissed snapshot is not
    let (status, message) = if outcome.false_alarm {
        (StatusCode::OK, "Detection recorded as false alarm")
    } else {
        (StatusCode::CREATED, "Concern raised from detection")
    };
    Ok((status, Json(ApiResponse::ok(message, outcome))))
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<DetectionUpload> {
    let mut device_id = None;
    let mut image = None;
    let mut detected_at = None;
    let mut detections = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "image" => image = Some(field.bytes().await?.to_vec()),
            "device_id" => {
                let text = field.text().await?;
                let id = Uuid::parse_str(text.trim())
                    .map_err(|_| ApiError::validation(format!("Invalid device_id '{}'", text)))?;
                device_id = Some(id);
            }
            "detected_at" => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    detected_at = Some(time::parse_client(text.trim())?);
                }
            }
            "detections" => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    detections = serde_json::from_str::<Vec<DetectedObject>>(&text)
                        .map_err(|e| ApiError::validation(format!("Invalid detections: {}", e)))?;
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(DetectionUpload {
        device_id: device_id.ok_or_else(|| ApiError::validation("Missing multipart field 'device_id'"))?,
        image: image.ok_or_else(|| ApiError::validation("Missing multipart field 'image'"))?,
        detected_at,
        detections,
    })
}

pub fn detection_routes() -> Router<AppState> {
    Router::new().route("/detections", post(ingest_detection))
}
