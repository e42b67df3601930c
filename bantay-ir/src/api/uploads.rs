//! Multipart helpers

use axum::extract::Multipart;

use crate::{ApiError, ApiResult};

/// Bytes of the named file field; other fields are ignored
pub async fn read_file_field(mut multipart: Multipart, field_name: &str) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(field_name) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(ApiError::validation(format!("Missing multipart field '{}'", field_name)))
}
