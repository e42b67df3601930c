//! Who a notification goes to

use bantay_common::events::BantayEvent;
use bantay_common::models::User;
use bantay_common::Result;
use sqlx::SqlitePool;

use crate::db::users;

/// Submitter for status updates, handler for assignments, nobody otherwise.
///
/// Anonymous and device-detected concerns have no submitter to notify.
pub async fn resolve_recipient(db: &SqlitePool, event: &BantayEvent) -> Result<Option<User>> {
    let user_id = match event {
        BantayEvent::ConcernStatusUpdated { concern, .. } => concern.submitted_by,
        BantayEvent::ConcernAssigned { distribution, .. } => Some(distribution.handler_id),
        BantayEvent::ConcernSubmitted { .. } | BantayEvent::DetectionDismissed { .. } => None,
    };

    match user_id {
        Some(id) => users::get_user(db, id).await,
        None => Ok(None),
    }
}
