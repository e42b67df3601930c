//! User and device registration

use bantay_common::db::retry_on_contention;
use bantay_common::models::{Actor, ActorRole, Device, GeoPoint, NewDevice, NewUser, User};
use bantay_common::{time, uuid_utils, Error, Result};
use tracing::info;
use uuid::Uuid;

use super::assignment::ensure_handler;
use super::WorkflowContext;
use crate::db::{devices, users};

/// Register a user.
///
/// Anyone may register as a citizen. Purok leaders and operators are
/// registered by an operator, except that the very first operator can be
/// created without one so a fresh installation can be bootstrapped.
pub async fn register_user(
    ctx: &WorkflowContext,
    registrar: Option<Actor>,
    new_user: NewUser,
) -> Result<User> {
    new_user.validate()?;

    if new_user.role != ActorRole::Citizen && !registrar.is_some_and(|a| a.has_override()) {
        let bootstrap = new_user.role == ActorRole::Operator && !operator_exists(ctx).await?;
        if !bootstrap {
            return Err(Error::Validation(format!(
                "Only operators may register a {}",
                new_user.role
            )));
        }
        info!("Registering first operator");
    }

    let user = retry_on_contention("register_user", ctx.settings.db_max_lock_wait_ms, || {
        users::insert_user(&ctx.db, &new_user)
    })
    .await?;

    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok(user)
}

async fn operator_exists(ctx: &WorkflowContext) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(ActorRole::Operator.as_str())
        .fetch_one(&ctx.db)
        .await?;
    Ok(count > 0)
}

/// Register a detection device (operators only)
pub async fn register_device(ctx: &WorkflowContext, actor: Actor, new_device: NewDevice) -> Result<Device> {
    require_operator(actor)?;

    let name = new_device.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Device name must not be empty".to_string()));
    }
    let location = GeoPoint::from_parts(new_device.latitude, new_device.longitude)?;

    if let Some(handler_id) = new_device.default_handler_id {
        let mut conn = ctx.db.acquire().await?;
        ensure_handler(&mut *conn, handler_id).await?;
    }

    let device = Device {
        id: uuid_utils::generate(),
        name: name.to_string(),
        location_label: new_device.location_label,
        location,
        enabled: true,
        default_handler_id: new_device.default_handler_id,
        created_at: time::now(),
    };

    retry_on_contention("register_device", ctx.settings.db_max_lock_wait_ms, || {
        devices::insert_device(&ctx.db, &device)
    })
    .await?;

    info!(device_id = %device.id, name = %device.name, "Device registered");
    Ok(device)
}

/// Enable or disable ingestion from a device (operators only)
pub async fn set_device_enabled(
    ctx: &WorkflowContext,
    actor: Actor,
    device_id: Uuid,
    enabled: bool,
) -> Result<Device> {
    require_operator(actor)?;

    let found = retry_on_contention("set_device_enabled", ctx.settings.db_max_lock_wait_ms, || {
        devices::set_enabled(&ctx.db, device_id, enabled)
    })
    .await?;
    if !found {
        return Err(Error::NotFoundOrUnauthorized(format!("Device {} not found", device_id)));
    }

    info!(device_id = %device_id, enabled, "Device updated");
    devices::get_device(&ctx.db, device_id)
        .await?
        .ok_or_else(|| Error::NotFoundOrUnauthorized(format!("Device {} not found", device_id)))
}

pub(crate) fn require_operator(actor: Actor) -> Result<()> {
    if actor.has_override() {
        Ok(())
    } else {
        Err(Error::NotFoundOrUnauthorized(
            "Operation requires an operator".to_string(),
        ))
    }
}
