//! Registered users

use bantay_common::models::{NewUser, User};
use bantay_common::{time, uuid_utils, Result};
use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::{enum_col, ts_col, uuid_col};

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: uuid_col(row, "id")?,
        name: row.try_get("name")?,
        role: enum_col(row, "role")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        purok: row.try_get("purok")?,
        created_at: ts_col(row, "created_at")?,
    })
}

/// Insert a validated registration and return the stored record
pub async fn insert_user(executor: impl SqliteExecutor<'_>, new_user: &NewUser) -> Result<User> {
    let user = User {
        id: uuid_utils::generate(),
        name: new_user.name.trim().to_string(),
        role: new_user.role,
        phone: new_user.phone.clone(),
        email: new_user.email.clone(),
        purok: new_user.purok.clone(),
        created_at: time::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, role, phone, email, purok, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.name)
    .bind(user.role.as_str())
    .bind(&user.phone)
    .bind(&user.email)
    .bind(&user.purok)
    .bind(time::to_storage(&user.created_at))
    .execute(executor)
    .await?;

    Ok(user)
}

pub async fn get_user(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, role, phone, email, purok, created_at FROM users WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}
