//! User repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::UserRow;

/// Insert a user and return its id; a taken name surfaces as `Conflict`
pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    password_hash: &str,
) -> Result<i64, SqliteError> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO users (name, password_hash) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(password_hash)
            .fetch_one(pool)
            .await?;
    Ok(id)
}

pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<UserRow>, SqliteError> {
    let row = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, name, password_hash FROM users WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, password_hash)| UserRow {
        id,
        name,
        password_hash,
    }))
}
