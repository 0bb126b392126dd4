//! User repository for PostgreSQL operations

use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::UserRow;

/// Insert a user and return its id; a taken name surfaces as `Conflict`
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    password_hash: &str,
) -> Result<i64, PostgresError> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO users (name, password_hash) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(password_hash)
            .fetch_one(pool)
            .await?;
    Ok(id)
}

pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Option<UserRow>, PostgresError> {
    let row = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT id, name, password_hash FROM users WHERE name = $1",
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
