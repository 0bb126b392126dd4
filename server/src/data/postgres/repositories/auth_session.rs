//! Auth session repository for PostgreSQL operations
//!
//! A user holds at most one session: creating one deletes the others in the
//! same transaction, so no reader observes zero or two sessions mid-rotation.

use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::AuthSessionRow;

pub async fn create_session(pool: &PgPool, session: &AuthSessionRow) -> Result<(), PostgresError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
        .bind(session.user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO auth_sessions (id, user_id, expiry) VALUES ($1, $2, $3)")
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expiry)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_session(pool: &PgPool, id: &str) -> Result<Option<AuthSessionRow>, PostgresError> {
    let row = sqlx::query_as::<_, (String, i64, i64)>(
        "SELECT id, user_id, expiry FROM auth_sessions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, user_id, expiry)| AuthSessionRow {
        id,
        user_id,
        expiry,
    }))
}

/// Move the expiry forward and return the session id
pub async fn extend_session(pool: &PgPool, id: &str, expiry: i64) -> Result<String, PostgresError> {
    let updated: Option<String> =
        sqlx::query_scalar("UPDATE auth_sessions SET expiry = $1 WHERE id = $2 RETURNING id")
            .bind(expiry)
            .bind(id)
            .fetch_optional(pool)
            .await?;

    updated.ok_or(PostgresError::RowCount {
        expected: 1,
        actual: 0,
    })
}

pub async fn delete_session(pool: &PgPool, id: &str) -> Result<(), PostgresError> {
    sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn count_for_user(pool: &PgPool, user_id: i64) -> Result<i64, PostgresError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auth_sessions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
