//! API key repository for PostgreSQL operations
//!
//! Only the HMAC digest of a key is stored; lookups compare digests.

use sqlx::PgPool;

use crate::data::postgres::PostgresError;

/// Store a key digest; exactly one row must be inserted
pub async fn create_api_key(pool: &PgPool, key_hash: &str, app_id: i64) -> Result<(), PostgresError> {
    let result = sqlx::query("INSERT INTO api_keys (key_hash, app_id) VALUES ($1, $2)")
        .bind(key_hash)
        .bind(app_id)
        .execute(pool)
        .await?;

    PostgresError::expect_rows(1, result.rows_affected())
}

pub async fn key_exists(pool: &PgPool, key_hash: &str) -> Result<bool, PostgresError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM api_keys WHERE key_hash = $1)")
            .bind(key_hash)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Owning application of a key digest
pub async fn get_app_id(pool: &PgPool, key_hash: &str) -> Result<i64, PostgresError> {
    let app_id: i64 = sqlx::query_scalar("SELECT app_id FROM api_keys WHERE key_hash = $1")
        .bind(key_hash)
        .fetch_one(pool)
        .await?;
    Ok(app_id)
}
