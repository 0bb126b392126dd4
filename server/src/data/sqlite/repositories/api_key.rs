//! API key repository for SQLite operations
//!
//! Only the HMAC digest of a key is stored; lookups compare digests.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;

/// Store a key digest; exactly one row must be inserted
pub async fn create_api_key(pool: &SqlitePool, key_hash: &str, app_id: i64) -> Result<(), SqliteError> {
    let result = sqlx::query("INSERT INTO api_keys (key_hash, app_id) VALUES (?, ?)")
        .bind(key_hash)
        .bind(app_id)
        .execute(pool)
        .await?;

    SqliteError::expect_rows(1, result.rows_affected())
}

pub async fn key_exists(pool: &SqlitePool, key_hash: &str) -> Result<bool, SqliteError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM api_keys WHERE key_hash = ?)")
            .bind(key_hash)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Owning application of a key digest
pub async fn get_app_id(pool: &SqlitePool, key_hash: &str) -> Result<i64, SqliteError> {
    let app_id: i64 = sqlx::query_scalar("SELECT app_id FROM api_keys WHERE key_hash = ?")
        .bind(key_hash)
        .fetch_one(pool)
        .await?;
    Ok(app_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::sqlite::repositories::{application, team, user};

    #[tokio::test]
    async fn test_key_lookup() {
        let db = SqliteService::in_memory().await;
        let uid = user::create_user(db.pool(), "alice", "h").await.unwrap();
        let t = team::create_team_with_owner(db.pool(), "one", uid, "owner")
            .await
            .unwrap();
        let app = application::create_application(db.pool(), "ios", t)
            .await
            .unwrap();

        create_api_key(db.pool(), "digest", app).await.unwrap();

        assert!(key_exists(db.pool(), "digest").await.unwrap());
        assert!(!key_exists(db.pool(), "other").await.unwrap());
        assert_eq!(get_app_id(db.pool(), "digest").await.unwrap(), app);
        assert!(get_app_id(db.pool(), "other").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_digest_conflicts() {
        let db = SqliteService::in_memory().await;
        let uid = user::create_user(db.pool(), "alice", "h").await.unwrap();
        let t = team::create_team_with_owner(db.pool(), "one", uid, "owner")
            .await
            .unwrap();
        let app = application::create_application(db.pool(), "ios", t)
            .await
            .unwrap();

        create_api_key(db.pool(), "digest", app).await.unwrap();
        assert!(matches!(
            create_api_key(db.pool(), "digest", app).await,
            Err(SqliteError::Conflict(_))
        ));
    }
}
