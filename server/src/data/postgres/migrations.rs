//! PostgreSQL migration management

use sqlx::PgPool;

use super::error::PostgresError;
use super::schema::{SCHEMA, SCHEMA_VERSION};

/// Run all pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), PostgresError> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = 'schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    let current_version: Option<i32> = if table_exists {
        sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
            .fetch_optional(pool)
            .await?
    } else {
        None
    };

    match current_version {
        None => {
            tracing::debug!("Applying initial PostgreSQL schema v{}", SCHEMA_VERSION);
            apply_initial_schema(pool).await?;
        }
        Some(v) if v > SCHEMA_VERSION => {
            tracing::warn!(
                "PostgreSQL schema version {} is newer than application version {}",
                v,
                SCHEMA_VERSION
            );
        }
        Some(v) if v < SCHEMA_VERSION => {
            return Err(PostgresError::MigrationFailed {
                version: v + 1,
                name: "unknown".to_string(),
                error: format!("No migration path from version {}", v),
            });
        }
        _ => {
            tracing::debug!("PostgreSQL schema is up to date (v{})", SCHEMA_VERSION);
        }
    }

    Ok(())
}

async fn apply_initial_schema(pool: &PgPool) -> Result<(), PostgresError> {
    let mut tx = pool.begin().await?;

    sqlx::raw_sql(SCHEMA)
        .execute(&mut *tx)
        .await
        .map_err(|e| PostgresError::MigrationFailed {
            version: SCHEMA_VERSION,
            name: "initial_schema".to_string(),
            error: e.to_string(),
        })?;

    sqlx::query(
        r#"INSERT INTO schema_version (id, version, applied_at, description)
           VALUES (1, $1, $2, 'Initial schema')
           ON CONFLICT (id) DO UPDATE SET version = EXCLUDED.version, applied_at = EXCLUDED.applied_at"#,
    )
    .bind(SCHEMA_VERSION)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
