//! Telemetry repository for PostgreSQL operations
//!
//! Installations, telemetry sessions, events, traces and memory usage
//! samples. Rows are written as reported by the SDK; no cross-row
//! validation is done here.

use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::{EventRow, InstallationRow, MemoryUsageRow, SessionRow, TraceRow};

type MemoryTuple = (String, String, String, i64, i64, i64, i64, i64, i64, i64);

fn memory_from_tuple(t: MemoryTuple) -> MemoryUsageRow {
    let (
        id,
        session_id,
        installation_id,
        app_id,
        free_memory,
        used_memory,
        max_memory,
        total_memory,
        available_heap_space,
        created_at,
    ) = t;
    MemoryUsageRow {
        id,
        session_id,
        installation_id,
        app_id,
        free_memory,
        used_memory,
        max_memory,
        total_memory,
        available_heap_space,
        created_at,
    }
}

const MEMORY_COLUMNS: &str = "id, session_id, installation_id, app_id, free_memory, used_memory, max_memory, total_memory, available_heap_space, created_at";

// ==================== Installations ====================

pub async fn create_installation(
    pool: &PgPool,
    row: &InstallationRow,
) -> Result<(), PostgresError> {
    sqlx::query(
        r#"INSERT INTO installations (id, app_id, sdk_version, model, brand, created_at)
           VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(&row.id)
    .bind(row.app_id)
    .bind(row.sdk_version)
    .bind(&row.model)
    .bind(&row.brand)
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_installation(
    pool: &PgPool,
    id: &str,
) -> Result<Option<InstallationRow>, PostgresError> {
    let row = sqlx::query_as::<_, (String, i64, i64, String, String, i64)>(
        "SELECT id, app_id, sdk_version, model, brand, created_at FROM installations WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, app_id, sdk_version, model, brand, created_at)| InstallationRow {
            id,
            app_id,
            sdk_version,
            model,
            brand,
            created_at,
        },
    ))
}

// ==================== Sessions ====================

pub async fn create_session(pool: &PgPool, row: &SessionRow) -> Result<(), PostgresError> {
    sqlx::query(
        r#"INSERT INTO sessions (id, installation_id, app_id, created_at, crashed)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(&row.id)
    .bind(&row.installation_id)
    .bind(row.app_id)
    .bind(row.created_at)
    .bind(row.crashed)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_session(pool: &PgPool, id: &str) -> Result<Option<SessionRow>, PostgresError> {
    let row = sqlx::query_as::<_, (String, String, i64, i64, bool)>(
        "SELECT id, installation_id, app_id, created_at, crashed FROM sessions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, installation_id, app_id, created_at, crashed)| SessionRow {
            id,
            installation_id,
            app_id,
            created_at,
            crashed,
        },
    ))
}

/// Set `crashed` on the app's session, committing only if one row changed
pub async fn mark_session_crashed(
    pool: &PgPool,
    id: &str,
    app_id: i64,
) -> Result<(), PostgresError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE sessions SET crashed = TRUE WHERE id = $1 AND app_id = $2")
        .bind(id)
        .bind(app_id)
        .execute(&mut *tx)
        .await?;

    PostgresError::expect_rows(1, result.rows_affected())?;
    tx.commit().await?;
    Ok(())
}

// ==================== Events ====================

pub async fn create_event(pool: &PgPool, row: &EventRow) -> Result<(), PostgresError> {
    sqlx::query(
        r#"INSERT INTO events (id, session_id, app_id, event_type, serialized_data, created_at)
           VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(&row.id)
    .bind(&row.session_id)
    .bind(row.app_id)
    .bind(&row.event_type)
    .bind(&row.serialized_data)
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_events(
    pool: &PgPool,
    session_id: &str,
    app_id: i64,
) -> Result<Vec<EventRow>, PostgresError> {
    let rows = sqlx::query_as::<_, (String, String, i64, String, String, i64)>(
        r#"SELECT id, session_id, app_id, event_type, serialized_data, created_at
           FROM events WHERE session_id = $1 AND app_id = $2 ORDER BY created_at"#,
    )
    .bind(session_id)
    .bind(app_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, session_id, app_id, event_type, serialized_data, created_at)| EventRow {
                id,
                session_id,
                app_id,
                event_type,
                serialized_data,
                created_at,
            },
        )
        .collect())
}

// ==================== Traces ====================

pub async fn create_trace(pool: &PgPool, row: &TraceRow) -> Result<(), PostgresError> {
    sqlx::query(
        r#"INSERT INTO traces (trace_id, session_id, group_id, parent_id, app_id, name, status,
                               error_message, started_at, ended_at, has_ended)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
    )
    .bind(&row.trace_id)
    .bind(&row.session_id)
    .bind(&row.group_id)
    .bind(&row.parent_id)
    .bind(row.app_id)
    .bind(&row.name)
    .bind(&row.status)
    .bind(&row.error_message)
    .bind(row.started_at)
    .bind(row.ended_at)
    .bind(row.has_ended)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_traces(
    pool: &PgPool,
    session_id: &str,
    app_id: i64,
) -> Result<Vec<TraceRow>, PostgresError> {
    #[allow(clippy::type_complexity)]
    let rows = sqlx::query_as::<
        _,
        (String, String, String, Option<String>, i64, String, String, String, i64, i64, bool),
    >(
        r#"SELECT trace_id, session_id, group_id, parent_id, app_id, name, status,
                  error_message, started_at, ended_at, has_ended
           FROM traces WHERE session_id = $1 AND app_id = $2 ORDER BY started_at"#,
    )
    .bind(session_id)
    .bind(app_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                trace_id,
                session_id,
                group_id,
                parent_id,
                app_id,
                name,
                status,
                error_message,
                started_at,
                ended_at,
                has_ended,
            )| TraceRow {
                trace_id,
                session_id,
                group_id,
                parent_id,
                app_id,
                name,
                status,
                error_message,
                started_at,
                ended_at,
                has_ended,
            },
        )
        .collect())
}

// ==================== Memory Usage ====================

pub async fn create_memory_usage(pool: &PgPool, row: &MemoryUsageRow) -> Result<(), PostgresError> {
    sqlx::query(&format!(
        "INSERT INTO memory_usage ({MEMORY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
    ))
    .bind(&row.id)
    .bind(&row.session_id)
    .bind(&row.installation_id)
    .bind(row.app_id)
    .bind(row.free_memory)
    .bind(row.used_memory)
    .bind(row.max_memory)
    .bind(row.total_memory)
    .bind(row.available_heap_space)
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn memory_for_session(
    pool: &PgPool,
    session_id: &str,
    app_id: i64,
) -> Result<Vec<MemoryUsageRow>, PostgresError> {
    let rows = sqlx::query_as::<_, MemoryTuple>(&format!(
        "SELECT {MEMORY_COLUMNS} FROM memory_usage WHERE session_id = $1 AND app_id = $2 ORDER BY created_at"
    ))
    .bind(session_id)
    .bind(app_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(memory_from_tuple).collect())
}

pub async fn memory_for_installation(
    pool: &PgPool,
    installation_id: &str,
    app_id: i64,
) -> Result<Vec<MemoryUsageRow>, PostgresError> {
    let rows = sqlx::query_as::<_, MemoryTuple>(&format!(
        "SELECT {MEMORY_COLUMNS} FROM memory_usage WHERE installation_id = $1 AND app_id = $2 ORDER BY created_at"
    ))
    .bind(installation_id)
    .bind(app_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(memory_from_tuple).collect())
}
