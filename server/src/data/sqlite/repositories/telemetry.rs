//! Telemetry repository for SQLite operations
//!
//! Installations, telemetry sessions, events, traces and memory usage
//! samples. Rows are written as reported by the SDK; no cross-row
//! validation is done here.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
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
    pool: &SqlitePool,
    row: &InstallationRow,
) -> Result<(), SqliteError> {
    sqlx::query(
        r#"INSERT INTO installations (id, app_id, sdk_version, model, brand, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
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
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<InstallationRow>, SqliteError> {
    let row = sqlx::query_as::<_, (String, i64, i64, String, String, i64)>(
        "SELECT id, app_id, sdk_version, model, brand, created_at FROM installations WHERE id = ?",
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

pub async fn create_session(pool: &SqlitePool, row: &SessionRow) -> Result<(), SqliteError> {
    sqlx::query(
        r#"INSERT INTO sessions (id, installation_id, app_id, created_at, crashed)
           VALUES (?, ?, ?, ?, ?)"#,
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

pub async fn get_session(pool: &SqlitePool, id: &str) -> Result<Option<SessionRow>, SqliteError> {
    let row = sqlx::query_as::<_, (String, String, i64, i64, bool)>(
        "SELECT id, installation_id, app_id, created_at, crashed FROM sessions WHERE id = ?",
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
    pool: &SqlitePool,
    id: &str,
    app_id: i64,
) -> Result<(), SqliteError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE sessions SET crashed = 1 WHERE id = ? AND app_id = ?")
        .bind(id)
        .bind(app_id)
        .execute(&mut *tx)
        .await?;

    SqliteError::expect_rows(1, result.rows_affected())?;
    tx.commit().await?;
    Ok(())
}

// ==================== Events ====================

pub async fn create_event(pool: &SqlitePool, row: &EventRow) -> Result<(), SqliteError> {
    sqlx::query(
        r#"INSERT INTO events (id, session_id, app_id, event_type, serialized_data, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
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
    pool: &SqlitePool,
    session_id: &str,
    app_id: i64,
) -> Result<Vec<EventRow>, SqliteError> {
    let rows = sqlx::query_as::<_, (String, String, i64, String, String, i64)>(
        r#"SELECT id, session_id, app_id, event_type, serialized_data, created_at
           FROM events WHERE session_id = ? AND app_id = ? ORDER BY created_at"#,
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

pub async fn create_trace(pool: &SqlitePool, row: &TraceRow) -> Result<(), SqliteError> {
    sqlx::query(
        r#"INSERT INTO traces (trace_id, session_id, group_id, parent_id, app_id, name, status,
                               error_message, started_at, ended_at, has_ended)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
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
    pool: &SqlitePool,
    session_id: &str,
    app_id: i64,
) -> Result<Vec<TraceRow>, SqliteError> {
    #[allow(clippy::type_complexity)]
    let rows = sqlx::query_as::<
        _,
        (String, String, String, Option<String>, i64, String, String, String, i64, i64, bool),
    >(
        r#"SELECT trace_id, session_id, group_id, parent_id, app_id, name, status,
                  error_message, started_at, ended_at, has_ended
           FROM traces WHERE session_id = ? AND app_id = ? ORDER BY started_at"#,
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

pub async fn create_memory_usage(pool: &SqlitePool, row: &MemoryUsageRow) -> Result<(), SqliteError> {
    sqlx::query(&format!(
        "INSERT INTO memory_usage ({MEMORY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
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
    pool: &SqlitePool,
    session_id: &str,
    app_id: i64,
) -> Result<Vec<MemoryUsageRow>, SqliteError> {
    let rows = sqlx::query_as::<_, MemoryTuple>(&format!(
        "SELECT {MEMORY_COLUMNS} FROM memory_usage WHERE session_id = ? AND app_id = ? ORDER BY created_at"
    ))
    .bind(session_id)
    .bind(app_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(memory_from_tuple).collect())
}

pub async fn memory_for_installation(
    pool: &SqlitePool,
    installation_id: &str,
    app_id: i64,
) -> Result<Vec<MemoryUsageRow>, SqliteError> {
    let rows = sqlx::query_as::<_, MemoryTuple>(&format!(
        "SELECT {MEMORY_COLUMNS} FROM memory_usage WHERE installation_id = ? AND app_id = ? ORDER BY created_at"
    ))
    .bind(installation_id)
    .bind(app_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(memory_from_tuple).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::sqlite::repositories::{application, team, user};

    async fn setup() -> (std::sync::Arc<SqliteService>, i64) {
        let db = SqliteService::in_memory().await;
        let uid = user::create_user(db.pool(), "alice", "h").await.unwrap();
        let t = team::create_team_with_owner(db.pool(), "one", uid, "owner")
            .await
            .unwrap();
        let app = application::create_application(db.pool(), "ios", t)
            .await
            .unwrap();
        (db, app)
    }

    fn session(id: &str, app_id: i64) -> SessionRow {
        SessionRow {
            id: id.into(),
            installation_id: "inst".into(),
            app_id,
            created_at: 1,
            crashed: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_session_conflicts() {
        let (db, app) = setup().await;
        create_session(db.pool(), &session("s1", app)).await.unwrap();
        let err = create_session(db.pool(), &session("s1", app))
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mark_crashed_scoped_to_app() {
        let (db, app) = setup().await;
        create_session(db.pool(), &session("s1", app)).await.unwrap();

        // Another application cannot flag this session
        assert!(matches!(
            mark_session_crashed(db.pool(), "s1", app + 1).await,
            Err(SqliteError::RowCount {
                expected: 1,
                actual: 0
            })
        ));
        assert!(!get_session(db.pool(), "s1").await.unwrap().unwrap().crashed);

        mark_session_crashed(db.pool(), "s1", app).await.unwrap();
        assert!(get_session(db.pool(), "s1").await.unwrap().unwrap().crashed);
    }

    #[tokio::test]
    async fn test_events_and_traces_by_session() {
        let (db, app) = setup().await;
        for (i, sid) in ["s1", "s1", "s2"].iter().enumerate() {
            create_event(
                db.pool(),
                &EventRow {
                    id: format!("e{i}"),
                    session_id: sid.to_string(),
                    app_id: app,
                    event_type: "click".into(),
                    serialized_data: "{}".into(),
                    created_at: i as i64 + 1,
                },
            )
            .await
            .unwrap();
        }
        let trace = TraceRow {
            trace_id: "t1".into(),
            session_id: "s1".into(),
            group_id: "g1".into(),
            parent_id: None,
            app_id: app,
            name: "startup".into(),
            status: "ok".into(),
            error_message: String::new(),
            started_at: 1,
            ended_at: 2,
            has_ended: true,
        };
        create_trace(db.pool(), &trace).await.unwrap();

        let events = list_events(db.pool(), "s1", app).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "e0");
        assert_eq!(list_traces(db.pool(), "s1", app).await.unwrap(), vec![trace]);
        assert!(list_traces(db.pool(), "s2", app).await.unwrap().is_empty());

        // Same session id under another application
        assert!(list_events(db.pool(), "s1", app + 1).await.unwrap().is_empty());
        assert!(list_traces(db.pool(), "s1", app + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_usage_queries() {
        let (db, app) = setup().await;
        let usage = MemoryUsageRow {
            id: "m1".into(),
            session_id: "s1".into(),
            installation_id: "i1".into(),
            app_id: app,
            free_memory: 10,
            used_memory: 20,
            max_memory: 30,
            total_memory: 40,
            available_heap_space: 50,
            created_at: 7,
        };
        create_memory_usage(db.pool(), &usage).await.unwrap();

        assert_eq!(
            memory_for_session(db.pool(), "s1", app).await.unwrap(),
            vec![usage.clone()]
        );
        assert_eq!(
            memory_for_installation(db.pool(), "i1", app).await.unwrap(),
            vec![usage]
        );
        assert!(memory_for_session(db.pool(), "nope", app).await.unwrap().is_empty());
        assert!(memory_for_installation(db.pool(), "i1", app + 1).await.unwrap().is_empty());
    }
}
