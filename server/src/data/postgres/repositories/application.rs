//! Application repository for PostgreSQL operations

use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::{ApplicationData, ApplicationRow, InstallationRow, SessionRow};

pub async fn create_application(
    pool: &PgPool,
    name: &str,
    team_id: i64,
) -> Result<i64, PostgresError> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO applications (name, team_id) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(team_id)
            .fetch_one(pool)
            .await?;
    Ok(id)
}

pub async fn get_application(pool: &PgPool, id: i64) -> Result<Option<ApplicationRow>, PostgresError> {
    let row = sqlx::query_as::<_, (i64, String, i64)>(
        "SELECT id, name, team_id FROM applications WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, team_id)| ApplicationRow { id, name, team_id }))
}

pub async fn list_for_team(pool: &PgPool, team_id: i64) -> Result<Vec<ApplicationRow>, PostgresError> {
    let rows = sqlx::query_as::<_, (i64, String, i64)>(
        "SELECT id, name, team_id FROM applications WHERE team_id = $1 ORDER BY id",
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, team_id)| ApplicationRow { id, name, team_id })
        .collect())
}

/// Installations and telemetry sessions collected for the application
pub async fn get_data(pool: &PgPool, app_id: i64) -> Result<ApplicationData, PostgresError> {
    let installations = sqlx::query_as::<_, (String, i64, i64, String, String, i64)>(
        r#"SELECT id, app_id, sdk_version, model, brand, created_at
           FROM installations WHERE app_id = $1 ORDER BY created_at"#,
    )
    .bind(app_id)
    .fetch_all(pool)
    .await?;

    let sessions = sqlx::query_as::<_, (String, String, i64, i64, bool)>(
        r#"SELECT id, installation_id, app_id, created_at, crashed
           FROM sessions WHERE app_id = $1 ORDER BY created_at"#,
    )
    .bind(app_id)
    .fetch_all(pool)
    .await?;

    Ok(ApplicationData {
        installations: installations
            .into_iter()
            .map(
                |(id, app_id, sdk_version, model, brand, created_at)| InstallationRow {
                    id,
                    app_id,
                    sdk_version,
                    model,
                    brand,
                    created_at,
                },
            )
            .collect(),
        sessions: sessions
            .into_iter()
            .map(
                |(id, installation_id, app_id, created_at, crashed)| SessionRow {
                    id,
                    installation_id,
                    app_id,
                    created_at,
                    crashed,
                },
            )
            .collect(),
    })
}
