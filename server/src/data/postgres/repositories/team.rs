//! Team and membership repository for PostgreSQL operations

use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::TeamRow;

/// Create a team and link its creator in one transaction
pub async fn create_team_with_owner(
    pool: &PgPool,
    name: &str,
    owner_id: i64,
    role: &str,
) -> Result<i64, PostgresError> {
    let mut tx = pool.begin().await?;

    let team_id: i64 = sqlx::query_scalar("INSERT INTO teams (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO team_users (team_id, user_id, role) VALUES ($1, $2, $3)")
        .bind(team_id)
        .bind(owner_id)
        .bind(role)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(team_id)
}

/// Teams the user holds any membership link to
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<TeamRow>, PostgresError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"SELECT DISTINCT t.id, t.name
           FROM teams t
           JOIN team_users tu ON tu.team_id = t.id
           WHERE tu.user_id = $1
           ORDER BY t.id"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| TeamRow { id, name })
        .collect())
}

pub async fn create_link(
    pool: &PgPool,
    team_id: i64,
    user_id: i64,
    role: &str,
) -> Result<(), PostgresError> {
    sqlx::query("INSERT INTO team_users (team_id, user_id, role) VALUES ($1, $2, $3)")
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

/// Membership is the only authorization fact; the role is not consulted
pub async fn link_exists(pool: &PgPool, team_id: i64, user_id: i64) -> Result<bool, PostgresError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM team_users WHERE team_id = $1 AND user_id = $2)",
    )
    .bind(team_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
