//! Team and membership repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::TeamRow;

/// Create a team and link its creator in one transaction
pub async fn create_team_with_owner(
    pool: &SqlitePool,
    name: &str,
    owner_id: i64,
    role: &str,
) -> Result<i64, SqliteError> {
    let mut tx = pool.begin().await?;

    let team_id: i64 = sqlx::query_scalar("INSERT INTO teams (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO team_users (team_id, user_id, role) VALUES (?, ?, ?)")
        .bind(team_id)
        .bind(owner_id)
        .bind(role)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(team_id)
}

/// Teams the user holds any membership link to
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<TeamRow>, SqliteError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"SELECT DISTINCT t.id, t.name
           FROM teams t
           JOIN team_users tu ON tu.team_id = t.id
           WHERE tu.user_id = ?
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
    pool: &SqlitePool,
    team_id: i64,
    user_id: i64,
    role: &str,
) -> Result<(), SqliteError> {
    sqlx::query("INSERT INTO team_users (team_id, user_id, role) VALUES (?, ?, ?)")
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

/// Membership is the only authorization fact; the role is not consulted
pub async fn link_exists(pool: &SqlitePool, team_id: i64, user_id: i64) -> Result<bool, SqliteError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM team_users WHERE team_id = ? AND user_id = ?)",
    )
    .bind(team_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::sqlite::repositories::user;

    #[tokio::test]
    async fn test_creator_becomes_member() {
        let db = SqliteService::in_memory().await;
        let alice = user::create_user(db.pool(), "alice", "h").await.unwrap();
        let bob = user::create_user(db.pool(), "bob", "h").await.unwrap();

        let team = create_team_with_owner(db.pool(), "core", alice, "owner")
            .await
            .unwrap();

        assert!(link_exists(db.pool(), team, alice).await.unwrap());
        assert!(!link_exists(db.pool(), team, bob).await.unwrap());

        let teams = list_for_user(db.pool(), alice).await.unwrap();
        assert_eq!(
            teams,
            vec![TeamRow {
                id: team,
                name: "core".into()
            }]
        );
        assert!(list_for_user(db.pool(), bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_link_grants_membership_for_any_role() {
        let db = SqliteService::in_memory().await;
        let alice = user::create_user(db.pool(), "alice", "h").await.unwrap();
        let bob = user::create_user(db.pool(), "bob", "h").await.unwrap();
        let team = create_team_with_owner(db.pool(), "core", alice, "owner")
            .await
            .unwrap();

        create_link(db.pool(), team, bob, "viewer").await.unwrap();
        assert!(link_exists(db.pool(), team, bob).await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_link_failure_rolls_back_team() {
        let db = SqliteService::in_memory().await;
        // No user 999: the FK on team_users fails and the team insert is undone
        assert!(
            create_team_with_owner(db.pool(), "ghost", 999, "owner")
                .await
                .is_err()
        );
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
