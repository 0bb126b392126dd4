//! Team membership checks
//!
//! Membership is flat: any link to the team, whatever its role, grants
//! every team and application scoped action.

use crate::api::types::ApiError;
use crate::data::TransactionalRepository;
use crate::data::types::ApplicationRow;

/// Fail with `denial` unless `user_id` is linked to `team_id`
pub async fn require_membership(
    repository: &dyn TransactionalRepository,
    team_id: i64,
    user_id: i64,
    denial: &str,
) -> Result<(), ApiError> {
    let allowed = repository
        .user_may_act(team_id, user_id)
        .await
        .map_err(ApiError::from_data)?;
    if !allowed {
        tracing::debug!(team_id, user_id, "Hierarchy check denied");
        return Err(ApiError::unauthorized(denial));
    }
    Ok(())
}

/// Load an application and check the user belongs to its team
pub async fn require_app_access(
    repository: &dyn TransactionalRepository,
    app_id: i64,
    user_id: i64,
    denial: &str,
) -> Result<ApplicationRow, ApiError> {
    let app = repository
        .get_application(app_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::not_found("No application found with provided id"))?;
    require_membership(repository, app.team_id, user_id, denial).await?;
    Ok(app)
}
