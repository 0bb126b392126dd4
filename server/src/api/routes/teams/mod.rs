//! Team endpoints (`/app/v1/teams`)

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::SessionContext;
use crate::api::auth::hierarchy::require_membership;
use crate::api::extractors::{PathParam, ValidatedJson};
use crate::api::routes::apps::types::{ApplicationDto, ListApplicationsResponse};
use crate::api::types::{ApiError, MessageResponse};
use crate::core::constants::TEAM_OWNER_ROLE;
use crate::data::TransactionalRepository;

pub use types::{
    CreateTeamRequest, CreateTeamUserLinkRequest, CreatedResponse, ListTeamsResponse, TeamDto,
};

#[derive(Clone)]
pub struct TeamsState {
    pub repository: Arc<dyn TransactionalRepository>,
}

pub fn routes(repository: Arc<dyn TransactionalRepository>) -> Router<()> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/{id}/apps", get(list_team_apps))
        .route("/{id}/users", post(create_team_user_link))
        .with_state(TeamsState { repository })
}

/// List the teams of the signed-in user
#[utoipa::path(
    get,
    path = "/app/v1/teams",
    tag = "teams",
    responses((status = 200, description = "Teams of the user", body = ListTeamsResponse)),
    security(("bearer" = []))
)]
pub async fn list_teams(
    State(state): State<TeamsState>,
    session: SessionContext,
) -> Result<Json<ListTeamsResponse>, ApiError> {
    let teams = state
        .repository
        .get_teams_for_user(session.user_id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(ListTeamsResponse {
        message: "Success".to_string(),
        teams: teams.into_iter().map(TeamDto::from).collect(),
    }))
}

/// Create a team owned by the signed-in user
#[utoipa::path(
    post,
    path = "/app/v1/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = CreatedResponse),
        (status = 400, description = "Invalid body")
    ),
    security(("bearer" = []))
)]
pub async fn create_team(
    State(state): State<TeamsState>,
    session: SessionContext,
    ValidatedJson(request): ValidatedJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state
        .repository
        .create_team_with_owner(&request.name, session.user_id, TEAM_OWNER_ROLE)
        .await
        .map_err(|e| ApiError::create_failed("Team", e))?;

    tracing::debug!(team_id = id, user_id = session.user_id, "Team created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Team created".to_string(),
            id,
        }),
    ))
}

/// List the applications of a team
#[utoipa::path(
    get,
    path = "/app/v1/teams/{id}/apps",
    tag = "teams",
    params(("id" = i64, Path, description = "Team id")),
    responses(
        (status = 200, description = "Applications of the team", body = ListApplicationsResponse),
        (status = 401, description = "Access denied")
    ),
    security(("bearer" = []))
)]
pub async fn list_team_apps(
    State(state): State<TeamsState>,
    session: SessionContext,
    PathParam(team_id): PathParam<i64>,
) -> Result<Json<ListApplicationsResponse>, ApiError> {
    require_membership(
        state.repository.as_ref(),
        team_id,
        session.user_id,
        "Access denied",
    )
    .await?;

    let apps = state
        .repository
        .get_team_applications(team_id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(ListApplicationsResponse {
        message: "Success".to_string(),
        apps: apps.into_iter().map(ApplicationDto::from).collect(),
    }))
}

/// Add a user to a team the caller already belongs to
#[utoipa::path(
    post,
    path = "/app/v1/teams/{id}/users",
    tag = "teams",
    params(("id" = i64, Path, description = "Team id")),
    request_body = CreateTeamUserLinkRequest,
    responses(
        (status = 201, description = "Link created", body = MessageResponse),
        (status = 401, description = "Access denied"),
        (status = 409, description = "User already linked")
    ),
    security(("bearer" = []))
)]
pub async fn create_team_user_link(
    State(state): State<TeamsState>,
    session: SessionContext,
    PathParam(team_id): PathParam<i64>,
    ValidatedJson(request): ValidatedJson<CreateTeamUserLinkRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    require_membership(
        state.repository.as_ref(),
        team_id,
        session.user_id,
        "Access denied",
    )
    .await?;

    state
        .repository
        .create_team_user_link(team_id, request.user_id, &request.role)
        .await
        .map_err(|e| ApiError::create_failed("Link", e))?;

    tracing::debug!(team_id, user_id = request.user_id, role = %request.role, "Team link created");
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Link created"))))
}
