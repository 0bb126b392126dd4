//! Dashboard reads of collected telemetry (`/app/v1`)
//!
//! Installations and sessions are resolved to their application first; the
//! caller must belong to the owning team.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::auth::SessionContext;
use crate::api::auth::hierarchy::require_membership;
use crate::api::extractors::PathParam;
use crate::api::routes::ingest::types::{
    EventDto, InstallationDto, MemoryUsageDto, SessionDto, TraceDto,
};
use crate::api::types::ApiError;
use crate::data::TransactionalRepository;
use crate::data::types::{InstallationRow, MemoryUsageRow, SessionRow};

#[derive(Debug, Serialize, ToSchema)]
pub struct InstallationResponse {
    pub message: String,
    pub installation: InstallationDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDetailResponse {
    pub message: String,
    pub session: SessionDto,
    pub events: Vec<EventDto>,
    pub traces: Vec<TraceDto>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub memory_usage: Vec<MemoryUsageDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResourcesResponse {
    pub message: String,
    pub resources: Resources,
}

impl ResourcesResponse {
    fn new(samples: Vec<MemoryUsageRow>) -> Self {
        Self {
            message: "Success".to_string(),
            resources: Resources {
                memory_usage: samples.into_iter().map(MemoryUsageDto::from).collect(),
            },
        }
    }
}

#[derive(Clone)]
pub struct TelemetryState {
    pub repository: Arc<dyn TransactionalRepository>,
}

pub fn routes(repository: Arc<dyn TransactionalRepository>) -> Router<()> {
    Router::new()
        .route("/installations/{id}", get(get_installation))
        .route(
            "/installations/{id}/resources",
            get(get_installation_resources),
        )
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/resources", get(get_session_resources))
        .with_state(TelemetryState { repository })
}

const UNKNOWN_INSTALLATION: &str = "Unknown installation id";
const UNKNOWN_SESSION: &str = "Unknown session id";

/// Load an installation the user may see; unknown ids and orphaned rows are
/// both reported as unknown
async fn authorized_installation(
    repository: &dyn TransactionalRepository,
    id: &str,
    user_id: i64,
    denial: &str,
) -> Result<InstallationRow, ApiError> {
    let installation = repository
        .get_installation(id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::bad_request(UNKNOWN_INSTALLATION))?;
    let app = repository
        .get_application(installation.app_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::bad_request(UNKNOWN_INSTALLATION))?;
    require_membership(repository, app.team_id, user_id, denial).await?;
    Ok(installation)
}

async fn authorized_session(
    repository: &dyn TransactionalRepository,
    id: &str,
    user_id: i64,
    denial: &str,
) -> Result<SessionRow, ApiError> {
    let session = repository
        .get_session(id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::bad_request(UNKNOWN_SESSION))?;
    let app = repository
        .get_application(session.app_id)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::bad_request(UNKNOWN_SESSION))?;
    require_membership(repository, app.team_id, user_id, denial).await?;
    Ok(session)
}

#[utoipa::path(
    get,
    path = "/app/v1/installations/{id}",
    tag = "telemetry",
    params(("id" = String, Path, description = "Installation id")),
    responses(
        (status = 200, description = "Installation", body = InstallationResponse),
        (status = 400, description = "Unknown installation id"),
        (status = 401, description = "Access denied")
    ),
    security(("bearer" = []))
)]
pub async fn get_installation(
    State(state): State<TelemetryState>,
    session: SessionContext,
    PathParam(id): PathParam<String>,
) -> Result<Json<InstallationResponse>, ApiError> {
    let installation =
        authorized_installation(state.repository.as_ref(), &id, session.user_id, "Access denied")
            .await?;

    Ok(Json(InstallationResponse {
        message: "Success".to_string(),
        installation: installation.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/app/v1/installations/{id}/resources",
    tag = "telemetry",
    params(("id" = String, Path, description = "Installation id")),
    responses(
        (status = 200, description = "Memory samples of the installation", body = ResourcesResponse),
        (status = 400, description = "Unknown installation id"),
        (status = 401, description = "Access denied")
    ),
    security(("bearer" = []))
)]
pub async fn get_installation_resources(
    State(state): State<TelemetryState>,
    session: SessionContext,
    PathParam(id): PathParam<String>,
) -> Result<Json<ResourcesResponse>, ApiError> {
    let installation =
        authorized_installation(state.repository.as_ref(), &id, session.user_id, "Access denied")
            .await?;

    let samples = state
        .repository
        .get_installation_memory_usage(&installation.id, installation.app_id)
        .await
        .map_err(ApiError::from_data)?;
    Ok(Json(ResourcesResponse::new(samples)))
}

/// Telemetry session with its events and traces
#[utoipa::path(
    get,
    path = "/app/v1/sessions/{id}",
    tag = "telemetry",
    params(("id" = String, Path, description = "Telemetry session id")),
    responses(
        (status = 200, description = "Session", body = SessionDetailResponse),
        (status = 400, description = "Unknown session id"),
        (status = 401, description = "Access denied")
    ),
    security(("bearer" = []))
)]
pub async fn get_session(
    State(state): State<TelemetryState>,
    auth: SessionContext,
    PathParam(id): PathParam<String>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let session =
        authorized_session(state.repository.as_ref(), &id, auth.user_id, "Access denied").await?;

    let (events, traces) = tokio::try_join!(
        state.repository.get_session_events(&session.id, session.app_id),
        state.repository.get_session_traces(&session.id, session.app_id),
    )
    .map_err(ApiError::from_data)?;

    Ok(Json(SessionDetailResponse {
        message: "Success".to_string(),
        session: session.into(),
        events: events.into_iter().map(EventDto::from).collect(),
        traces: traces.into_iter().map(TraceDto::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/app/v1/sessions/{id}/resources",
    tag = "telemetry",
    params(("id" = String, Path, description = "Telemetry session id")),
    responses(
        (status = 200, description = "Memory samples of the session", body = ResourcesResponse),
        (status = 400, description = "Unknown session id"),
        (status = 401, description = "Access denied to this app")
    ),
    security(("bearer" = []))
)]
pub async fn get_session_resources(
    State(state): State<TelemetryState>,
    auth: SessionContext,
    PathParam(id): PathParam<String>,
) -> Result<Json<ResourcesResponse>, ApiError> {
    let session = authorized_session(
        state.repository.as_ref(),
        &id,
        auth.user_id,
        "Access denied to this app",
    )
    .await?;

    let samples = state
        .repository
        .get_session_memory_usage(&session.id, session.app_id)
        .await
        .map_err(ApiError::from_data)?;
    Ok(Json(ResourcesResponse::new(samples)))
}
