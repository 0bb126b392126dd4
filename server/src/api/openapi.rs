//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::routes::{apps, auth, health, ingest, teams, telemetry};
use crate::api::types::MessageResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Observe API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Telemetry collection backend"
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and health check"),
        (name = "auth", description = "Dashboard user authentication"),
        (name = "teams", description = "Team management"),
        (name = "apps", description = "Application and API key management"),
        (name = "telemetry", description = "Collected telemetry reads"),
        (name = "ingest", description = "SDK ingestion (API key)")
    ),
    paths(
        health::hello,
        health::health,
        auth::register,
        auth::sign_in,
        auth::validate,
        teams::list_teams,
        teams::create_team,
        teams::list_team_apps,
        teams::create_team_user_link,
        apps::create_application,
        apps::get_application,
        apps::create_api_key,
        telemetry::get_installation,
        telemetry::get_installation_resources,
        telemetry::get_session,
        telemetry::get_session_resources,
        ingest::create_installation,
        ingest::create_session,
        ingest::mark_session_crashed,
        ingest::create_event,
        ingest::create_trace,
        ingest::create_collection,
        ingest::create_memory_usage,
    ),
    components(schemas(
        MessageResponse,
        health::HealthResponse,
        auth::RegisterRequest,
        auth::RegisterResponse,
        auth::SignInRequest,
        auth::SessionResponse,
        teams::TeamDto,
        teams::ListTeamsResponse,
        teams::CreateTeamRequest,
        teams::CreateTeamUserLinkRequest,
        teams::CreatedResponse,
        apps::ApplicationDto,
        apps::ListApplicationsResponse,
        apps::CreateApplicationRequest,
        apps::ApplicationDataDto,
        apps::ApplicationResponse,
        apps::ApiKeyResponse,
        telemetry::InstallationResponse,
        telemetry::SessionDetailResponse,
        telemetry::Resources,
        telemetry::ResourcesResponse,
        ingest::InstallationDto,
        ingest::SessionDto,
        ingest::EventDto,
        ingest::TraceDto,
        ingest::NewMemoryUsageDto,
        ingest::MemoryUsageDto,
        ingest::CollectionDto,
    ))
)]
pub struct ApiDoc;

/// Session token scheme used by the dashboard routes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}
