//! Application endpoints (`/app/v1/apps`)

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::SessionContext;
use crate::api::auth::hierarchy::{require_app_access, require_membership};
use crate::api::extractors::{PathParam, ValidatedJson};
use crate::api::routes::teams::types::CreatedResponse;
use crate::api::types::ApiError;
use crate::data::TransactionalRepository;
use crate::utils::credentials::{generate_api_key, hash_api_key};

pub use types::{
    ApiKeyResponse, ApplicationDataDto, ApplicationDto, ApplicationResponse,
    CreateApplicationRequest, ListApplicationsResponse,
};

#[derive(Clone)]
pub struct AppsState {
    pub repository: Arc<dyn TransactionalRepository>,
    pub api_secret: Arc<[u8]>,
}

pub fn routes(repository: Arc<dyn TransactionalRepository>, api_secret: Arc<[u8]>) -> Router<()> {
    Router::new()
        .route("/", post(create_application))
        .route("/{id}", get(get_application))
        .route("/{id}/keys", post(create_api_key))
        .with_state(AppsState {
            repository,
            api_secret,
        })
}

/// Create an application in a team of the caller
#[utoipa::path(
    post,
    path = "/app/v1/apps",
    tag = "apps",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "App created", body = CreatedResponse),
        (status = 401, description = "Access denied to this team")
    ),
    security(("bearer" = []))
)]
pub async fn create_application(
    State(state): State<AppsState>,
    session: SessionContext,
    ValidatedJson(request): ValidatedJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    require_membership(
        state.repository.as_ref(),
        request.team_id,
        session.user_id,
        "Access denied to this team",
    )
    .await?;

    let id = state
        .repository
        .create_application(&request.name, request.team_id)
        .await
        .map_err(|e| ApiError::create_failed("App", e))?;

    tracing::debug!(app_id = id, team_id = request.team_id, "Application created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "App created".to_string(),
            id,
        }),
    ))
}

/// Application with its installations and sessions
#[utoipa::path(
    get,
    path = "/app/v1/apps/{id}",
    tag = "apps",
    params(("id" = i64, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application data", body = ApplicationResponse),
        (status = 401, description = "Access denied to this app"),
        (status = 404, description = "Unknown application")
    ),
    security(("bearer" = []))
)]
pub async fn get_application(
    State(state): State<AppsState>,
    session: SessionContext,
    PathParam(app_id): PathParam<i64>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let app = require_app_access(
        state.repository.as_ref(),
        app_id,
        session.user_id,
        "Access denied to this app",
    )
    .await?;

    let data = state
        .repository
        .get_application_data(app_id)
        .await
        .map_err(ApiError::from_data)?;

    Ok(Json(ApplicationResponse {
        message: "Success".to_string(),
        app: app.into(),
        app_data: data.into(),
    }))
}

/// Issue an API key; only its MAC digest is stored
#[utoipa::path(
    post,
    path = "/app/v1/apps/{id}/keys",
    tag = "apps",
    params(("id" = i64, Path, description = "Application id")),
    responses(
        (status = 201, description = "Api Key created", body = ApiKeyResponse),
        (status = 401, description = "Access denied to this app"),
        (status = 404, description = "No application found with provided id")
    ),
    security(("bearer" = []))
)]
pub async fn create_api_key(
    State(state): State<AppsState>,
    session: SessionContext,
    PathParam(app_id): PathParam<i64>,
) -> Result<(StatusCode, Json<ApiKeyResponse>), ApiError> {
    require_app_access(
        state.repository.as_ref(),
        app_id,
        session.user_id,
        "Access denied to this app",
    )
    .await?;

    let key = generate_api_key().map_err(ApiError::from_credential)?;
    state
        .repository
        .create_api_key(&hash_api_key(&key, &state.api_secret), app_id)
        .await
        .map_err(|e| ApiError::create_failed("ApiKey", e))?;

    tracing::debug!(app_id, user_id = session.user_id, "API key created");
    Ok((
        StatusCode::CREATED,
        Json(ApiKeyResponse {
            message: "Api Key created".to_string(),
            key,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{self, TEST_SECRET};
    use crate::utils::credentials::hash_api_key;

    #[tokio::test]
    async fn test_create_app_in_own_team() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let token = test_support::sign_in(repo.as_ref(), seed.user_id).await;
        let router = test_support::router(repo.clone());

        let (status, body) = test_support::send(
            &router,
            "POST",
            "/app/v1/apps",
            Some(&token),
            Some(json!({ "name": "android", "teamId": seed.team_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "App created");
        let id = body["id"].as_i64().unwrap();
        assert_eq!(repo.get_application(id).await.unwrap().unwrap().name, "android");
    }

    #[tokio::test]
    async fn test_create_app_denied_to_outsider() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let outsider = repo.create_user("mallory", "h").await.unwrap();
        let token = test_support::sign_in(repo.as_ref(), outsider).await;
        let router = test_support::router(repo.clone());

        let (status, body) = test_support::send(
            &router,
            "POST",
            "/app/v1/apps",
            Some(&token),
            Some(json!({ "name": "evil", "teamId": seed.team_id })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied to this team");
        assert_eq!(repo.get_team_applications(seed.team_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_application_data() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let token = test_support::sign_in(repo.as_ref(), seed.user_id).await;
        let router = test_support::router(repo);

        let uri = format!("/app/v1/apps/{}", seed.app_id);
        let (status, body) = test_support::send(&router, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["app"]["name"], "ios");
        assert!(body["appData"]["installations"].as_array().unwrap().is_empty());
        assert!(body["appData"]["sessions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_key_stores_only_digest() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let token = test_support::sign_in(repo.as_ref(), seed.user_id).await;
        let router = test_support::router(repo.clone());

        let uri = format!("/app/v1/apps/{}/keys", seed.app_id);
        let (status, body) = test_support::send(&router, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Api Key created");
        let key = body["key"].as_str().unwrap();

        assert!(!repo.api_key_exists(key).await.unwrap());
        let digest = hash_api_key(key, TEST_SECRET);
        assert_eq!(repo.get_app_id(&digest).await.unwrap(), seed.app_id);

        // The new key opens the ingestion routes
        let (status, _) = test_support::send(
            &router,
            "POST",
            "/api/v1/sessions",
            Some(key),
            Some(json!({
                "id": "6f1c2a52-1f7e-4b8e-9d55-0d2a4c7f6b10",
                "installationId": "b0a3f0d4-5a43-4bfa-a3a4-0f0c1d7e9a21",
                "createdAt": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_key_unknown_app() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let token = test_support::sign_in(repo.as_ref(), seed.user_id).await;
        let router = test_support::router(repo);

        let (status, body) =
            test_support::send(&router, "POST", "/app/v1/apps/999/keys", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No application found with provided id");
    }

    #[tokio::test]
    async fn test_create_key_denied_to_outsider() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let outsider = repo.create_user("mallory", "h").await.unwrap();
        let token = test_support::sign_in(repo.as_ref(), outsider).await;
        let router = test_support::router(repo);

        let uri = format!("/app/v1/apps/{}/keys", seed.app_id);
        let (status, body) = test_support::send(&router, "POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access denied to this app");
    }

    #[tokio::test]
    async fn test_non_numeric_id() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let token = test_support::sign_in(repo.as_ref(), seed.user_id).await;
        let router = test_support::router(repo);

        let (status, body) = test_support::send(&router, "GET", "/app/v1/apps/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid path parameter")
        );
    }
}
