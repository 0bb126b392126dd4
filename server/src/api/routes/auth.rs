//! Dashboard user endpoints: register, sign in, session extension

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::auth::{SessionAuthState, SessionContext, require_session};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::data::TransactionalRepository;
use crate::data::types::AuthSessionRow;
use crate::utils::credentials::{generate_session_token, session_expiry};
use crate::utils::password::{hash_password, verify_password};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Session token returned by sign-in and validate
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub message: String,
    pub session_id: String,
}

#[derive(Clone)]
pub struct AuthRoutesState {
    pub repository: Arc<dyn TransactionalRepository>,
}

/// Create auth routes; only `/validate` needs a session
pub fn routes(repository: Arc<dyn TransactionalRepository>) -> Router<()> {
    let guard = SessionAuthState {
        repository: repository.clone(),
    };

    Router::new()
        .route("/validate", post(validate))
        .route_layer(from_fn_with_state(guard, require_session))
        .route("/register", post(register))
        .route("/sign-in", post(sign_in))
        .with_state(AuthRoutesState { repository })
}

/// Run a password hash off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "Password task failed");
        ApiError::internal("Password processing failed")
    })
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid body"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn register(
    State(state): State<AuthRoutesState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let password = request.password;
    let hash = blocking(move || hash_password(&password))
        .await?
        .map_err(ApiError::from_credential)?;

    let id = state
        .repository
        .create_user(&request.name, &hash)
        .await
        .map_err(|e| ApiError::create_failed("User", e))?;

    tracing::debug!(user_id = id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created".to_string(),
            id,
        }),
    ))
}

/// Verify credentials and open a session, replacing any previous one
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 201, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn sign_in(
    State(state): State<AuthRoutesState>,
    ValidatedJson(request): ValidatedJson<SignInRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let invalid = || ApiError::unauthenticated("Invalid username or password");

    let user = state
        .repository
        .get_user_by_name(&request.username)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(invalid)?;

    let password = request.password;
    let stored_hash = user.password_hash.clone();
    let valid = blocking(move || verify_password(&password, &stored_hash)).await?;
    if !valid {
        tracing::debug!(user_id = user.id, "Sign in rejected");
        return Err(invalid());
    }

    let token = generate_session_token().map_err(ApiError::from_credential)?;
    let now_ms = chrono::Utc::now().timestamp_millis();
    state
        .repository
        .create_auth_session(&AuthSessionRow {
            id: token.clone(),
            user_id: user.id,
            expiry: session_expiry(now_ms),
        })
        .await
        .map_err(ApiError::from_data)?;

    tracing::debug!(user_id = user.id, "Signed in");
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "Sign in successful".to_string(),
            session_id: token,
        }),
    ))
}

/// Push the expiry of the current session forward
#[utoipa::path(
    post,
    path = "/auth/validate",
    tag = "auth",
    responses(
        (status = 201, description = "Session extended", body = SessionResponse),
        (status = 401, description = "Missing, unknown or expired session")
    ),
    security(("bearer" = []))
)]
pub async fn validate(
    State(state): State<AuthRoutesState>,
    session: SessionContext,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let session_id = state
        .repository
        .extend_auth_session(&session.session_id, session_expiry(now_ms))
        .await
        .map_err(ApiError::from_data)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "Valid session".to_string(),
            session_id,
        }),
    ))
}
