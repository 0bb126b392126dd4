//! Typed request contexts populated by the auth guards

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::types::ApiError;

/// Resolved auth session of a dashboard user
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: i64,
    /// Absolute expiry in epoch milliseconds
    pub expiry: i64,
}

/// Application owning the API key of an SDK request
#[derive(Debug, Clone, Copy)]
pub struct AppContext {
    pub app_id: i64,
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "Session context missing, guard not applied");
            ApiError::internal("Missing session")
        })
    }
}

impl<S> FromRequestParts<S> for AppContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().copied().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "App context missing, guard not applied");
            ApiError::internal("Missing app id")
        })
    }
}
