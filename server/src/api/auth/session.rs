//! Session guard for dashboard routes

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use super::context::SessionContext;
use crate::api::types::ApiError;
use crate::data::TransactionalRepository;
use crate::utils::credentials::constant_time_eq;

const BEARER_PREFIX: &str = "Bearer ";

/// Shared state for the session guard
#[derive(Clone)]
pub struct SessionAuthState {
    pub repository: Arc<dyn TransactionalRepository>,
}

/// Resolve the session named by the `Authorization` header.
///
/// An expired session is deleted before the request is rejected. Sessions
/// are never extended here.
pub async fn authenticate_session(
    repository: &dyn TransactionalRepository,
    headers: &HeaderMap,
    now_ms: i64,
) -> Result<SessionContext, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthenticated("Unauthorized"))?
        .to_str()
        .map_err(|_| ApiError::unauthenticated("Unauthorized"))?;

    let token = value.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        ApiError::unauthenticated("Invalid Authorization header. Expected prefix \"Bearer\"")
    })?;

    let session = repository
        .get_auth_session(token)
        .await
        .map_err(ApiError::from_data)?
        .filter(|s| constant_time_eq(&s.id, token))
        .ok_or_else(|| ApiError::unauthenticated("Unauthorized"))?;

    if now_ms >= session.expiry {
        if let Err(e) = repository.delete_auth_session(&session.id).await {
            tracing::warn!(user_id = session.user_id, error = %e, "Failed to delete expired session");
        }
        tracing::debug!(user_id = session.user_id, "Rejected expired session");
        return Err(ApiError::unauthenticated("Unauthorized"));
    }

    Ok(SessionContext {
        session_id: session.id,
        user_id: session.user_id,
        expiry: session.expiry,
    })
}

/// Session authentication middleware
///
/// Injects [`SessionContext`] into request extensions.
pub async fn require_session(
    State(state): State<SessionAuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let context = authenticate_session(state.repository.as_ref(), request.headers(), now_ms).await?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support;
    use crate::data::types::AuthSessionRow;
    use axum::http::HeaderValue;

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Unauthenticated { message } => message,
            other => panic!("expected 401, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_header() {
        let repo = test_support::repository().await;
        let err = authenticate_session(repo.as_ref(), &HeaderMap::new(), 0)
            .await
            .unwrap_err();
        assert_eq!(message(err), "Unauthorized");
    }

    #[tokio::test]
    async fn test_prefix_is_required() {
        let repo = test_support::repository().await;
        let err = authenticate_session(repo.as_ref(), &bearer("token"), 0)
            .await
            .unwrap_err();
        assert_eq!(
            message(err),
            "Invalid Authorization header. Expected prefix \"Bearer\""
        );
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let repo = test_support::repository().await;
        let err = authenticate_session(repo.as_ref(), &bearer("Bearer nope"), 0)
            .await
            .unwrap_err();
        assert_eq!(message(err), "Unauthorized");
    }

    #[tokio::test]
    async fn test_valid_session_resolves() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let token = test_support::sign_in(repo.as_ref(), seed.user_id).await;

        let ctx = authenticate_session(repo.as_ref(), &bearer(&format!("Bearer {}", token)), 0)
            .await
            .unwrap();
        assert_eq!(ctx.user_id, seed.user_id);
        assert_eq!(ctx.session_id, token);
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        repo.create_auth_session(&AuthSessionRow {
            id: "stale".into(),
            user_id: seed.user_id,
            expiry: 1_000,
        })
        .await
        .unwrap();

        let err = authenticate_session(repo.as_ref(), &bearer("Bearer stale"), 1_000)
            .await
            .unwrap_err();
        assert_eq!(message(err), "Unauthorized");
        assert!(repo.get_auth_session("stale").await.unwrap().is_none());
        assert_eq!(repo.count_auth_sessions(seed.user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_session_just_before_expiry_is_valid() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        repo.create_auth_session(&AuthSessionRow {
            id: "fresh".into(),
            user_id: seed.user_id,
            expiry: 1_000,
        })
        .await
        .unwrap();

        assert!(
            authenticate_session(repo.as_ref(), &bearer("Bearer fresh"), 999)
                .await
                .is_ok()
        );
    }
}
