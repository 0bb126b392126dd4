//! API key guard for SDK ingestion routes
//!
//! Keys are looked up by their HMAC digest; the plaintext is never stored.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use super::context::AppContext;
use crate::api::types::ApiError;
use crate::data::TransactionalRepository;
use crate::utils::credentials::hash_api_key;

/// Shared state for the API key guard
#[derive(Clone)]
pub struct ApiKeyAuthState {
    pub repository: Arc<dyn TransactionalRepository>,
    /// MAC secret the stored digests were computed with
    pub api_secret: Arc<[u8]>,
}

/// Resolve the application owning the presented key.
///
/// The `Bearer ` prefix is optional here.
pub async fn authenticate_api_key(
    repository: &dyn TransactionalRepository,
    api_secret: &[u8],
    headers: &HeaderMap,
) -> Result<AppContext, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("No authorization"))?;
    let key = value.strip_prefix("Bearer ").unwrap_or(value);

    let key_hash = hash_api_key(key, api_secret);

    let exists = repository
        .api_key_exists(&key_hash)
        .await
        .map_err(ApiError::from_data)?;
    if !exists {
        return Err(ApiError::unauthorized("Invalid API key"));
    }

    let app_id = repository.get_app_id(&key_hash).await.map_err(|e| {
        tracing::error!(error = %e, "API key exists but its application could not be resolved");
        ApiError::internal("Could not get info based on api key")
    })?;

    Ok(AppContext { app_id })
}

/// API key authentication middleware
///
/// Injects [`AppContext`] into request extensions.
pub async fn require_api_key(
    State(state): State<ApiKeyAuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context =
        authenticate_api_key(state.repository.as_ref(), &state.api_secret, request.headers())
            .await?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{self, TEST_SECRET};
    use axum::http::HeaderValue;

    fn auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_missing_header_is_bad_request() {
        let repo = test_support::repository().await;
        let err = authenticate_api_key(repo.as_ref(), TEST_SECRET, &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { ref message, .. } if message == "No authorization"));
    }

    #[tokio::test]
    async fn test_prefix_is_optional() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let key = test_support::api_key(repo.as_ref(), seed.app_id).await;

        let with = authenticate_api_key(repo.as_ref(), TEST_SECRET, &auth(&format!("Bearer {}", key)))
            .await
            .unwrap();
        let without = authenticate_api_key(repo.as_ref(), TEST_SECRET, &auth(&key))
            .await
            .unwrap();
        assert_eq!(with.app_id, seed.app_id);
        assert_eq!(without.app_id, seed.app_id);
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let repo = test_support::repository().await;
        let err = authenticate_api_key(repo.as_ref(), TEST_SECRET, &auth("Bearer unknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { ref message } if message == "Invalid API key"));
    }

    #[tokio::test]
    async fn test_key_bound_to_secret() {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let key = test_support::api_key(repo.as_ref(), seed.app_id).await;

        let err = authenticate_api_key(repo.as_ref(), b"another-secret", &auth(&key))
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
