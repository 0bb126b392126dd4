//! Fixtures shared by the API tests

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use crate::api::server::build_router;
use crate::data::types::AuthSessionRow;
use crate::data::{SqliteService, TransactionalRepository};
use crate::utils::credentials::{generate_api_key, generate_session_token, hash_api_key};

pub const TEST_SECRET: &[u8] = b"test-secret";

pub struct Seed {
    pub user_id: i64,
    pub team_id: i64,
    pub app_id: i64,
}

pub async fn repository() -> Arc<dyn TransactionalRepository> {
    Arc::new(SqliteService::in_memory().await)
}

/// User `alice` owning team `core` with application `ios`
pub async fn seed(repo: &dyn TransactionalRepository) -> Seed {
    let user_id = repo.create_user("alice", "hash").await.unwrap();
    let team_id = repo
        .create_team_with_owner("core", user_id, "owner")
        .await
        .unwrap();
    let app_id = repo.create_application("ios", team_id).await.unwrap();
    Seed {
        user_id,
        team_id,
        app_id,
    }
}

/// Store a fresh auth session and return its token
pub async fn sign_in(repo: &dyn TransactionalRepository, user_id: i64) -> String {
    let token = generate_session_token().unwrap();
    repo.create_auth_session(&AuthSessionRow {
        id: token.clone(),
        user_id,
        expiry: i64::MAX,
    })
    .await
    .unwrap();
    token
}

/// Store a key for the app under [`TEST_SECRET`] and return its plaintext
pub async fn api_key(repo: &dyn TransactionalRepository, app_id: i64) -> String {
    let key = generate_api_key().unwrap();
    repo.create_api_key(&hash_api_key(&key, TEST_SECRET), app_id)
        .await
        .unwrap();
    key
}

pub fn router(repo: Arc<dyn TransactionalRepository>) -> Router {
    build_router(repo, Arc::from(TEST_SECRET))
}

/// Send a request and decode the JSON response (Null for empty bodies)
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
