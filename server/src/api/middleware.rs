//! HTTP middleware (CORS, 404 handler)

use axum::extract::Request;
use axum::http::{Method, header};
use tower_http::cors::{Any, CorsLayer};

use crate::api::types::ApiError;

/// CORS layer for dashboards and SDKs served from any origin
///
/// Credentials travel in the `Authorization` header, never in cookies, so
/// no origin needs credentialed access.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ])
}

/// Handle 404 Not Found with logging
pub async fn handle_404(req: Request) -> ApiError {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404]");
    ApiError::not_found("Not Found")
}
