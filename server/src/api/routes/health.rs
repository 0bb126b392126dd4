//! Liveness and health check endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::types::MessageResponse;
use crate::data::TransactionalRepository;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Clone)]
pub struct HealthState {
    pub repository: Arc<dyn TransactionalRepository>,
}

pub fn routes(repository: Arc<dyn TransactionalRepository>) -> Router<()> {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health))
        .with_state(HealthState { repository })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Greeting", body = MessageResponse))
)]
pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse::new("Hello World"))
}

/// Health check endpoint (pings the store)
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    match state.repository.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                message: "It's healthy",
                status: "up",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, backend = e.backend(), "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    message: "Store unreachable",
                    status: "down",
                }),
            )
        }
    }
}
