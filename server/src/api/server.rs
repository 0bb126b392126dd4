//! API server initialization

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::auth::{ApiKeyAuthState, SessionAuthState, require_api_key, require_session};
use super::middleware;
use super::openapi::openapi_json;
use super::routes::{apps, auth, health, ingest, teams, telemetry};
use crate::core::CoreApp;
use crate::core::constants::MAX_BODY_BYTES;
use crate::data::TransactionalRepository;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Serve until shutdown is triggered; returns CoreApp for cleanup
    pub async fn start(self) -> Result<CoreApp> {
        let app = self.app;
        let shutdown = app.shutdown.clone();

        let api_secret: Arc<[u8]> = Arc::from(app.config.auth.api_secret.as_bytes());
        let router = build_router(app.database.repository(), api_secret);

        let host = app.config.server.host.as_str();
        let port = app.config.server.port;
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", host, port))?;

        tracing::info!(
            address = %listener.local_addr()?,
            backend = app.database.backend_name(),
            "Server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Assemble every route family with its guard
///
/// - `/`, `/health`, `/openapi.json`: public
/// - `/auth`: public except `/auth/validate` (session)
/// - `/app/v1`: session guard
/// - `/api/v1`: API key guard
pub fn build_router(repository: Arc<dyn TransactionalRepository>, api_secret: Arc<[u8]>) -> Router {
    let session_guard = SessionAuthState {
        repository: repository.clone(),
    };
    let api_key_guard = ApiKeyAuthState {
        repository: repository.clone(),
        api_secret: api_secret.clone(),
    };

    let dashboard_routes = Router::new()
        .nest("/teams", teams::routes(repository.clone()))
        .nest("/apps", apps::routes(repository.clone(), api_secret))
        .merge(telemetry::routes(repository.clone()))
        .layer(from_fn_with_state(session_guard, require_session));

    let ingest_routes = ingest::routes(repository.clone())
        .layer(from_fn_with_state(api_key_guard, require_api_key));

    Router::new()
        .merge(health::routes(repository.clone()))
        .route("/openapi.json", get(openapi_json))
        .nest("/auth", auth::routes(repository))
        .nest("/app/v1", dashboard_routes)
        .nest("/api/v1", ingest_routes)
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
