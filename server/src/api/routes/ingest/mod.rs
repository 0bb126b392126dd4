//! SDK ingestion endpoints (`/api/v1`, API key guard)
//!
//! Single-record endpoints persist synchronously. `/collection` validates
//! the whole batch, answers 202 and hands persistence to the
//! [`IngestPipeline`].

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth::AppContext;
use crate::api::extractors::{JsonBody, PathParam, ValidatedJson, validate_at};
use crate::api::types::{ApiError, MessageResponse};
use crate::data::TransactionalRepository;
use crate::domain::{CollectionBatch, IngestPipeline};

pub use types::{
    CollectionDto, EventDto, InstallationDto, MemoryUsageDto, NewMemoryUsageDto, SessionDto,
    TraceDto,
};

/// Shared state for ingestion routes
#[derive(Clone)]
pub struct IngestState {
    pub repository: Arc<dyn TransactionalRepository>,
    pub pipeline: IngestPipeline,
}

/// Create ingestion routes
pub fn routes(repository: Arc<dyn TransactionalRepository>) -> Router<()> {
    let state = IngestState {
        pipeline: IngestPipeline::new(repository.clone()),
        repository,
    };

    Router::new()
        .route("/installations", post(create_installation))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}/crash", post(mark_session_crashed))
        .route("/events", post(create_event))
        .route("/traces", post(create_trace))
        .route("/collection", post(create_collection))
        .route("/resources/memory", post(create_memory_usage))
        .with_state(state)
}

fn created(message: &str) -> (StatusCode, Json<MessageResponse>) {
    (StatusCode::CREATED, Json(MessageResponse::new(message)))
}

/// Register an SDK installation
#[utoipa::path(
    post,
    path = "/api/v1/installations",
    tag = "ingest",
    request_body = InstallationDto,
    responses(
        (status = 201, description = "Installation created", body = MessageResponse),
        (status = 400, description = "Invalid body or missing authorization"),
        (status = 401, description = "Invalid API key"),
        (status = 409, description = "Duplicate installation id")
    )
)]
pub async fn create_installation(
    State(state): State<IngestState>,
    app: AppContext,
    ValidatedJson(dto): ValidatedJson<InstallationDto>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let row = dto.into_row(app.app_id);
    state
        .repository
        .create_installation(&row)
        .await
        .map_err(|e| ApiError::create_failed("Installation", e))?;

    tracing::debug!(app_id = app.app_id, installation_id = %row.id, "Installation created");
    Ok(created("Installation created"))
}

/// Start a telemetry session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "ingest",
    request_body = SessionDto,
    responses(
        (status = 201, description = "Session created", body = MessageResponse),
        (status = 400, description = "Invalid body"),
        (status = 409, description = "Duplicate session id")
    )
)]
pub async fn create_session(
    State(state): State<IngestState>,
    app: AppContext,
    ValidatedJson(dto): ValidatedJson<SessionDto>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let row = dto.into_row(app.app_id);
    state
        .repository
        .create_session(&row)
        .await
        .map_err(|e| ApiError::create_failed("Session", e))?;

    tracing::debug!(app_id = app.app_id, session_id = %row.id, "Session created");
    Ok(created("Session created"))
}

/// Flag a session of the calling application as crashed
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/crash",
    tag = "ingest",
    params(("id" = String, Path, description = "Telemetry session id")),
    responses(
        (status = 201, description = "Session marked as crashed", body = MessageResponse),
        (status = 500, description = "No such session for this application")
    )
)]
pub async fn mark_session_crashed(
    State(state): State<IngestState>,
    app: AppContext,
    PathParam(session_id): PathParam<String>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .repository
        .mark_session_crashed(&session_id, app.app_id)
        .await
        .map_err(|e| {
            tracing::error!(app_id = app.app_id, session_id = %session_id, error = %e, "Could not mark session as crashed");
            ApiError::internal("Could not mark session as crashed")
        })?;

    Ok(created("Session marked as crashed"))
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "ingest",
    request_body = EventDto,
    responses(
        (status = 201, description = "Event created", body = MessageResponse),
        (status = 400, description = "Invalid body"),
        (status = 409, description = "Duplicate event id")
    )
)]
pub async fn create_event(
    State(state): State<IngestState>,
    app: AppContext,
    ValidatedJson(dto): ValidatedJson<EventDto>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .repository
        .create_event(&dto.into_row(app.app_id))
        .await
        .map_err(|e| ApiError::create_failed("Event", e))?;
    Ok(created("Event created"))
}

#[utoipa::path(
    post,
    path = "/api/v1/traces",
    tag = "ingest",
    request_body = TraceDto,
    responses(
        (status = 201, description = "Trace created", body = MessageResponse),
        (status = 400, description = "Invalid body"),
        (status = 409, description = "Duplicate trace id")
    )
)]
pub async fn create_trace(
    State(state): State<IngestState>,
    app: AppContext,
    ValidatedJson(dto): ValidatedJson<TraceDto>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .repository
        .create_trace(&dto.into_row(app.app_id))
        .await
        .map_err(|e| ApiError::create_failed("Trace", e))?;
    Ok(created("Trace created"))
}

/// Accept a batch of session, events and traces for background persistence.
///
/// Validation stops at the first invalid record, reported in `path`. A 202
/// means the batch was dispatched, not that it was stored.
#[utoipa::path(
    post,
    path = "/api/v1/collection",
    tag = "ingest",
    request_body = CollectionDto,
    responses(
        (status = 202, description = "Batch dispatched", body = MessageResponse),
        (status = 400, description = "Invalid record, see `path`")
    )
)]
pub async fn create_collection(
    State(state): State<IngestState>,
    app: AppContext,
    JsonBody(dto): JsonBody<CollectionDto>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    if let Some(session) = &dto.session {
        validate_at(session, "session")?;
    }
    for (i, event) in dto.events.iter().enumerate() {
        validate_at(event, format!("events[{}]", i))?;
    }
    for (i, trace) in dto.traces.iter().enumerate() {
        validate_at(trace, format!("traces[{}]", i))?;
    }

    let app_id = app.app_id;
    let batch = CollectionBatch {
        session: dto.session.map(|s| s.into_row(app_id)),
        events: dto.events.into_iter().map(|e| e.into_row(app_id)).collect(),
        traces: dto.traces.into_iter().map(|t| t.into_row(app_id)).collect(),
    };

    tracing::debug!(app_id, records = batch.len(), "Collection accepted");
    // Fire-and-forget: the handle is dropped, the task keeps running
    drop(state.pipeline.dispatch(app_id, batch));

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(
            "Creation of collection have been started",
        )),
    ))
}

/// Store an array of memory samples.
///
/// Every sample is validated before any is inserted; insertion stops at
/// the first failure.
#[utoipa::path(
    post,
    path = "/api/v1/resources/memory",
    tag = "ingest",
    request_body = Vec<NewMemoryUsageDto>,
    responses(
        (status = 201, description = "Memory usage created", body = MessageResponse),
        (status = 400, description = "Invalid sample or insert failure")
    )
)]
pub async fn create_memory_usage(
    State(state): State<IngestState>,
    app: AppContext,
    JsonBody(samples): JsonBody<Vec<NewMemoryUsageDto>>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    for (i, sample) in samples.iter().enumerate() {
        validate_at(sample, format!("[{}]", i))?;
    }

    for sample in samples {
        let row = sample.into_row(app.app_id);
        state
            .repository
            .create_memory_usage(&row)
            .await
            .map_err(|e| {
                tracing::debug!(app_id = app.app_id, error = %e, "Memory usage insert failed");
                ApiError::bad_request(format!("Memory usage could not be created: {}", e))
            })?;
    }

    Ok(created("Memory usage created"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{self, Seed};
    use crate::data::TransactionalRepository;

    const SESSION_ID: &str = "6f1c2a52-1f7e-4b8e-9d55-0d2a4c7f6b10";
    const INSTALLATION_ID: &str = "b0a3f0d4-5a43-4bfa-a3a4-0f0c1d7e9a21";

    fn event(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "sessionId": SESSION_ID,
            "type": "click",
            "serializedData": "{}",
            "createdAt": 1_700_000_000_000i64
        })
    }

    fn trace(id: &str) -> serde_json::Value {
        json!({
            "traceId": id,
            "sessionId": SESSION_ID,
            "groupId": "0e5f9a7c-2b1d-4c3e-8f6a-9b8c7d6e5f4a",
            "parentId": "",
            "name": "startup",
            "status": "ok",
            "errorMessage": "",
            "startedAt": 1,
            "endedAt": 2,
            "hasEnded": true
        })
    }

    async fn setup() -> (std::sync::Arc<dyn TransactionalRepository>, Seed, String) {
        let repo = test_support::repository().await;
        let seed = test_support::seed(repo.as_ref()).await;
        let key = test_support::api_key(repo.as_ref(), seed.app_id).await;
        (repo, seed, key)
    }

    async fn wait_for_traces(repo: &dyn TransactionalRepository, app_id: i64, expected: usize) -> usize {
        for _ in 0..50 {
            let count = repo.get_session_traces(SESSION_ID, app_id).await.unwrap().len();
            if count >= expected {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        repo.get_session_traces(SESSION_ID, app_id).await.unwrap().len()
    }

    #[tokio::test]
    async fn test_missing_key_is_bad_request() {
        let (repo, _, _) = setup().await;
        let router = test_support::router(repo);
        let (status, body) = test_support::send(&router, "POST", "/api/v1/events", None, Some(event(SESSION_ID))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No authorization");
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let (repo, _, _) = setup().await;
        let router = test_support::router(repo);
        let (status, body) = test_support::send(
            &router,
            "POST",
            "/api/v1/events",
            Some("wrong"),
            Some(event(SESSION_ID)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn test_create_installation() {
        let (repo, seed, key) = setup().await;
        let router = test_support::router(repo.clone());
        let body = json!({
            "id": INSTALLATION_ID,
            "sdkVersion": 3,
            "model": "Pixel 8",
            "brand": "Google",
            "createdAt": 1_700_000_000_000i64
        });

        let (status, resp) =
            test_support::send(&router, "POST", "/api/v1/installations", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp["message"], "Installation created");

        let stored = repo.get_installation(INSTALLATION_ID).await.unwrap().unwrap();
        assert_eq!(stored.app_id, seed.app_id);
        assert_eq!(stored.sdk_version, 3);
    }

    #[tokio::test]
    async fn test_installation_validation_message() {
        let (repo, _, key) = setup().await;
        let router = test_support::router(repo);
        let body = json!({ "id": "nope", "sdkVersion": 1, "model": "m", "brand": "b", "createdAt": 1 });
        let (status, resp) =
            test_support::send(&router, "POST", "/api/v1/installations", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Body validation failed: id: must be a valid uuid");
    }

    #[tokio::test]
    async fn test_duplicate_session_conflicts() {
        let (repo, _, key) = setup().await;
        let router = test_support::router(repo);
        let body = json!({
            "id": SESSION_ID,
            "installationId": INSTALLATION_ID,
            "createdAt": 10,
            "crashed": false
        });

        let (first, _) =
            test_support::send(&router, "POST", "/api/v1/sessions", Some(&key), Some(body.clone())).await;
        assert_eq!(first, StatusCode::CREATED);

        let (second, resp) =
            test_support::send(&router, "POST", "/api/v1/sessions", Some(&key), Some(body)).await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert!(
            resp["message"]
                .as_str()
                .unwrap()
                .starts_with("Session could not be created")
        );
    }

    #[tokio::test]
    async fn test_mark_crashed_scoped_to_app() {
        let (repo, seed, key) = setup().await;
        let router = test_support::router(repo.clone());
        let body = json!({ "id": SESSION_ID, "installationId": INSTALLATION_ID, "createdAt": 10 });
        test_support::send(&router, "POST", "/api/v1/sessions", Some(&key), Some(body)).await;

        let uri = format!("/api/v1/sessions/{}/crash", SESSION_ID);
        let (status, resp) = test_support::send(&router, "POST", &uri, Some(&key), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp["message"], "Session marked as crashed");
        assert!(repo.get_session(SESSION_ID).await.unwrap().unwrap().crashed);

        // A key of another application cannot touch this session
        let other_app = repo.create_application("android", seed.team_id).await.unwrap();
        let other_key = test_support::api_key(repo.as_ref(), other_app).await;
        let (status, resp) = test_support::send(&router, "POST", &uri, Some(&other_key), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp["message"], "Could not mark session as crashed");
    }

    #[tokio::test]
    async fn test_create_event_and_trace() {
        let (repo, seed, key) = setup().await;
        let router = test_support::router(repo.clone());

        let (status, _) = test_support::send(
            &router,
            "POST",
            "/api/v1/events",
            Some(&key),
            Some(event("11111111-1111-4111-8111-111111111111")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, resp) = test_support::send(
            &router,
            "POST",
            "/api/v1/traces",
            Some(&key),
            Some(trace("22222222-2222-4222-8222-222222222222")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp["message"], "Trace created");

        assert_eq!(repo.get_session_events(SESSION_ID, seed.app_id).await.unwrap().len(), 1);
        let traces = repo.get_session_traces(SESSION_ID, seed.app_id).await.unwrap();
        assert_eq!(traces[0].parent_id, None);
    }

    #[tokio::test]
    async fn test_collection_rejects_bad_session() {
        let (repo, _, key) = setup().await;
        let router = test_support::router(repo);
        let body = json!({
            "session": { "id": "not-a-uuid", "installationId": INSTALLATION_ID, "createdAt": 1 },
            "events": [],
            "traces": []
        });
        let (status, resp) =
            test_support::send(&router, "POST", "/api/v1/collection", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["path"], "session");
    }

    #[tokio::test]
    async fn test_collection_reports_first_bad_event() {
        let (repo, _, key) = setup().await;
        let router = test_support::router(repo);
        let mut bad = event("not-a-uuid");
        bad["type"] = json!("");
        let body = json!({
            "events": [event("11111111-1111-4111-8111-111111111111"), bad, event("also-bad")],
            "traces": [trace("bad-trace")]
        });
        let (status, resp) =
            test_support::send(&router, "POST", "/api/v1/collection", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["path"], "events[1]");
        assert!(
            resp["message"]
                .as_str()
                .unwrap()
                .starts_with("Body validation failed")
        );
    }

    #[tokio::test]
    async fn test_collection_reports_bad_trace() {
        let (repo, _, key) = setup().await;
        let router = test_support::router(repo);
        let mut bad = trace("33333333-3333-4333-8333-333333333333");
        bad["parentId"] = json!("not-a-uuid");
        let body = json!({ "traces": [trace("22222222-2222-4222-8222-222222222222"), bad] });
        let (status, resp) =
            test_support::send(&router, "POST", "/api/v1/collection", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["path"], "traces[1]");
    }

    #[tokio::test]
    async fn test_collection_with_single_trace_is_accepted_and_persisted() {
        let (repo, seed, key) = setup().await;
        let router = test_support::router(repo.clone());
        let body = json!({ "traces": [trace("22222222-2222-4222-8222-222222222222")] });

        let (status, resp) =
            test_support::send(&router, "POST", "/api/v1/collection", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(resp["message"], "Creation of collection have been started");
        assert_eq!(wait_for_traces(repo.as_ref(), seed.app_id, 1).await, 1);
    }

    #[tokio::test]
    async fn test_collection_persists_everything() {
        let (repo, seed, key) = setup().await;
        let router = test_support::router(repo.clone());
        let body = json!({
            "session": { "id": SESSION_ID, "installationId": INSTALLATION_ID, "createdAt": 1 },
            "events": [event("11111111-1111-4111-8111-111111111111")],
            "traces": [trace("22222222-2222-4222-8222-222222222222")]
        });

        let (status, _) =
            test_support::send(&router, "POST", "/api/v1/collection", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(wait_for_traces(repo.as_ref(), seed.app_id, 1).await, 1);

        let session = repo.get_session(SESSION_ID).await.unwrap().unwrap();
        assert_eq!(session.app_id, seed.app_id);
        assert_eq!(repo.get_session_events(SESSION_ID, seed.app_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_collection_unparseable_body() {
        let (repo, _, key) = setup().await;
        let router = test_support::router(repo);
        let body = json!({ "events": "not-a-list" });
        let (status, resp) =
            test_support::send(&router, "POST", "/api/v1/collection", Some(&key), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            resp["message"]
                .as_str()
                .unwrap()
                .starts_with("Body could not be parsed")
        );
    }

    #[tokio::test]
    async fn test_memory_usage_validated_before_insert() {
        let (repo, seed, key) = setup().await;
        let router = test_support::router(repo.clone());
        let good = json!({
            "id": "44444444-4444-4444-8444-444444444444",
            "sessionId": SESSION_ID,
            "installationId": INSTALLATION_ID,
            "freeMemory": 10,
            "usedMemory": 20,
            "maxMemory": 40,
            "totalMemory": 30,
            "availableHeapSpace": 5,
            "createdAt": 7
        });
        let mut bad = good.clone();
        bad["installationId"] = json!("x");

        let (status, _) = test_support::send(
            &router,
            "POST",
            "/api/v1/resources/memory",
            Some(&key),
            Some(json!([good.clone(), bad])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(repo.get_session_memory_usage(SESSION_ID, seed.app_id).await.unwrap().is_empty());

        let (status, resp) = test_support::send(
            &router,
            "POST",
            "/api/v1/resources/memory",
            Some(&key),
            Some(json!([good])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp["message"], "Memory usage created");
        assert_eq!(repo.get_session_memory_usage(SESSION_ID, seed.app_id).await.unwrap().len(), 1);
    }
}
