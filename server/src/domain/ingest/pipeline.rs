//! Collection persistence
//!
//! ```text
//! request ──validate──▶ 202 Accepted
//!              │
//!              └──spawn──▶ session ──▶ events[0..n] ──▶ traces[0..m]
//! ```
//!
//! Every record is written on its own. A failed write is logged with
//! `tracing::error!` and the task moves on to the next record: no retry,
//! no rollback, no signal back to the client. The spawned task is not
//! tracked by shutdown, so records still in flight when the process exits
//! are lost.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::CollectionBatch;
use crate::data::TransactionalRepository;

/// Persists accepted collection batches in the background
#[derive(Clone)]
pub struct IngestPipeline {
    repository: Arc<dyn TransactionalRepository>,
}

impl IngestPipeline {
    pub fn new(repository: Arc<dyn TransactionalRepository>) -> Self {
        Self { repository }
    }

    /// Spawn the persistence task for `batch` and return immediately.
    ///
    /// Callers on the request path drop the handle; tests await it.
    pub fn dispatch(&self, app_id: i64, batch: CollectionBatch) -> JoinHandle<()> {
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move {
            persist(repository.as_ref(), app_id, batch).await;
        })
    }
}

async fn persist(repository: &dyn TransactionalRepository, app_id: i64, batch: CollectionBatch) {
    let total = batch.len();
    let mut failed = 0usize;

    if let Some(session) = &batch.session
        && let Err(e) = repository.create_session(session).await
    {
        failed += 1;
        tracing::error!(
            error = %e,
            app_id,
            session_id = %session.id,
            "Error creating session from collection"
        );
    }

    for event in &batch.events {
        if let Err(e) = repository.create_event(event).await {
            failed += 1;
            tracing::error!(
                error = %e,
                app_id,
                event_id = %event.id,
                session_id = %event.session_id,
                "Error creating event from collection"
            );
        }
    }

    for trace in &batch.traces {
        if let Err(e) = repository.create_trace(trace).await {
            failed += 1;
            tracing::error!(
                error = %e,
                app_id,
                trace_id = %trace.trace_id,
                session_id = %trace.session_id,
                "Error creating trace from collection"
            );
        }
    }

    tracing::debug!(app_id, total, failed, "Collection persisted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteService;
    use crate::data::types::{EventRow, SessionRow, TraceRow};

    const SESSION_ID: &str = "6f1c2a52-1f7e-4b8e-9d55-0d2a4c7f6b10";

    async fn setup() -> (Arc<dyn TransactionalRepository>, i64) {
        let repo: Arc<dyn TransactionalRepository> = Arc::new(SqliteService::in_memory().await);
        let user_id = repo.create_user("ada", "hash").await.unwrap();
        let team_id = repo
            .create_team_with_owner("core", user_id, "owner")
            .await
            .unwrap();
        let app_id = repo.create_application("ios", team_id).await.unwrap();
        (repo, app_id)
    }

    fn session(app_id: i64) -> SessionRow {
        SessionRow {
            id: SESSION_ID.to_string(),
            installation_id: "b0a3f0d4-5a43-4bfa-a3a4-0f0c1d7e9a21".to_string(),
            app_id,
            created_at: 1_700_000_000_000,
            crashed: false,
        }
    }

    fn event(app_id: i64, id: &str) -> EventRow {
        EventRow {
            id: id.to_string(),
            session_id: SESSION_ID.to_string(),
            app_id,
            event_type: "click".to_string(),
            serialized_data: "{}".to_string(),
            created_at: 1_700_000_000_001,
        }
    }

    fn trace(app_id: i64, id: &str) -> TraceRow {
        TraceRow {
            trace_id: id.to_string(),
            session_id: SESSION_ID.to_string(),
            group_id: "0d0c5b8e-7d8e-4f55-8e6e-6c0a5f0f3a11".to_string(),
            parent_id: None,
            app_id,
            name: "startup".to_string(),
            status: "ok".to_string(),
            error_message: String::new(),
            started_at: 1_700_000_000_002,
            ended_at: 1_700_000_000_010,
            has_ended: true,
        }
    }

    #[tokio::test]
    async fn test_dispatch_persists_all_records() {
        let (repo, app_id) = setup().await;
        let pipeline = IngestPipeline::new(Arc::clone(&repo));

        let batch = CollectionBatch {
            session: Some(session(app_id)),
            events: vec![
                event(app_id, "0b4f3c4e-2b0e-4b43-9a0e-1f9a8b7c6d01"),
                event(app_id, "0b4f3c4e-2b0e-4b43-9a0e-1f9a8b7c6d02"),
            ],
            traces: vec![trace(app_id, "5a0f2b1c-3d4e-4f50-8a6b-7c8d9e0f1a21")],
        };
        assert_eq!(batch.len(), 4);

        pipeline.dispatch(app_id, batch).await.unwrap();

        assert!(repo.get_session(SESSION_ID).await.unwrap().is_some());
        assert_eq!(repo.get_session_events(SESSION_ID, app_id).await.unwrap().len(), 2);
        assert_eq!(repo.get_session_traces(SESSION_ID, app_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_record_does_not_stop_the_rest() {
        let (repo, app_id) = setup().await;
        // Pre-existing session makes the batch's session insert conflict
        repo.create_session(&session(app_id)).await.unwrap();

        let pipeline = IngestPipeline::new(Arc::clone(&repo));
        let duplicate = "0b4f3c4e-2b0e-4b43-9a0e-1f9a8b7c6d03";
        let batch = CollectionBatch {
            session: Some(session(app_id)),
            events: vec![event(app_id, duplicate), event(app_id, duplicate)],
            traces: vec![trace(app_id, "5a0f2b1c-3d4e-4f50-8a6b-7c8d9e0f1a22")],
        };

        pipeline.dispatch(app_id, batch).await.unwrap();

        assert_eq!(repo.get_session_events(SESSION_ID, app_id).await.unwrap().len(), 1);
        assert_eq!(repo.get_session_traces(SESSION_ID, app_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (repo, app_id) = setup().await;
        let batch = CollectionBatch::default();
        assert!(batch.is_empty());

        IngestPipeline::new(Arc::clone(&repo))
            .dispatch(app_id, batch)
            .await
            .unwrap();
        assert!(repo.get_session(SESSION_ID).await.unwrap().is_none());
    }
}
