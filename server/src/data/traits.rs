//! Repository trait for the transactional backends
//!
//! SQLite and PostgreSQL implement [`TransactionalRepository`] on their
//! `Arc`-wrapped services. Every operation the guards, the authorization
//! checks and the ingestion pipeline need goes through this trait.

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::types::{
    ApplicationData, ApplicationRow, AuthSessionRow, EventRow, InstallationRow, MemoryUsageRow,
    SessionRow, TeamRow, TraceRow, UserRow,
};

#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    // ==================== Health ====================

    async fn ping(&self) -> Result<(), DataError>;

    // ==================== Users ====================

    /// Create a user; a taken name is a `Conflict`
    async fn create_user(&self, name: &str, password_hash: &str) -> Result<i64, DataError>;

    async fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>, DataError>;

    // ==================== Teams ====================

    /// Create a team and link `owner_id` to it in one transaction
    async fn create_team_with_owner(
        &self,
        name: &str,
        owner_id: i64,
        role: &str,
    ) -> Result<i64, DataError>;

    async fn get_teams_for_user(&self, user_id: i64) -> Result<Vec<TeamRow>, DataError>;

    async fn create_team_user_link(
        &self,
        team_id: i64,
        user_id: i64,
        role: &str,
    ) -> Result<(), DataError>;

    /// True iff a membership link (any role) exists
    async fn user_may_act(&self, team_id: i64, user_id: i64) -> Result<bool, DataError>;

    // ==================== Auth Sessions ====================

    /// Replace every session of the user with the new one, atomically
    async fn create_auth_session(&self, session: &AuthSessionRow) -> Result<(), DataError>;

    async fn get_auth_session(&self, id: &str) -> Result<Option<AuthSessionRow>, DataError>;

    /// Set a new expiry and return the (unchanged) session id
    async fn extend_auth_session(&self, id: &str, expiry: i64) -> Result<String, DataError>;

    async fn delete_auth_session(&self, id: &str) -> Result<(), DataError>;

    async fn count_auth_sessions(&self, user_id: i64) -> Result<i64, DataError>;

    // ==================== Applications ====================

    async fn create_application(&self, name: &str, team_id: i64) -> Result<i64, DataError>;

    async fn get_application(&self, id: i64) -> Result<Option<ApplicationRow>, DataError>;

    async fn get_team_applications(&self, team_id: i64)
    -> Result<Vec<ApplicationRow>, DataError>;

    async fn get_application_data(&self, app_id: i64) -> Result<ApplicationData, DataError>;

    // ==================== API Keys ====================

    /// Store the hash of a new key; exactly one row must be inserted
    async fn create_api_key(&self, key_hash: &str, app_id: i64) -> Result<(), DataError>;

    async fn api_key_exists(&self, key_hash: &str) -> Result<bool, DataError>;

    async fn get_app_id(&self, key_hash: &str) -> Result<i64, DataError>;

    // ==================== Installations ====================

    async fn create_installation(&self, installation: &InstallationRow) -> Result<(), DataError>;

    async fn get_installation(&self, id: &str) -> Result<Option<InstallationRow>, DataError>;

    // ==================== Telemetry Sessions ====================

    /// Insert a telemetry session; a duplicate id is a `Conflict`
    async fn create_session(&self, session: &SessionRow) -> Result<(), DataError>;

    async fn get_session(&self, id: &str) -> Result<Option<SessionRow>, DataError>;

    /// Flag the session of `app_id` as crashed; exactly one row must change
    async fn mark_session_crashed(&self, id: &str, app_id: i64) -> Result<(), DataError>;

    // ==================== Events & Traces ====================

    async fn create_event(&self, event: &EventRow) -> Result<(), DataError>;

    async fn get_session_events(
        &self,
        session_id: &str,
        app_id: i64,
    ) -> Result<Vec<EventRow>, DataError>;

    async fn create_trace(&self, trace: &TraceRow) -> Result<(), DataError>;

    async fn get_session_traces(
        &self,
        session_id: &str,
        app_id: i64,
    ) -> Result<Vec<TraceRow>, DataError>;

    // ==================== Resources ====================

    async fn create_memory_usage(&self, usage: &MemoryUsageRow) -> Result<(), DataError>;

    async fn get_session_memory_usage(
        &self,
        session_id: &str,
        app_id: i64,
    ) -> Result<Vec<MemoryUsageRow>, DataError>;

    async fn get_installation_memory_usage(
        &self,
        installation_id: &str,
        app_id: i64,
    ) -> Result<Vec<MemoryUsageRow>, DataError>;
}
