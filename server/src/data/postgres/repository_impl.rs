//! TransactionalRepository trait implementation for PostgreSQL

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::error::DataError;
use crate::data::traits::TransactionalRepository;
use crate::data::types::{
    ApplicationData, ApplicationRow, AuthSessionRow, EventRow, InstallationRow, MemoryUsageRow,
    SessionRow, TeamRow, TraceRow, UserRow,
};

use super::PostgresService;
use super::repositories::{api_key, application, auth_session, team, telemetry, user};

#[async_trait]
impl TransactionalRepository for Arc<PostgresService> {
    async fn ping(&self) -> Result<(), DataError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(DataError::Postgres)
    }

    // ==================== Users ====================

    async fn create_user(&self, name: &str, password_hash: &str) -> Result<i64, DataError> {
        user::create_user(self.pool(), name, password_hash)
            .await
            .map_err(Into::into)
    }

    async fn get_user_by_name(&self, name: &str) -> Result<Option<UserRow>, DataError> {
        user::get_by_name(self.pool(), name)
            .await
            .map_err(Into::into)
    }

    // ==================== Teams ====================

    async fn create_team_with_owner(
        &self,
        name: &str,
        owner_id: i64,
        role: &str,
    ) -> Result<i64, DataError> {
        team::create_team_with_owner(self.pool(), name, owner_id, role)
            .await
            .map_err(Into::into)
    }

    async fn get_teams_for_user(&self, user_id: i64) -> Result<Vec<TeamRow>, DataError> {
        team::list_for_user(self.pool(), user_id)
            .await
            .map_err(Into::into)
    }

    async fn create_team_user_link(
        &self,
        team_id: i64,
        user_id: i64,
        role: &str,
    ) -> Result<(), DataError> {
        team::create_link(self.pool(), team_id, user_id, role)
            .await
            .map_err(Into::into)
    }

    async fn user_may_act(&self, team_id: i64, user_id: i64) -> Result<bool, DataError> {
        team::link_exists(self.pool(), team_id, user_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Auth Sessions ====================

    async fn create_auth_session(&self, session: &AuthSessionRow) -> Result<(), DataError> {
        auth_session::create_session(self.pool(), session)
            .await
            .map_err(Into::into)
    }

    async fn get_auth_session(&self, id: &str) -> Result<Option<AuthSessionRow>, DataError> {
        auth_session::get_session(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn extend_auth_session(&self, id: &str, expiry: i64) -> Result<String, DataError> {
        auth_session::extend_session(self.pool(), id, expiry)
            .await
            .map_err(Into::into)
    }

    async fn delete_auth_session(&self, id: &str) -> Result<(), DataError> {
        auth_session::delete_session(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn count_auth_sessions(&self, user_id: i64) -> Result<i64, DataError> {
        auth_session::count_for_user(self.pool(), user_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Applications ====================

    async fn create_application(&self, name: &str, team_id: i64) -> Result<i64, DataError> {
        application::create_application(self.pool(), name, team_id)
            .await
            .map_err(Into::into)
    }

    async fn get_application(&self, id: i64) -> Result<Option<ApplicationRow>, DataError> {
        application::get_application(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn get_team_applications(
        &self,
        team_id: i64,
    ) -> Result<Vec<ApplicationRow>, DataError> {
        application::list_for_team(self.pool(), team_id)
            .await
            .map_err(Into::into)
    }

    async fn get_application_data(&self, app_id: i64) -> Result<ApplicationData, DataError> {
        application::get_data(self.pool(), app_id)
            .await
            .map_err(Into::into)
    }

    // ==================== API Keys ====================

    async fn create_api_key(&self, key_hash: &str, app_id: i64) -> Result<(), DataError> {
        api_key::create_api_key(self.pool(), key_hash, app_id)
            .await
            .map_err(Into::into)
    }

    async fn api_key_exists(&self, key_hash: &str) -> Result<bool, DataError> {
        api_key::key_exists(self.pool(), key_hash)
            .await
            .map_err(Into::into)
    }

    async fn get_app_id(&self, key_hash: &str) -> Result<i64, DataError> {
        api_key::get_app_id(self.pool(), key_hash)
            .await
            .map_err(Into::into)
    }

    // ==================== Installations ====================

    async fn create_installation(&self, installation: &InstallationRow) -> Result<(), DataError> {
        telemetry::create_installation(self.pool(), installation)
            .await
            .map_err(Into::into)
    }

    async fn get_installation(&self, id: &str) -> Result<Option<InstallationRow>, DataError> {
        telemetry::get_installation(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    // ==================== Telemetry Sessions ====================

    async fn create_session(&self, session: &SessionRow) -> Result<(), DataError> {
        telemetry::create_session(self.pool(), session)
            .await
            .map_err(Into::into)
    }

    async fn get_session(&self, id: &str) -> Result<Option<SessionRow>, DataError> {
        telemetry::get_session(self.pool(), id)
            .await
            .map_err(Into::into)
    }

    async fn mark_session_crashed(&self, id: &str, app_id: i64) -> Result<(), DataError> {
        telemetry::mark_session_crashed(self.pool(), id, app_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Events & Traces ====================

    async fn create_event(&self, event: &EventRow) -> Result<(), DataError> {
        telemetry::create_event(self.pool(), event)
            .await
            .map_err(Into::into)
    }

    async fn get_session_events(
        &self,
        session_id: &str,
        app_id: i64,
    ) -> Result<Vec<EventRow>, DataError> {
        telemetry::list_events(self.pool(), session_id, app_id)
            .await
            .map_err(Into::into)
    }

    async fn create_trace(&self, trace: &TraceRow) -> Result<(), DataError> {
        telemetry::create_trace(self.pool(), trace)
            .await
            .map_err(Into::into)
    }

    async fn get_session_traces(
        &self,
        session_id: &str,
        app_id: i64,
    ) -> Result<Vec<TraceRow>, DataError> {
        telemetry::list_traces(self.pool(), session_id, app_id)
            .await
            .map_err(Into::into)
    }

    // ==================== Resources ====================

    async fn create_memory_usage(&self, usage: &MemoryUsageRow) -> Result<(), DataError> {
        telemetry::create_memory_usage(self.pool(), usage)
            .await
            .map_err(Into::into)
    }

    async fn get_session_memory_usage(
        &self,
        session_id: &str,
        app_id: i64,
    ) -> Result<Vec<MemoryUsageRow>, DataError> {
        telemetry::memory_for_session(self.pool(), session_id, app_id)
            .await
            .map_err(Into::into)
    }

    async fn get_installation_memory_usage(
        &self,
        installation_id: &str,
        app_id: i64,
    ) -> Result<Vec<MemoryUsageRow>, DataError> {
        telemetry::memory_for_installation(self.pool(), installation_id, app_id)
            .await
            .map_err(Into::into)
    }
}
