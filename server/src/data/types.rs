//! Row types shared by the transactional backends
//!
//! Telemetry rows double as insert inputs: the handler fills in the
//! resolved `app_id` and hands the row to the repository.

/// Registered dashboard user
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
}

/// Server-side proof that a user is signed in
#[derive(Debug, Clone)]
pub struct AuthSessionRow {
    pub id: String,
    pub user_id: i64,
    /// Absolute expiry in epoch milliseconds
    pub expiry: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRow {
    pub id: i64,
    pub name: String,
    pub team_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRow {
    pub id: String,
    pub app_id: i64,
    pub sdk_version: i64,
    pub model: String,
    pub brand: String,
    pub created_at: i64,
}

/// Client-reported unit of SDK activity (not an auth session)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub id: String,
    pub installation_id: String,
    pub app_id: i64,
    pub created_at: i64,
    pub crashed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub id: String,
    pub session_id: String,
    pub app_id: i64,
    pub event_type: String,
    pub serialized_data: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
    pub trace_id: String,
    pub session_id: String,
    pub group_id: String,
    pub parent_id: Option<String>,
    pub app_id: i64,
    pub name: String,
    pub status: String,
    pub error_message: String,
    pub started_at: i64,
    pub ended_at: i64,
    pub has_ended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUsageRow {
    pub id: String,
    pub session_id: String,
    pub installation_id: String,
    pub app_id: i64,
    pub free_memory: i64,
    pub used_memory: i64,
    pub max_memory: i64,
    pub total_memory: i64,
    pub available_heap_space: i64,
    pub created_at: i64,
}

/// Everything collected for one application
#[derive(Debug, Clone, Default)]
pub struct ApplicationData {
    pub installations: Vec<InstallationRow>,
    pub sessions: Vec<SessionRow>,
}
