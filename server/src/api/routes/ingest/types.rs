//! Telemetry record DTOs
//!
//! The same shapes are accepted from SDKs and returned to dashboards.
//! Missing fields deserialize to their zero value and are then caught by
//! validation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{validate_optional_uuid, validate_uuid};
use crate::data::types::{
    EventRow, InstallationRow, MemoryUsageRow, SessionRow, TraceRow,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallationDto {
    #[validate(custom(function = "validate_uuid"))]
    pub id: String,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub sdk_version: i64,
    #[validate(length(min = 1, message = "is required"))]
    pub model: String,
    #[validate(length(min = 1, message = "is required"))]
    pub brand: String,
    #[validate(range(min = 1, message = "is required"))]
    pub created_at: i64,
}

impl InstallationDto {
    pub fn into_row(self, app_id: i64) -> InstallationRow {
        InstallationRow {
            id: self.id,
            app_id,
            sdk_version: self.sdk_version,
            model: self.model,
            brand: self.brand,
            created_at: self.created_at,
        }
    }
}

impl From<InstallationRow> for InstallationDto {
    fn from(row: InstallationRow) -> Self {
        Self {
            id: row.id,
            sdk_version: row.sdk_version,
            model: row.model,
            brand: row.brand,
            created_at: row.created_at,
        }
    }
}

/// Telemetry session as reported by an SDK
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionDto {
    #[validate(custom(function = "validate_uuid"))]
    pub id: String,
    #[validate(length(min = 1, message = "is required"))]
    pub installation_id: String,
    #[validate(range(min = 1, message = "is required"))]
    pub created_at: i64,
    pub crashed: bool,
}

impl SessionDto {
    pub fn into_row(self, app_id: i64) -> SessionRow {
        SessionRow {
            id: self.id,
            installation_id: self.installation_id,
            app_id,
            created_at: self.created_at,
            crashed: self.crashed,
        }
    }
}

impl From<SessionRow> for SessionDto {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            installation_id: row.installation_id,
            created_at: row.created_at,
            crashed: row.crashed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EventDto {
    #[validate(custom(function = "validate_uuid"))]
    pub id: String,
    #[validate(custom(function = "validate_uuid"))]
    pub session_id: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "is required"))]
    pub event_type: String,
    /// Opaque event payload, stored as sent
    pub serialized_data: String,
    #[validate(range(min = 1, message = "is required"))]
    pub created_at: i64,
}

impl EventDto {
    pub fn into_row(self, app_id: i64) -> EventRow {
        EventRow {
            id: self.id,
            session_id: self.session_id,
            app_id,
            event_type: self.event_type,
            serialized_data: self.serialized_data,
            created_at: self.created_at,
        }
    }
}

impl From<EventRow> for EventDto {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            event_type: row.event_type,
            serialized_data: row.serialized_data,
            created_at: row.created_at,
        }
    }
}

/// One span of a trace; `parentId` is empty for root spans
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceDto {
    #[validate(custom(function = "validate_uuid"))]
    pub trace_id: String,
    #[validate(custom(function = "validate_uuid"))]
    pub session_id: String,
    #[validate(custom(function = "validate_uuid"))]
    pub group_id: String,
    #[validate(custom(function = "validate_optional_uuid"))]
    pub parent_id: String,
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub status: String,
    pub error_message: String,
    pub started_at: i64,
    pub ended_at: i64,
    pub has_ended: bool,
}

impl TraceDto {
    pub fn into_row(self, app_id: i64) -> TraceRow {
        TraceRow {
            trace_id: self.trace_id,
            session_id: self.session_id,
            group_id: self.group_id,
            parent_id: Some(self.parent_id).filter(|p| !p.is_empty()),
            app_id,
            name: self.name,
            status: self.status,
            error_message: self.error_message,
            started_at: self.started_at,
            ended_at: self.ended_at,
            has_ended: self.has_ended,
        }
    }
}

impl From<TraceRow> for TraceDto {
    fn from(row: TraceRow) -> Self {
        Self {
            trace_id: row.trace_id,
            session_id: row.session_id,
            group_id: row.group_id,
            parent_id: row.parent_id.unwrap_or_default(),
            name: row.name,
            status: row.status,
            error_message: row.error_message,
            started_at: row.started_at,
            ended_at: row.ended_at,
            has_ended: row.has_ended,
        }
    }
}

/// Memory sample posted by an SDK
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct NewMemoryUsageDto {
    #[validate(custom(function = "validate_uuid"))]
    pub id: String,
    #[validate(custom(function = "validate_uuid"))]
    pub session_id: String,
    #[validate(custom(function = "validate_uuid"))]
    pub installation_id: String,
    pub free_memory: i64,
    pub used_memory: i64,
    pub max_memory: i64,
    pub total_memory: i64,
    pub available_heap_space: i64,
    pub created_at: i64,
}

impl NewMemoryUsageDto {
    pub fn into_row(self, app_id: i64) -> MemoryUsageRow {
        MemoryUsageRow {
            id: self.id,
            session_id: self.session_id,
            installation_id: self.installation_id,
            app_id,
            free_memory: self.free_memory,
            used_memory: self.used_memory,
            max_memory: self.max_memory,
            total_memory: self.total_memory,
            available_heap_space: self.available_heap_space,
            created_at: self.created_at,
        }
    }
}

/// Memory sample as returned to dashboards
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsageDto {
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

impl From<MemoryUsageRow> for MemoryUsageDto {
    fn from(row: MemoryUsageRow) -> Self {
        Self {
            id: row.id,
            session_id: row.session_id,
            installation_id: row.installation_id,
            app_id: row.app_id,
            free_memory: row.free_memory,
            used_memory: row.used_memory,
            max_memory: row.max_memory,
            total_memory: row.total_memory,
            available_heap_space: row.available_heap_space,
            created_at: row.created_at,
        }
    }
}

/// Batch accepted by `POST /api/v1/collection`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CollectionDto {
    pub session: Option<SessionDto>,
    pub events: Vec<EventDto>,
    pub traces: Vec<TraceDto>,
}
