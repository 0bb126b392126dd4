//! Application API types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::routes::ingest::types::{InstallationDto, SessionDto};
use crate::data::types::{ApplicationData, ApplicationRow};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDto {
    pub id: i64,
    pub name: String,
    pub team_id: i64,
}

impl From<ApplicationRow> for ApplicationDto {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            team_id: row.team_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListApplicationsResponse {
    pub message: String,
    pub apps: Vec<ApplicationDto>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "is required"))]
    pub team_id: i64,
}

/// Installations and telemetry sessions collected for an application
#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationDataDto {
    pub installations: Vec<InstallationDto>,
    pub sessions: Vec<SessionDto>,
}

impl From<ApplicationData> for ApplicationDataDto {
    fn from(data: ApplicationData) -> Self {
        Self {
            installations: data.installations.into_iter().map(Into::into).collect(),
            sessions: data.sessions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub message: String,
    pub app: ApplicationDto,
    pub app_data: ApplicationDataDto,
}

/// Plaintext of a new API key; it is not retrievable afterwards
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyResponse {
    pub message: String,
    pub key: String,
}
