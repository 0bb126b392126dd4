//! Team API types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::data::types::TeamRow;

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamDto {
    pub id: i64,
    pub name: String,
}

impl From<TeamRow> for TeamDto {
    fn from(row: TeamRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListTeamsResponse {
    pub message: String,
    pub teams: Vec<TeamDto>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,
}

/// Response carrying the id of a created resource
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamUserLinkRequest {
    #[validate(range(min = 1, message = "is required"))]
    pub user_id: i64,
    /// Stored with the link; not used by any access decision
    #[validate(length(min = 1, message = "is required"))]
    pub role: String,
}
