//! Shared API types
//!
//! Every error leaves the server as `{"message": ...}` with the matching
//! status; batch validation failures add a `"path"` naming the offending
//! record.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::DataError;
use crate::utils::credentials::CredentialError;

/// Body of every error response and of success responses without payload
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    /// No usable credential (missing, malformed, unknown or expired session)
    Unauthenticated { message: String },
    /// Credential is valid but may not perform this action
    Unauthorized { message: String },
    BadRequest {
        message: String,
        path: Option<String>,
    },
    NotFound { message: String },
    Conflict { message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            path: None,
        }
    }

    /// Bad request pointing at one record of a batch (`session`, `events[3]`)
    pub fn bad_request_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn from_data(e: DataError) -> Self {
        tracing::error!(error = %e, backend = e.backend(), "Data error");
        Self::Internal {
            message: "Database operation failed".to_string(),
        }
    }

    /// Map a failed insert: constraint violations are the caller's fault
    pub fn create_failed(what: &str, e: DataError) -> Self {
        if e.is_conflict() {
            tracing::debug!(error = %e, what, "Create rejected");
            return Self::Conflict {
                message: format!("{} could not be created: {}", what, e),
            };
        }
        Self::from_data(e)
    }

    pub fn from_credential(e: CredentialError) -> Self {
        tracing::error!(error = %e, "Credential error");
        Self::Internal {
            message: "Could not create credentials".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } | Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest {
                message,
                path: Some(path),
            } => serde_json::json!({ "message": message, "path": path }),
            Self::Unauthenticated { message }
            | Self::Unauthorized { message }
            | Self::BadRequest { message, .. }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::ServiceUnavailable { message }
            | Self::Internal { message } => serde_json::json!({ "message": message }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_with_path() {
        let (status, body) =
            body_json(ApiError::bad_request_at("Body validation failed", "events[1]")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Body validation failed");
        assert_eq!(body["path"], "events[1]");
    }

    #[tokio::test]
    async fn test_message_only_body() {
        let (status, body) = body_json(ApiError::unauthenticated("Unauthorized")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "message": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_create_failed_maps_conflict() {
        let err = ApiError::create_failed("Session", DataError::Conflict("duplicate id".into()));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Session could not be created")
        );
    }

    #[tokio::test]
    async fn test_create_failed_hides_store_errors() {
        let err = ApiError::create_failed("Event", DataError::RowCount {
            expected: 1,
            actual: 0,
        });
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Database operation failed");
    }
}
