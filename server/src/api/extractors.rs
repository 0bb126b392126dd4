//! Body extractors and field validators for API routes
//!
//! Both extractors reject with an [`ApiError::BadRequest`], so handlers
//! see a single error type.

use std::ops::Deref;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::types::ApiError;

/// Prefix of every body parse failure
pub const PARSE_FAILED: &str = "Body could not be parsed";

/// Prefix of every body validation failure
pub const VALIDATION_FAILED: &str = "Body validation failed";

/// Validator for identifiers that must be well-formed UUIDs
pub fn validate_uuid<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(value.as_ref())
        .map(|_| ())
        .map_err(|_| ValidationError::new("uuid").with_message("must be a valid uuid".into()))
}

/// Like [`validate_uuid`] but an empty string means "absent"
pub fn validate_optional_uuid<T: AsRef<str>>(value: T) -> Result<(), ValidationError> {
    let value = value.as_ref();
    if value.is_empty() {
        return Ok(());
    }
    validate_uuid(value)
}

/// Render validation errors as `field: message` pairs, sorted by field
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate one record of a batch, naming it in the error path
pub fn validate_at<T: Validate>(value: &T, path: impl Into<String>) -> Result<(), ApiError> {
    value.validate().map_err(|e| {
        ApiError::bad_request_at(
            format!("{}: {}", VALIDATION_FAILED, format_validation_errors(&e)),
            path,
        )
    })
}

/// Path parameter extractor rejecting with a JSON 400
#[derive(Debug)]
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::bad_request(format!("Invalid path parameter: {}", rejection.body_text()))
            })?;
        Ok(Self(value))
    }
}

/// JSON body extractor without field validation.
///
/// Used by batch endpoints that validate element by element.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::bad_request(format!("{}: {}", PARSE_FAILED, rejection.body_text()))
        })?;
        Ok(Self(value))
    }
}

/// JSON body extractor with automatic validation.
///
/// Deserializes the body and validates it using the `validator` crate.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        value.validate().map_err(|e| {
            ApiError::bad_request(format!(
                "{}: {}",
                VALIDATION_FAILED,
                format_validation_errors(&e)
            ))
        })?;
        Ok(Self(value))
    }
}
