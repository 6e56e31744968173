//! Error types for the chat service.
//!
//! Defines a unified error type that maps cleanly to HTTP responses.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::validation::SchemaError;

/// Unified error type for service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// User input failed schema validation; holds field → message.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(BTreeMap<String, String>),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body for API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, code, message, details) = match self {
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ServiceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ServiceError::Validation(errors) => {
                fields = Some(errors);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_FAILED",
                    "Submitted form is invalid".to_string(),
                    None,
                )
            }
            ServiceError::Schema(e) => {
                // A submitted field the schema does not know is a server-side bug
                tracing::error!(error = %e, "Validation schema error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCHEMA_ERROR",
                    "Form schema is misconfigured".to_string(),
                    None,
                )
            }
            ServiceError::Database(e) => {
                // Log the actual error but don't expose internals
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            ServiceError::Serialization(e) => (
                StatusCode::BAD_REQUEST,
                "SERIALIZATION_ERROR",
                "Failed to process request/response".to_string(),
                Some(e.to_string()),
            ),
            ServiceError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_unprocessable() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), "Email is required.".to_string());

        let response = ServiceError::Validation(fields).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_schema_error_is_server_side() {
        let err = ServiceError::from(SchemaError::UnknownField("nickname".to_string()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_status() {
        let response = ServiceError::NotFound("Employee 7 not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
