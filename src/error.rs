//! Error taxonomy for the banks service.
//!
//! Every failure is a [`BankError`]. Its [`ErrorKind`] decides the HTTP
//! status through a single table ([`ErrorKind::status_code`]); nothing else
//! in the crate maps errors to statuses.

use crate::dto::{ErrorResponse, FieldError, ValidationErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use uuid::Uuid;

pub const NOT_FOUND: &str = "Not found";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const DATA_INTEGRITY_VIOLATION: &str = "Data integrity violation";
pub const VALIDATION_ERROR: &str = "Validation error";
pub const INVALID_FORMAT_ERROR: &str = "Invalid format error";
pub const JSON_PARSE_ERROR: &str = "JSON parse error";
pub const BAD_REQUEST: &str = "Bad Request";
pub const INVALID_FIELD_TYPE: &str = "Invalid field type";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Which uniqueness rule a write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCause {
    BankName,
    BranchCode,
}

impl ConflictCause {
    pub fn description(&self) -> &'static str {
        match self {
            ConflictCause::BankName => "A bank with that name already exists",
            ConflictCause::BranchCode => "A branch with that code already exists",
        }
    }
}

/// Caller-visible outcome classes. None of them is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("Bank not found with id: {0}")]
    NotFound(Uuid),

    /// A route that does not exist
    #[error("No route for {0}")]
    NoRoute(String),

    /// A route that exists, called with a method it does not serve
    #[error("Method {method} is not supported for {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("{}", .0.description())]
    Conflict(ConflictCause),

    /// Field-level precondition failures, reported all at once
    #[error("Validation failed: {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Body or path that could not be read as the expected shape
    #[error("{message}: {details}")]
    InvalidFormat { message: String, details: String },

    #[error("Remote banks service error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BankError {
    pub fn invalid_format(message: impl Into<String>, details: impl Into<String>) -> Self {
        BankError::InvalidFormat {
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::NotFound(_) | BankError::NoRoute(_) => ErrorKind::NotFound,
            BankError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            BankError::Conflict(_) => ErrorKind::Conflict,
            BankError::Validation(_) | BankError::InvalidFormat { .. } => ErrorKind::InvalidInput,
            BankError::Upstream(_) | BankError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for BankError {
    fn into_response(self) -> Response {
        let status = self.kind().status_code();

        let body = match &self {
            BankError::Validation(errors) => {
                tracing::warn!(errors = ?errors, "{}", VALIDATION_ERROR);
                let body = ValidationErrorResponse {
                    message: VALIDATION_ERROR.to_string(),
                    errors: errors.clone(),
                };
                return (status, Json(body)).into_response();
            }
            BankError::NotFound(_) | BankError::NoRoute(_) => {
                tracing::warn!(error = %self, "{}", NOT_FOUND);
                error_body(NOT_FOUND, self.to_string())
            }
            BankError::MethodNotAllowed { .. } => {
                tracing::warn!(error = %self, "{}", METHOD_NOT_ALLOWED);
                error_body(METHOD_NOT_ALLOWED, self.to_string())
            }
            BankError::Conflict(cause) => {
                tracing::warn!(cause = ?cause, "{}: {}", DATA_INTEGRITY_VIOLATION, self);
                error_body(DATA_INTEGRITY_VIOLATION, cause.description())
            }
            BankError::InvalidFormat { message, details } => {
                tracing::warn!(details = %details, "{}", message);
                error_body(message.as_str(), details.as_str())
            }
            BankError::Upstream(e) => {
                tracing::error!(error = ?e, "Remote banks service call failed");
                error_body(
                    INTERNAL_SERVER_ERROR,
                    "The remote banks service could not be reached",
                )
            }
            BankError::Internal(e) => {
                tracing::error!(error = ?e, "{}", INTERNAL_SERVER_ERROR);
                error_body(INTERNAL_SERVER_ERROR, "An unexpected error occurred")
            }
        };

        (status, Json(body)).into_response()
    }
}

fn error_body(message: impl Into<String>, details: impl Into<String>) -> ErrorResponse {
    ErrorResponse {
        message: message.into(),
        details: details.into(),
    }
}
