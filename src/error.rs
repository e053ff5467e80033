use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors returned by the wingman matcher
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid radius: {0} miles")]
    InvalidRadius(f64),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),

    #[error("Location required: user {0} has not set a location")]
    LocationRequired(Uuid),

    #[error("No pending match for user {0}")]
    NoPendingMatch(Uuid),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Matcher misconfigured: {0}")]
    Misconfigured(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl MatchError {
    /// Short machine-readable code used in the JSON error body
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::InvalidRadius(_) => "invalid_radius",
            MatchError::InvalidUserId(_) => "invalid_user_id",
            MatchError::InvalidRequest(_) => "invalid_request",
            MatchError::UnknownUser(_) => "unknown_user",
            MatchError::LocationRequired(_) => "setup_incomplete",
            MatchError::NoPendingMatch(_) => "no_pending_match",
            MatchError::Conflict(_) => "conflict",
            MatchError::Misconfigured(_) => "misconfigured",
            MatchError::Storage(_) => "storage_unavailable",
        }
    }

    /// Whether the caller may retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatchError::Storage(_))
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::InvalidRadius(_)
            | MatchError::InvalidUserId(_)
            | MatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MatchError::UnknownUser(_) | MatchError::NoPendingMatch(_) => StatusCode::NOT_FOUND,
            MatchError::LocationRequired(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MatchError::Conflict(_) => StatusCode::CONFLICT,
            MatchError::Misconfigured(_) | MatchError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Storage details stay in the logs
        let message = match self {
            MatchError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                "Database unavailable, please retry".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            status_code: status.as_u16(),
            retryable: self.is_retryable(),
        })
    }
}
