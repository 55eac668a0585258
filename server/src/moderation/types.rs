//! Moderation Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::access::AccessError;
use crate::auth::error::ErrorResponse;
use crate::db::ProfileStatus;

/// Query parameters for the registration review listing.
#[derive(Debug, Deserialize)]
pub struct ListRegistrationsQuery {
    /// Status to filter by (default: pending).
    pub status: Option<ProfileStatus>,
}

/// Request body for banning a network origin.
#[derive(Debug, Deserialize, Validate)]
pub struct BanOriginRequest {
    /// IPv4 dotted-quad origin to ban.
    pub ip: String,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Moderation action errors.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// Actor tier insufficient for the requested action.
    #[error("Insufficient role for this action")]
    Unauthorized,

    /// Target principal or origin missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target's current status does not admit this transition.
    #[error("Cannot {action} a principal whose status is {current:?}")]
    InvalidTransition {
        action: &'static str,
        current: ProfileStatus,
    },

    /// Origin is already banned.
    #[error("This origin is already banned")]
    AlreadyBanned,

    /// Validation error.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl From<AccessError> for ModerationError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Database(e) => Self::Database(e),
            _ => Self::Unauthorized,
        }
    }
}

impl IntoResponse for ModerationError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Unauthorized => (StatusCode::FORBIDDEN, "INSUFFICIENT_ROLE"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Self::AlreadyBanned => (StatusCode::CONFLICT, "ALREADY_BANNED"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
