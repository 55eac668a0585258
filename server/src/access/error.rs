//! Access Engine Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::error::ErrorResponse;

/// Errors surfaced by the access engine.
///
/// Quota exhaustion is deliberately not an error: it is a normal state
/// expressed through [`super::quota::DailyAllowance`] and
/// [`super::visibility::Visibility`].
#[derive(Debug, Error)]
pub enum AccessError {
    /// Actor tier is insufficient for the requested action.
    #[error("Insufficient role for this action")]
    Unauthorized,

    /// Request origin is banned.
    #[error("Your network origin has been banned from this site")]
    OriginBanned,

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Unauthorized => (StatusCode::FORBIDDEN, "INSUFFICIENT_ROLE"),
            Self::OriginBanned => (StatusCode::FORBIDDEN, "ORIGIN_BANNED"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
