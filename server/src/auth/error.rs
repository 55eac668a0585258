//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while resolving the requesting principal.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token named a principal with no profile row.
    #[error("User not found")]
    UserNotFound,

    /// Token failed signature or claim validation.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token was valid once but its expiry has passed.
    #[error("Token expired")]
    TokenExpired,

    /// No Authorization header on a route that demands one.
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// Authorization header present but not a Bearer scheme.
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    /// Profile lookup failed.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// JSON error body shared by every error enum in the crate.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            Self::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "MISSING_AUTH"),
            Self::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result alias for token validation and principal loading.
pub type AuthResult<T> = Result<T, AuthError>;
