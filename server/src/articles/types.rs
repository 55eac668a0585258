//! Article Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::auth::error::ErrorResponse;
use crate::db::ArticleSummary;

/// Request body for publishing an article.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
    /// Publish immediately (default: true).
    pub published: Option<bool>,
}

/// Quota information attached to listings for quota-limited viewers.
#[derive(Debug, Serialize)]
pub struct QuotaStatus {
    /// The applicable daily limit.
    pub daily_limit: usize,
    /// Articles openable today. Decreases with each recorded view for
    /// authenticated viewers; for guests it is the size of the day's
    /// allow-list, which the whole day's browsing stays within, and it
    /// does not decrease.
    pub remaining: usize,
}

/// Response for the article listing.
#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleSummary>,
    /// Present only when a daily quota applies to the viewer.
    pub quota: Option<QuotaStatus>,
}

/// Response for recording a view. Quota exhaustion is reported here as
/// a normal state, never as an error status.
#[derive(Debug, Serialize)]
pub struct RecordViewResponse {
    /// Whether the viewer may render the article at all.
    pub allowed: bool,
    /// Whether a new ledger row was written.
    pub recorded: bool,
    /// Whether the view was already counted today.
    pub already_counted: bool,
    /// Views left today, when a quota applies.
    pub remaining_today: Option<usize>,
}

/// Article endpoint errors.
#[derive(Debug, Error)]
pub enum ArticleError {
    /// Article missing or not visible to this viewer at all.
    #[error("Article not found")]
    NotFound,

    /// The viewer's daily allowance does not admit this article.
    #[error("Daily article limit reached")]
    DailyLimitReached,

    /// Actor lacks the capability for this action.
    #[error("You do not have permission to do that")]
    Forbidden,

    /// Validation error.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ArticleError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, "ARTICLE_NOT_FOUND"),
            Self::DailyLimitReached => (StatusCode::FORBIDDEN, "DAILY_LIMIT_REACHED"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
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
