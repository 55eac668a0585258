//! Article content surface.
//!
//! Exposes the access engine to readers: listing and fetching articles
//! through the visibility filter, recording views against the daily
//! quota, and the publish/delete capabilities of the role matrix.

pub mod handlers;
pub mod types;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::AppState;

pub use types::*;

/// Router for articles (mounted at /api/articles).
///
/// Read routes are guest-capable; publish and delete demand an
/// authenticated principal via the `AuthUser` extractor.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_articles))
        .route("/", post(handlers::create_article))
        .route("/{id}", get(handlers::get_article))
        .route("/{id}", delete(handlers::delete_article))
        .route("/{id}/view", post(handlers::record_view))
}
