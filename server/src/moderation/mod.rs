//! Moderation Actions
//!
//! Role-gated mutations over the data the role resolver and ban gate
//! read: registration review, principal ban/unban, second-admin
//! grant/revoke, origin bans, and principal deletion.

pub mod handlers;
pub mod types;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::api::AppState;

pub use types::*;

/// Router for moderation actions (mounted at /api/admin, behind
/// `require_auth`). Tier checks happen inside each handler because
/// admin and second-admin differ per action.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registrations", get(handlers::list_registrations))
        .route(
            "/principals/{user_id}/approve",
            post(handlers::approve_registration),
        )
        .route(
            "/principals/{user_id}/reject",
            post(handlers::reject_registration),
        )
        .route("/principals/{user_id}/ban", post(handlers::ban_principal))
        .route(
            "/principals/{user_id}/unban",
            post(handlers::unban_principal),
        )
        .route("/principals/{user_id}", delete(handlers::delete_principal))
        .route(
            "/principals/{user_id}/second-admin",
            put(handlers::set_second_admin).delete(handlers::revoke_second_admin),
        )
        .route(
            "/banned-origins",
            get(handlers::list_banned_origins).post(handlers::ban_origin),
        )
        .route("/banned-origins/{ip}", delete(handlers::unban_origin))
}
