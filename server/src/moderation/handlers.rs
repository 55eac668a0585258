//! Moderation handlers.
//!
//! Every handler resolves the actor's tier first and performs the
//! matrix check before touching data. Status transitions are guarded
//! in SQL by the expected current status, so a concurrent moderator
//! cannot double-apply an action.

use std::sync::OnceLock;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use regex::Regex;
use uuid::Uuid;
use validator::Validate;

use super::types::{BanOriginRequest, ListRegistrationsQuery, ModerationError};
use crate::access::role::{
    self, ensure_can_manage_second_admin, ensure_can_moderate_target,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, AppRole, BannedOrigin, Profile, ProfileStatus};

/// Dotted-quad IPv4 shape check for origin bans.
fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("valid regex"))
}

/// Load the target profile or report it missing.
async fn find_target(state: &AppState, user_id: Uuid) -> Result<Profile, ModerationError> {
    db::find_profile_by_user_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ModerationError::NotFound("principal".into()))
}

/// Apply a guarded status transition, surfacing the actual current
/// status when the transition does not apply.
async fn transition(
    state: &AppState,
    target: &Profile,
    from: ProfileStatus,
    to: ProfileStatus,
    action: &'static str,
) -> Result<Profile, ModerationError> {
    db::transition_profile_status(&state.db, target.user_id, from, to)
        .await?
        .ok_or(ModerationError::InvalidTransition {
            action,
            current: target.status,
        })
}

/// GET /api/admin/registrations
/// List profiles in the review queue (default: pending).
pub async fn list_registrations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Json<Vec<Profile>>, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if !role::can_moderate(actor_role) {
        return Err(ModerationError::Unauthorized);
    }

    let status = query.status.unwrap_or(ProfileStatus::Pending);
    let profiles = db::list_profiles_by_status(&state.db, status).await?;
    Ok(Json(profiles))
}

/// POST /api/admin/principals/{user_id}/approve
/// Approve a pending registration.
pub async fn approve_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if !role::can_moderate(actor_role) {
        return Err(ModerationError::Unauthorized);
    }

    let target = find_target(&state, user_id).await?;
    let updated = transition(
        &state,
        &target,
        ProfileStatus::Pending,
        ProfileStatus::Approved,
        "approve",
    )
    .await?;
    Ok(Json(updated))
}

/// POST /api/admin/principals/{user_id}/reject
/// Reject a pending registration.
pub async fn reject_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if !role::can_moderate(actor_role) {
        return Err(ModerationError::Unauthorized);
    }

    let target = find_target(&state, user_id).await?;
    let updated = transition(
        &state,
        &target,
        ProfileStatus::Pending,
        ProfileStatus::Rejected,
        "reject",
    )
    .await?;
    Ok(Json(updated))
}

/// POST /api/admin/principals/{user_id}/ban
/// Ban an approved principal. A second admin targeting an admin
/// receives an explicit denial.
pub async fn ban_principal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    let target_role = role::resolve_role(&state.db, user_id).await;
    ensure_can_moderate_target(actor_role, target_role)?;

    let target = find_target(&state, user_id).await?;
    let updated = transition(
        &state,
        &target,
        ProfileStatus::Approved,
        ProfileStatus::Banned,
        "ban",
    )
    .await?;
    Ok(Json(updated))
}

/// POST /api/admin/principals/{user_id}/unban
/// Lift a principal ban, restoring approved status.
pub async fn unban_principal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    let target_role = role::resolve_role(&state.db, user_id).await;
    ensure_can_moderate_target(actor_role, target_role)?;

    let target = find_target(&state, user_id).await?;
    let updated = transition(
        &state,
        &target,
        ProfileStatus::Banned,
        ProfileStatus::Approved,
        "unban",
    )
    .await?;
    Ok(Json(updated))
}

/// DELETE /api/admin/principals/{user_id}
/// Hard-delete a principal. Role assignments and view records cascade.
/// Admin only.
pub async fn delete_principal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if actor_role != crate::access::Role::Admin {
        return Err(ModerationError::Unauthorized);
    }

    if !db::delete_profile(&state.db, user_id).await? {
        return Err(ModerationError::NotFound("principal".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/principals/{user_id}/second-admin
/// Grant the second-admin role. Admin only; a principal may not hold
/// admin and second-admin concurrently.
pub async fn set_second_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    ensure_can_manage_second_admin(actor_role)?;

    find_target(&state, user_id).await?;

    let held = db::roles_for_user(&state.db, user_id).await?;
    if held.contains(&AppRole::Admin) {
        return Err(ModerationError::Validation(
            "Principal already holds the admin role".into(),
        ));
    }

    db::grant_role(&state.db, user_id, AppRole::SecondAdmin).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/admin/principals/{user_id}/second-admin
/// Revoke the second-admin role. Admin only.
pub async fn revoke_second_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    ensure_can_manage_second_admin(actor_role)?;

    if !db::revoke_role(&state.db, user_id, AppRole::SecondAdmin).await? {
        return Err(ModerationError::NotFound("role assignment".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/banned-origins
/// List banned origins, newest first.
pub async fn list_banned_origins(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<BannedOrigin>>, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if !role::can_moderate(actor_role) {
        return Err(ModerationError::Unauthorized);
    }

    let origins = db::list_banned_origins(&state.db).await?;
    Ok(Json(origins))
}

/// POST /api/admin/banned-origins
/// Ban a network origin.
pub async fn ban_origin(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<BanOriginRequest>,
) -> Result<(StatusCode, Json<BannedOrigin>), ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if !role::can_moderate(actor_role) {
        return Err(ModerationError::Unauthorized);
    }

    body.validate()
        .map_err(|e| ModerationError::Validation(e.to_string()))?;

    let ip = body.ip.trim();
    if !ipv4_pattern().is_match(ip) {
        return Err(ModerationError::Validation(
            "Origin must be a dotted-quad IPv4 address".into(),
        ));
    }

    let reason = body.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

    let origin = db::insert_banned_origin(&state.db, ip, reason, auth.id)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("banned_ips_ip_key") {
                    return ModerationError::AlreadyBanned;
                }
            }
            ModerationError::Database(e)
        })?;

    Ok((StatusCode::CREATED, Json(origin)))
}

/// DELETE /api/admin/banned-origins/{ip}
/// Lift an origin ban.
pub async fn unban_origin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(ip): Path<String>,
) -> Result<StatusCode, ModerationError> {
    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if !role::can_moderate(actor_role) {
        return Err(ModerationError::Unauthorized);
    }

    if !db::delete_banned_origin(&state.db, &ip).await? {
        return Err(ModerationError::NotFound("origin".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_pattern_accepts_dotted_quad() {
        assert!(ipv4_pattern().is_match("192.168.1.100"));
        assert!(ipv4_pattern().is_match("8.8.8.8"));
    }

    #[test]
    fn test_ipv4_pattern_rejects_other_shapes() {
        assert!(!ipv4_pattern().is_match("not-an-ip"));
        assert!(!ipv4_pattern().is_match("192.168.1"));
        assert!(!ipv4_pattern().is_match("2001:db8::1"));
        assert!(!ipv4_pattern().is_match(""));
    }
}
