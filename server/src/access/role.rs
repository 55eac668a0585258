//! Role resolution and capability checks.
//!
//! A principal resolves to exactly one tier via a strict precedence
//! chain: admin role row, then second-admin role row, then approved
//! profile status, then regular user. Capability checks are ordinary
//! comparisons on the ordered [`Role`] enum rather than combinations
//! of boolean flags.

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::db::{self, AppRole, ProfileStatus};

use super::error::AccessError;

/// Access tier, in ascending seniority order.
///
/// The derived `Ord` is load-bearing: capability checks compare tiers
/// directly (e.g. `role >= Role::SecondAdmin`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Anonymous visitor (no principal).
    Guest,
    /// Authenticated but not an approved editor.
    RegularUser,
    /// Approved editor: may publish, unlimited reading.
    Editor,
    /// Second admin: full moderation except over admins.
    SecondAdmin,
    /// Full admin.
    Admin,
}

impl Role {
    /// Whether this tier bypasses the daily view quota.
    #[must_use]
    pub fn is_unlimited(self) -> bool {
        self > Self::RegularUser
    }
}

/// Derive the tier from a principal's role rows and profile status.
///
/// Strict precedence: a principal that is both approved and holds
/// `second_admin` resolves to `SecondAdmin`, never both.
#[must_use]
pub fn role_from_signals(roles: &[AppRole], status: Option<ProfileStatus>) -> Role {
    if roles.contains(&AppRole::Admin) {
        return Role::Admin;
    }
    if roles.contains(&AppRole::SecondAdmin) {
        return Role::SecondAdmin;
    }
    if status == Some(ProfileStatus::Approved) {
        return Role::Editor;
    }
    Role::RegularUser
}

/// Resolve the tier of an authenticated principal.
///
/// Never errors: unknown principals resolve to the lowest authenticated
/// tier, and a backend failure degrades the same way (privilege is
/// never granted on a failed lookup).
pub async fn resolve_role(pool: &PgPool, user_id: Uuid) -> Role {
    let roles = match db::roles_for_user(pool, user_id).await {
        Ok(roles) => roles,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Role lookup failed, treating as regular user");
            return Role::RegularUser;
        }
    };

    if roles.contains(&AppRole::Admin) {
        return Role::Admin;
    }
    if roles.contains(&AppRole::SecondAdmin) {
        return Role::SecondAdmin;
    }

    let status = match db::find_profile_by_user_id(pool, user_id).await {
        Ok(profile) => profile.map(|p| p.status),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Profile lookup failed, treating as regular user");
            None
        }
    };

    role_from_signals(&roles, status)
}

/// Whether the tier may publish articles.
#[must_use]
pub fn can_publish(role: Role) -> bool {
    role >= Role::Editor
}

/// Whether the tier may invoke moderation actions at all.
#[must_use]
pub fn can_moderate(role: Role) -> bool {
    role >= Role::SecondAdmin
}

/// Whether the actor may delete a given article.
///
/// Admins delete anything; second admins delete anything not authored
/// by an admin; everyone else deletes only their own content.
#[must_use]
pub fn can_delete_article(
    actor_role: Role,
    actor_id: Uuid,
    author_id: Uuid,
    author_role: Role,
) -> bool {
    match actor_role {
        Role::Admin => true,
        Role::SecondAdmin => author_role < Role::Admin || actor_id == author_id,
        _ => actor_id == author_id,
    }
}

/// Tier-vs-tier guard for moderation targets.
///
/// A second admin may act on any tier except admin; acting on an admin
/// is an explicit denial, not a silent no-op.
pub fn ensure_can_moderate_target(actor_role: Role, target_role: Role) -> Result<(), AccessError> {
    if !can_moderate(actor_role) {
        return Err(AccessError::Unauthorized);
    }
    if actor_role == Role::SecondAdmin && target_role == Role::Admin {
        return Err(AccessError::Unauthorized);
    }
    Ok(())
}

/// Only a full admin may grant or revoke the second-admin role.
pub fn ensure_can_manage_second_admin(actor_role: Role) -> Result<(), AccessError> {
    if actor_role == Role::Admin {
        Ok(())
    } else {
        Err(AccessError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Role::Guest < Role::RegularUser);
        assert!(Role::RegularUser < Role::Editor);
        assert!(Role::Editor < Role::SecondAdmin);
        assert!(Role::SecondAdmin < Role::Admin);
    }

    #[test]
    fn test_admin_precedence_over_second_admin() {
        let roles = [AppRole::Admin, AppRole::SecondAdmin];
        assert_eq!(
            role_from_signals(&roles, Some(ProfileStatus::Approved)),
            Role::Admin
        );
    }

    #[test]
    fn test_second_admin_precedence_over_approved() {
        // Approved editor holding second_admin resolves to second admin, not both
        let roles = [AppRole::SecondAdmin];
        assert_eq!(
            role_from_signals(&roles, Some(ProfileStatus::Approved)),
            Role::SecondAdmin
        );
    }

    #[test]
    fn test_approved_profile_resolves_to_editor() {
        assert_eq!(
            role_from_signals(&[], Some(ProfileStatus::Approved)),
            Role::Editor
        );
    }

    #[test]
    fn test_non_approved_statuses_resolve_to_regular_user() {
        for status in [
            ProfileStatus::Pending,
            ProfileStatus::Rejected,
            ProfileStatus::Banned,
            ProfileStatus::User,
        ] {
            assert_eq!(role_from_signals(&[], Some(status)), Role::RegularUser);
        }
    }

    #[test]
    fn test_unknown_principal_resolves_to_lowest_tier() {
        assert_eq!(role_from_signals(&[], None), Role::RegularUser);
    }

    #[test]
    fn test_quota_bypass_per_tier() {
        assert!(!Role::Guest.is_unlimited());
        assert!(!Role::RegularUser.is_unlimited());
        assert!(Role::Editor.is_unlimited());
        assert!(Role::SecondAdmin.is_unlimited());
        assert!(Role::Admin.is_unlimited());
    }

    #[test]
    fn test_publish_capability() {
        assert!(!can_publish(Role::RegularUser));
        assert!(can_publish(Role::Editor));
        assert!(can_publish(Role::Admin));
    }

    #[test]
    fn test_admin_deletes_anything() {
        let admin = Uuid::new_v4();
        let author = Uuid::new_v4();
        assert!(can_delete_article(Role::Admin, admin, author, Role::Admin));
        assert!(can_delete_article(Role::Admin, admin, author, Role::Editor));
    }

    #[test]
    fn test_second_admin_cannot_delete_admin_article() {
        let actor = Uuid::new_v4();
        let admin_author = Uuid::new_v4();
        assert!(!can_delete_article(
            Role::SecondAdmin,
            actor,
            admin_author,
            Role::Admin
        ));
        assert!(can_delete_article(
            Role::SecondAdmin,
            actor,
            admin_author,
            Role::Editor
        ));
    }

    #[test]
    fn test_editor_deletes_own_content_only() {
        let actor = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(can_delete_article(Role::Editor, actor, actor, Role::Editor));
        assert!(!can_delete_article(Role::Editor, actor, other, Role::Editor));
    }

    #[test]
    fn test_second_admin_cannot_moderate_admin() {
        let result = ensure_can_moderate_target(Role::SecondAdmin, Role::Admin);
        assert!(matches!(result, Err(AccessError::Unauthorized)));
    }

    #[test]
    fn test_second_admin_moderates_lower_tiers() {
        assert!(ensure_can_moderate_target(Role::SecondAdmin, Role::Editor).is_ok());
        assert!(ensure_can_moderate_target(Role::SecondAdmin, Role::RegularUser).is_ok());
        assert!(ensure_can_moderate_target(Role::SecondAdmin, Role::SecondAdmin).is_ok());
    }

    #[test]
    fn test_admin_moderates_any_tier() {
        assert!(ensure_can_moderate_target(Role::Admin, Role::Admin).is_ok());
        assert!(ensure_can_moderate_target(Role::Admin, Role::SecondAdmin).is_ok());
    }

    #[test]
    fn test_editor_cannot_moderate() {
        let result = ensure_can_moderate_target(Role::Editor, Role::RegularUser);
        assert!(matches!(result, Err(AccessError::Unauthorized)));
    }

    #[test]
    fn test_only_admin_manages_second_admin() {
        assert!(ensure_can_manage_second_admin(Role::Admin).is_ok());
        assert!(matches!(
            ensure_can_manage_second_admin(Role::SecondAdmin),
            Err(AccessError::Unauthorized)
        ));
    }
}
