//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::models::{
    AppRole, Article, ArticleSummary, BannedOrigin, Profile, ProfileStatus,
};

/// Log and return a database error with context.
///
/// This helper ensures all database errors are logged with relevant context
/// before being propagated, making production debugging easier.
macro_rules! db_error {
    ($query:expr) => {
        |e| {
            error!(query = $query, error = %e, "Database query failed");
            e
        }
    };
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

// ============================================================================
// Profile Queries
// ============================================================================

/// Find profile by the principal's user ID.
pub async fn find_profile_by_user_id(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Profile>> {
    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_profile_by_user_id", user_id = %user_id))
}

/// List profiles by approval status, newest first.
pub async fn list_profiles_by_status(
    pool: &PgPool,
    status: ProfileStatus,
) -> sqlx::Result<Vec<Profile>> {
    sqlx::query_as::<_, Profile>(
        "SELECT * FROM profiles WHERE status = $1 ORDER BY created_at DESC",
    )
    .bind(status)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_profiles_by_status", status = ?status))
}

/// Transition a profile's status, guarded by the expected current status.
///
/// Returns `None` when the profile does not exist or is not in the
/// expected state, so callers can distinguish an invalid transition
/// from a successful one.
pub async fn transition_profile_status(
    pool: &PgPool,
    user_id: Uuid,
    from: ProfileStatus,
    to: ProfileStatus,
) -> sqlx::Result<Option<Profile>> {
    sqlx::query_as::<_, Profile>(
        r"UPDATE profiles
           SET status = $3, updated_at = NOW()
           WHERE user_id = $1 AND status = $2
           RETURNING *",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("transition_profile_status", user_id = %user_id, from = ?from, to = ?to))
}

/// Hard-delete a profile. Role assignments and view records cascade.
pub async fn delete_profile(pool: &PgPool, user_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_profile", user_id = %user_id))?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Role Queries
// ============================================================================

/// Fetch all elevated role tags held by a principal.
pub async fn roles_for_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<AppRole>> {
    sqlx::query_scalar::<_, AppRole>("SELECT role FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(db_error!("roles_for_user", user_id = %user_id))
}

/// Grant an elevated role. Idempotent: granting an already-held role
/// is a no-op and reports `false`.
pub async fn grant_role(pool: &PgPool, user_id: Uuid, role: AppRole) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r"INSERT INTO user_roles (user_id, role)
           VALUES ($1, $2)
           ON CONFLICT (user_id, role) DO NOTHING",
    )
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await
    .map_err(db_error!("grant_role", user_id = %user_id, role = ?role))?;
    Ok(result.rows_affected() > 0)
}

/// Revoke an elevated role. Reports `false` when no row existed.
pub async fn revoke_role(pool: &PgPool, user_id: Uuid, role: AppRole) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await
        .map_err(db_error!("revoke_role", user_id = %user_id, role = ?role))?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Banned Origin Queries
// ============================================================================

/// Exact-match lookup of a banned origin. No wildcard or CIDR matching.
pub async fn find_banned_origin(pool: &PgPool, ip: &str) -> sqlx::Result<Option<BannedOrigin>> {
    sqlx::query_as::<_, BannedOrigin>("SELECT * FROM banned_ips WHERE ip = $1")
        .bind(ip)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_banned_origin", ip = %ip))
}

/// List all banned origins, newest first.
pub async fn list_banned_origins(pool: &PgPool) -> sqlx::Result<Vec<BannedOrigin>> {
    sqlx::query_as::<_, BannedOrigin>("SELECT * FROM banned_ips ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_banned_origins"))
}

/// Insert a banned origin. The unique index on `ip` surfaces duplicates
/// to the caller as a database error carrying the constraint name.
pub async fn insert_banned_origin(
    pool: &PgPool,
    ip: &str,
    reason: Option<&str>,
    banned_by: Uuid,
) -> sqlx::Result<BannedOrigin> {
    sqlx::query_as::<_, BannedOrigin>(
        r"INSERT INTO banned_ips (ip, reason, banned_by)
           VALUES ($1, $2, $3)
           RETURNING *",
    )
    .bind(ip)
    .bind(reason)
    .bind(banned_by)
    .fetch_one(pool)
    .await
}

/// Remove an origin ban. Reports `false` when the origin was not banned.
pub async fn delete_banned_origin(pool: &PgPool, ip: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM banned_ips WHERE ip = $1")
        .bind(ip)
        .execute(pool)
        .await
        .map_err(db_error!("delete_banned_origin", ip = %ip))?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Daily View Queries
// ============================================================================

/// Article IDs a principal has already viewed on the given day.
pub async fn viewed_article_ids(
    pool: &PgPool,
    user_id: Uuid,
    day: NaiveDate,
) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT article_id FROM daily_article_views WHERE user_id = $1 AND viewed_date = $2",
    )
    .bind(user_id)
    .bind(day)
    .fetch_all(pool)
    .await
    .map_err(db_error!("viewed_article_ids", user_id = %user_id, day = %day))
}

/// Record a view if absent. Idempotent by design: a concurrent or
/// repeated insert of the same (user, article, day) tuple succeeds and
/// reports `false` instead of raising a uniqueness error.
pub async fn insert_view_if_absent(
    pool: &PgPool,
    user_id: Uuid,
    article_id: Uuid,
    day: NaiveDate,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r"INSERT INTO daily_article_views (user_id, article_id, viewed_date)
           VALUES ($1, $2, $3)
           ON CONFLICT (user_id, article_id, viewed_date) DO NOTHING",
    )
    .bind(user_id)
    .bind(article_id)
    .bind(day)
    .execute(pool)
    .await
    .map_err(db_error!("insert_view_if_absent", user_id = %user_id, article_id = %article_id))?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Article Queries
// ============================================================================

/// IDs of all published articles, excluding the given set.
///
/// The exclusion list may be empty; only published articles ever
/// participate in quota sampling.
pub async fn published_article_ids_excluding(
    pool: &PgPool,
    exclude: &[Uuid],
) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM articles WHERE published = TRUE AND id <> ALL($1)",
    )
    .bind(exclude)
    .fetch_all(pool)
    .await
    .map_err(db_error!("published_article_ids_excluding"))
}

/// List published article summaries, newest first.
pub async fn list_published_articles(pool: &PgPool) -> sqlx::Result<Vec<ArticleSummary>> {
    sqlx::query_as::<_, ArticleSummary>(
        r"SELECT id, title, author_id, created_at
           FROM articles WHERE published = TRUE
           ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_published_articles"))
}

/// Find article by ID.
pub async fn find_article(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Article>> {
    sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_article", article_id = %id))
}

/// Insert a new article.
pub async fn insert_article(
    pool: &PgPool,
    title: &str,
    content: &str,
    author_id: Uuid,
    published: bool,
) -> sqlx::Result<Article> {
    sqlx::query_as::<_, Article>(
        r"INSERT INTO articles (title, content, author_id, published)
           VALUES ($1, $2, $3, $4)
           RETURNING *",
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .bind(published)
    .fetch_one(pool)
    .await
    .map_err(db_error!("insert_article", author_id = %author_id))
}

/// Delete an article. Reports `false` when it did not exist.
pub async fn delete_article(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_article", article_id = %id))?;
    Ok(result.rows_affected() > 0)
}
