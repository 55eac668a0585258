//! Database Models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Profile model. One row per registered principal.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile approval status.
///
/// `User` is a plain account that never applied for editor approval;
/// the other variants track the registration-review state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Pending,
    Approved,
    Rejected,
    Banned,
    User,
}

/// Elevated role tag. Ordinary editors and regular users have no row;
/// their tier is derived from profile status instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "app_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    Admin,
    SecondAdmin,
}

/// Role assignment model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: AppRole,
    pub created_at: DateTime<Utc>,
}

/// Article model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article metadata for listing (without content for efficiency).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Banned network origin model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BannedOrigin {
    pub id: Uuid,
    pub ip: String,
    pub reason: Option<String>,
    pub banned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Daily view record. Unique per (user, article, day); rows are never
/// updated and roll out of scope as the calendar day changes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DailyViewRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub article_id: Uuid,
    pub viewed_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
