//! Article handlers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use super::types::{
    ArticleError, ArticleListResponse, CreateArticleRequest, QuotaStatus, RecordViewResponse,
};
use crate::access::quota::RecordOutcome;
use crate::access::visibility::{self, server_today, Visibility};
use crate::access::{role, CookieGuestStore, Role};
use crate::api::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::db::{self, Article};

/// Header carrying the guest's local calendar date.
const CLIENT_DATE_HEADER: &str = "x-client-date";

/// Day key for the guest quota path.
///
/// The guest allowance is keyed by the visitor's local date when the
/// client supplies one; authenticated quota uses server UTC instead,
/// so the two paths can diverge near midnight.
fn guest_day(headers: &HeaderMap) -> NaiveDate {
    headers
        .get(CLIENT_DATE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or_else(server_today)
}

/// Resolve the requester into (id, role) or an anonymous guest.
async fn resolve_principal(state: &AppState, user: &MaybeUser) -> Option<(Uuid, Role)> {
    match &user.0 {
        Some(auth) => Some((auth.id, role::resolve_role(&state.db, auth.id).await)),
        None => None,
    }
}

/// GET /api/articles
/// List published articles visible to this viewer today.
pub async fn list_articles(
    State(state): State<AppState>,
    user: MaybeUser,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<ArticleListResponse>), ArticleError> {
    let articles = db::list_published_articles(&state.db).await?;

    let principal = resolve_principal(&state, &user).await;
    let mut store = CookieGuestStore::new(jar);
    let vis = visibility::resolve_visibility(
        &state.db,
        principal,
        &mut store,
        guest_day(&headers),
        state.config.guest_view_limit,
        state.config.daily_view_limit,
    )
    .await;

    let quota = match &vis {
        Visibility::Unrestricted => None,
        Visibility::Limited(allowance) => Some(QuotaStatus {
            daily_limit: state.config.daily_view_limit,
            remaining: allowance.remaining(state.config.daily_view_limit),
        }),
        Visibility::GuestList(ids) => Some(QuotaStatus {
            daily_limit: state.config.guest_view_limit,
            remaining: ids.len(),
        }),
    };

    let visible = vis.filter(articles, |a| a.id);

    Ok((
        store.into_jar(),
        Json(ArticleListResponse {
            articles: visible,
            quota,
        }),
    ))
}

/// GET /api/articles/{id}
/// Fetch a single article, subject to the viewer's daily allowance.
pub async fn get_article(
    State(state): State<AppState>,
    user: MaybeUser,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, ArticleError> {
    let article = db::find_article(&state.db, id)
        .await?
        .ok_or(ArticleError::NotFound)?;

    let principal = resolve_principal(&state, &user).await;

    // Unpublished articles are visible only to their author and to
    // moderators; to everyone else they do not exist.
    if !article.published {
        match principal {
            Some((user_id, actor_role))
                if user_id == article.author_id || actor_role >= Role::SecondAdmin =>
            {
                return Ok((jar, Json(article)).into_response());
            }
            _ => return Err(ArticleError::NotFound),
        }
    }

    let mut store = CookieGuestStore::new(jar);
    let vis = visibility::resolve_visibility(
        &state.db,
        principal,
        &mut store,
        guest_day(&headers),
        state.config.guest_view_limit,
        state.config.daily_view_limit,
    )
    .await;

    // The denial must still return the jar: a guest whose first request
    // of the day lands outside the fresh draw would otherwise never
    // persist it, and every retry would draw anew
    if !vis.permits(id) {
        return Ok((
            store.into_jar(),
            ArticleError::DailyLimitReached.into_response(),
        )
            .into_response());
    }

    Ok((store.into_jar(), Json(article)).into_response())
}

/// POST /api/articles/{id}/view
/// Record that the viewer opened an article today.
///
/// Guests are a no-op (their visibility is pre-computed, not recorded
/// per view), as are roles above regular user. Quota exhaustion is a
/// normal response state, not an error.
pub async fn record_view(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecordViewResponse>, ArticleError> {
    let article = db::find_article(&state.db, id)
        .await?
        .ok_or(ArticleError::NotFound)?;
    if !article.published {
        return Err(ArticleError::NotFound);
    }

    let Some((user_id, actor_role)) = resolve_principal(&state, &user).await else {
        return Ok(Json(RecordViewResponse {
            allowed: true,
            recorded: false,
            already_counted: false,
            remaining_today: None,
        }));
    };

    if actor_role.is_unlimited() {
        return Ok(Json(RecordViewResponse {
            allowed: true,
            recorded: false,
            already_counted: false,
            remaining_today: None,
        }));
    }

    let today = server_today();
    let limit = state.config.daily_view_limit;
    let allowance = crate::access::quota::fetch_allowance(&state.db, user_id, today, limit).await;

    if allowance.already_viewed.contains(&id) {
        return Ok(Json(RecordViewResponse {
            allowed: true,
            recorded: false,
            already_counted: true,
            remaining_today: Some(allowance.remaining(limit)),
        }));
    }

    if !allowance.permits(id) {
        return Ok(Json(RecordViewResponse {
            allowed: false,
            recorded: false,
            already_counted: false,
            remaining_today: Some(allowance.remaining(limit)),
        }));
    }

    let outcome = crate::access::quota::record_view(&state.db, user_id, id, today).await?;
    let recorded = outcome == RecordOutcome::Recorded;

    Ok(Json(RecordViewResponse {
        allowed: true,
        recorded,
        already_counted: !recorded,
        remaining_today: Some(allowance.remaining(limit).saturating_sub(1)),
    }))
}

/// POST /api/articles
/// Publish a new article. Approved editors and above only.
pub async fn create_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), ArticleError> {
    body.validate()
        .map_err(|e| ArticleError::Validation(e.to_string()))?;

    let actor_role = role::resolve_role(&state.db, auth.id).await;
    if !role::can_publish(actor_role) {
        return Err(ArticleError::Forbidden);
    }

    let article = db::insert_article(
        &state.db,
        &body.title,
        &body.content,
        auth.id,
        body.published.unwrap_or(true),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(article)))
}

/// DELETE /api/articles/{id}
/// Delete an article, subject to the role matrix: admins delete
/// anything, second admins anything not authored by an admin, others
/// only their own.
pub async fn delete_article(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ArticleError> {
    let article = db::find_article(&state.db, id)
        .await?
        .ok_or(ArticleError::NotFound)?;

    let actor_role = role::resolve_role(&state.db, auth.id).await;
    let author_role = role::resolve_role(&state.db, article.author_id).await;

    if !role::can_delete_article(actor_role, auth.id, article.author_id, author_role) {
        return Err(ArticleError::Forbidden);
    }

    db::delete_article(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;
    use chrono::NaiveDate;

    use crate::access::guest::{GuestStore, GUEST_ALLOWANCE_COOKIE};

    #[test]
    fn test_client_date_header_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_DATE_HEADER, "2024-06-01".parse().unwrap());

        let expected: NaiveDate = "2024-06-01".parse().unwrap();
        assert_eq!(guest_day(&headers), expected);
    }

    #[test]
    fn test_garbage_client_date_falls_back_to_server_day() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_DATE_HEADER, "yesterday-ish".parse().unwrap());

        assert_eq!(guest_day(&headers), server_today());
    }

    #[test]
    fn test_limit_denial_still_persists_guest_allowance() {
        // A guest whose first request of the day is denied must still
        // receive the drawn allowance, or every retry would re-draw
        let day: NaiveDate = "2024-06-01".parse().unwrap();
        let mut store = CookieGuestStore::new(CookieJar::new());
        store.set(day, &[Uuid::new_v4()]);

        let response = (
            store.into_jar(),
            ArticleError::DailyLimitReached.into_response(),
        )
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let persisted = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .any(|v| v.to_str().is_ok_and(|s| s.starts_with(GUEST_ALLOWANCE_COOKIE)));
        assert!(persisted);
    }
}
