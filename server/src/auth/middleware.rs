//! Authentication Middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header::AUTHORIZATION,
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::db::{self, Profile, ProfileStatus};

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Authenticated principal injected into request extensions.
///
/// This is a minimal struct containing only safe-to-expose profile data.
/// Use this in handlers to access the current user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub display_name: String,
    /// Profile approval status.
    pub status: ProfileStatus,
}

impl From<Profile> for AuthUser {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.user_id,
            display_name: profile.display_name,
            status: profile.status,
        }
    }
}

/// Validate the bearer token on a request and load the profile it names.
///
/// Takes the headers rather than the whole request so the middleware
/// futures stay `Send` (`axum::body::Body` is not `Sync`).
async fn authenticate(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<AuthUser, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = validate_access_token(token, &state.config.jwt_secret)?;

    let user_id: Uuid = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    let profile = db::find_profile_by_user_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(AuthUser::from(profile))
}

/// Middleware to require authentication.
///
/// Extracts the Bearer token, validates it, loads the profile, and
/// injects [`AuthUser`] into request extensions. Requests without a
/// valid token are rejected.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Middleware for guest-capable routes.
///
/// Injects [`AuthUser`] when a valid token is present and lets the
/// request through anonymously otherwise. A present-but-invalid token
/// is treated as anonymous rather than rejected, matching how the
/// content pages render for signed-out visitors.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(auth_user) = authenticate(&state, request.headers()).await {
        request.extensions_mut().insert(auth_user);
    }
    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Extractor yielding `Some(AuthUser)` for authenticated requests and
/// `None` for anonymous ones. Use on routes behind [`optional_auth`].
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthUser>().cloned()))
    }
}
