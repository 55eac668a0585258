//! Origin ban gate.
//!
//! Every request passes this gate before any other logic. The origin
//! identifier is taken from the first non-empty forwarded header; when
//! none is present the sentinel `"unknown"` is used, which never
//! matches a ban row. Lookups fail open: an unavailable backend must
//! not lock out legitimate traffic.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sqlx::PgPool;
use tracing::warn;

use crate::api::AppState;
use crate::db;

use super::error::AccessError;

/// Sentinel origin for requests with no usable forwarded header.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Forwarded-origin headers in priority order.
const ORIGIN_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Result of a ban lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanCheck {
    pub banned: bool,
    pub reason: Option<String>,
}

impl BanCheck {
    const fn allowed() -> Self {
        Self {
            banned: false,
            reason: None,
        }
    }
}

/// Extract the client origin identifier from forwarded headers.
///
/// `X-Forwarded-For` may carry a comma-separated chain; only its first
/// element identifies the client.
#[must_use]
pub fn extract_origin(headers: &HeaderMap) -> String {
    for name in ORIGIN_HEADERS {
        let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let first = value.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    UNKNOWN_ORIGIN.to_string()
}

/// Check whether an origin is banned, by literal equality only.
///
/// The sentinel origin is never matchable. A failed lookup is logged
/// and reported as not banned.
pub async fn is_origin_banned(pool: &PgPool, origin: &str) -> BanCheck {
    if origin == UNKNOWN_ORIGIN {
        return BanCheck::allowed();
    }

    match db::find_banned_origin(pool, origin).await {
        Ok(Some(row)) => BanCheck {
            banned: true,
            reason: row.reason,
        },
        Ok(None) => BanCheck::allowed(),
        Err(e) => {
            warn!(origin = %origin, error = %e, "Ban lookup failed, failing open");
            BanCheck::allowed()
        }
    }
}

/// Middleware applying the ban gate to every request.
pub async fn ban_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AccessError> {
    let origin = extract_origin(request.headers());
    let check = is_origin_banned(&state.db, &origin).await;
    if check.banned {
        return Err(AccessError::OriginBanned);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_first_element_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.50, 70.41.3.18".parse().unwrap(),
        );
        headers.insert("x-real-ip", "198.51.100.25".parse().unwrap());

        assert_eq!(extract_origin(&headers), "203.0.113.50");
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.25".parse().unwrap());

        assert_eq!(extract_origin(&headers), "198.51.100.25");
    }

    #[test]
    fn test_cf_connecting_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", "192.0.2.7".parse().unwrap());

        assert_eq!(extract_origin(&headers), "192.0.2.7");
    }

    #[test]
    fn test_empty_forwarded_for_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "   ".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.25".parse().unwrap());

        assert_eq!(extract_origin(&headers), "198.51.100.25");
    }

    #[test]
    fn test_no_headers_yields_sentinel() {
        let headers = HeaderMap::new();
        assert_eq!(extract_origin(&headers), UNKNOWN_ORIGIN);
    }
}
