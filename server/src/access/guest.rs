//! Daily view quota for anonymous guests.
//!
//! Unlike the authenticated ledger, the guest allowance is drawn once
//! per calendar day and then held fixed: every later check that day
//! must agree with what an earlier render pass showed. The allowance
//! lives in a client-persisted slot behind the [`GuestStore`] trait,
//! so handlers use the cookie-backed store and tests an in-memory one.
//!
//! The day key for guests comes from the client (see the article
//! handlers), not from server time; the two quota paths can disagree
//! near midnight and that divergence is intentional.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quota::sample_additional;

/// Cookie holding the guest allowance.
pub const GUEST_ALLOWANCE_COOKIE: &str = "guest_allowance";

/// Keyed store for the guest allowance: one day key, one id list.
///
/// An explicit abstraction rather than ambient client storage, so the
/// ledger logic can run against an in-memory fake.
pub trait GuestStore {
    /// The stored id list, if it was written for the given day.
    fn get(&self, day: NaiveDate) -> Option<Vec<Uuid>>;

    /// Overwrite the slot with a list for the given day.
    fn set(&mut self, day: NaiveDate, ids: &[Uuid]);
}

/// Serialized form of the stored allowance.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAllowance {
    date: NaiveDate,
    ids: Vec<Uuid>,
}

/// Guest store backed by a browser cookie.
///
/// Reads from the request's cookie jar; writes accumulate in the jar,
/// which the handler returns in the response to persist the slot.
#[derive(Debug, Clone)]
pub struct CookieGuestStore {
    jar: CookieJar,
}

impl CookieGuestStore {
    #[must_use]
    pub const fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    /// Consume the store, yielding the jar with any pending writes.
    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl GuestStore for CookieGuestStore {
    fn get(&self, day: NaiveDate) -> Option<Vec<Uuid>> {
        let cookie = self.jar.get(GUEST_ALLOWANCE_COOKIE)?;
        let stored: StoredAllowance = serde_json::from_str(cookie.value()).ok()?;
        // A stale day key means the stored allowance has expired
        (stored.date == day).then_some(stored.ids)
    }

    fn set(&mut self, day: NaiveDate, ids: &[Uuid]) {
        let stored = StoredAllowance {
            date: day,
            ids: ids.to_vec(),
        };
        // Serializing a plain struct to JSON cannot fail
        let value = serde_json::to_string(&stored).unwrap_or_default();
        let cookie = Cookie::build((GUEST_ALLOWANCE_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(2))
            .build();
        self.jar = self.jar.clone().add(cookie);
    }
}

/// In-memory guest store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryGuestStore {
    slot: Option<(NaiveDate, Vec<Uuid>)>,
}

impl GuestStore for MemoryGuestStore {
    fn get(&self, day: NaiveDate) -> Option<Vec<Uuid>> {
        self.slot
            .as_ref()
            .and_then(|(stored_day, ids)| (*stored_day == day).then(|| ids.clone()))
    }

    fn set(&mut self, day: NaiveDate, ids: &[Uuid]) {
        self.slot = Some((day, ids.to_vec()));
    }
}

/// Return today's guest allowance, drawing and persisting it on first
/// use of the day.
///
/// A stored non-empty list for today's key always wins, regardless of
/// the candidate set; an empty stored list counts as uninitialized and
/// triggers a fresh draw. A mismatched day key discards the old slot.
pub fn get_or_init_allowance<S: GuestStore>(
    store: &mut S,
    today: NaiveDate,
    candidates: &[Uuid],
    limit: usize,
) -> Vec<Uuid> {
    if let Some(ids) = store.get(today) {
        if !ids.is_empty() {
            return ids;
        }
    }

    let selected = sample_additional(candidates, limit);
    store.set(today, &selected);
    selected
}

/// Whether the stored allowance admits the given article.
///
/// Membership in the initialized list only; an uninitialized day admits
/// nothing (callers wanting lazy initialization go through
/// [`get_or_init_allowance`] first).
pub fn is_allowed<S: GuestStore>(store: &S, today: NaiveDate, article_id: Uuid) -> bool {
    store
        .get(today)
        .is_some_and(|ids| ids.contains(&article_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_use_draws_sample_of_limit() {
        let mut store = MemoryGuestStore::default();
        let candidates = ids(20);

        let allowed = get_or_init_allowance(&mut store, day("2024-06-01"), &candidates, 5);

        assert_eq!(allowed.len(), 5);
        let pool: HashSet<_> = candidates.iter().copied().collect();
        for id in &allowed {
            assert!(pool.contains(id));
        }
    }

    #[test]
    fn test_same_day_is_stable() {
        let mut store = MemoryGuestStore::default();
        let candidates = ids(20);
        let today = day("2024-06-01");

        let first = get_or_init_allowance(&mut store, today, &candidates, 5);
        let second = get_or_init_allowance(&mut store, today, &candidates, 5);

        assert_eq!(first, second);
    }

    #[test]
    fn test_new_day_discards_stored_allowance() {
        let mut store = MemoryGuestStore::default();
        let candidates = ids(20);

        let monday = get_or_init_allowance(&mut store, day("2024-06-03"), &candidates, 5);
        let tuesday = get_or_init_allowance(&mut store, day("2024-06-04"), &candidates, 5);

        // Independently drawn; may overlap by chance but the slot was reset
        assert_eq!(tuesday.len(), 5);
        assert_eq!(store.get(day("2024-06-03")), None);
        assert_eq!(store.get(day("2024-06-04")), Some(tuesday));
        let _ = monday;
    }

    #[test]
    fn test_empty_stored_list_counts_as_uninitialized() {
        let mut store = MemoryGuestStore::default();
        let today = day("2024-06-01");
        store.set(today, &[]);

        let allowed = get_or_init_allowance(&mut store, today, &ids(10), 5);
        assert_eq!(allowed.len(), 5);
    }

    #[test]
    fn test_fewer_candidates_than_limit() {
        let mut store = MemoryGuestStore::default();
        let allowed = get_or_init_allowance(&mut store, day("2024-06-01"), &ids(2), 5);
        assert_eq!(allowed.len(), 2);
    }

    #[test]
    fn test_is_allowed_membership() {
        let mut store = MemoryGuestStore::default();
        let today = day("2024-06-01");
        let allowed = get_or_init_allowance(&mut store, today, &ids(10), 5);

        assert!(is_allowed(&store, today, allowed[0]));
        assert!(!is_allowed(&store, today, Uuid::new_v4()));
        // Yesterday's key admits nothing
        assert!(!is_allowed(&store, day("2024-05-31"), allowed[0]));
    }

    #[test]
    fn test_cookie_store_round_trip() {
        let today = day("2024-06-01");
        let picked = ids(3);

        let mut store = CookieGuestStore::new(CookieJar::new());
        store.set(today, &picked);

        // Simulate the next request carrying the written cookie back
        let jar = store.into_jar();
        let value = jar.get(GUEST_ALLOWANCE_COOKIE).unwrap().value().to_string();
        let next_jar = CookieJar::new().add(Cookie::new(GUEST_ALLOWANCE_COOKIE, value));
        let next_store = CookieGuestStore::new(next_jar);

        assert_eq!(next_store.get(today), Some(picked));
        assert_eq!(next_store.get(day("2024-06-02")), None);
    }

    #[test]
    fn test_cookie_store_tolerates_garbage() {
        let jar = CookieJar::new().add(Cookie::new(GUEST_ALLOWANCE_COOKIE, "not-json"));
        let store = CookieGuestStore::new(jar);
        assert_eq!(store.get(day("2024-06-01")), None);
    }
}
