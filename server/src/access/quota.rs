//! Daily view quota for authenticated regular users.
//!
//! The allowance for a day is the set of articles already viewed plus
//! up to `limit - viewed` extra published articles drawn uniformly at
//! random without replacement. The extra draw may differ between page
//! loads; each actual view is individually recorded and re-queried, so
//! only the recorded set needs to be stable. View recording is
//! idempotent (see `insert_view_if_absent`), which also resolves
//! same-day racing inserts from concurrent requests.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::db;

/// A viewer's resolved allowance for one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyAllowance {
    /// Articles already recorded as viewed today. Always visible,
    /// even once the extra slots are exhausted.
    pub already_viewed: Vec<Uuid>,
    /// Extra articles the viewer may still open today.
    pub additionally_allowed: Vec<Uuid>,
}

impl DailyAllowance {
    /// Whether the allowance admits the given article.
    #[must_use]
    pub fn permits(&self, article_id: Uuid) -> bool {
        self.already_viewed.contains(&article_id)
            || self.additionally_allowed.contains(&article_id)
    }

    /// Views left before the daily limit is reached.
    #[must_use]
    pub fn remaining(&self, limit: usize) -> usize {
        limit.saturating_sub(self.already_viewed.len())
    }
}

/// Outcome of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new ledger row was written.
    Recorded,
    /// The (user, article, day) tuple already existed.
    AlreadyCounted,
}

/// Draw `slots` candidates uniformly at random without replacement.
///
/// Fewer candidates than slots yields a smaller draw, never padding.
#[must_use]
pub fn sample_additional(candidates: &[Uuid], slots: usize) -> Vec<Uuid> {
    let mut rng = rand::thread_rng();
    candidates
        .choose_multiple(&mut rng, slots)
        .copied()
        .collect()
}

/// Compute today's allowance for a regular-tier principal.
///
/// Degrades instead of erroring: if the view-record read fails the
/// allowance is empty, and if the candidate read fails it contains only
/// the already-viewed set. The rendering layer always receives a
/// defined value.
pub async fn fetch_allowance(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
    limit: usize,
) -> DailyAllowance {
    let already_viewed = match db::viewed_article_ids(pool, user_id, today).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "View-record read failed, returning empty allowance");
            return DailyAllowance::default();
        }
    };

    if already_viewed.len() >= limit {
        return DailyAllowance {
            already_viewed,
            additionally_allowed: Vec::new(),
        };
    }

    let candidates = match db::published_article_ids_excluding(pool, &already_viewed).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Candidate read failed, withholding extra allowance");
            return DailyAllowance {
                already_viewed,
                additionally_allowed: Vec::new(),
            };
        }
    };

    let slots = limit - already_viewed.len();
    let additionally_allowed = sample_additional(&candidates, slots);

    DailyAllowance {
        already_viewed,
        additionally_allowed,
    }
}

/// Record that a principal viewed an article today.
pub async fn record_view(
    pool: &PgPool,
    user_id: Uuid,
    article_id: Uuid,
    today: NaiveDate,
) -> sqlx::Result<RecordOutcome> {
    let inserted = db::insert_view_if_absent(pool, user_id, article_id, today).await?;
    Ok(if inserted {
        RecordOutcome::Recorded
    } else {
        RecordOutcome::AlreadyCounted
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_sample_size_capped_by_slots() {
        let candidates = ids(20);
        let drawn = sample_additional(&candidates, 5);
        assert_eq!(drawn.len(), 5);
    }

    #[test]
    fn test_sample_capped_by_candidates() {
        let candidates = ids(3);
        let drawn = sample_additional(&candidates, 5);
        assert_eq!(drawn.len(), 3);
    }

    #[test]
    fn test_sample_without_replacement() {
        let candidates = ids(10);
        let drawn = sample_additional(&candidates, 10);
        let unique: HashSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), drawn.len());
    }

    #[test]
    fn test_sample_membership() {
        let candidates = ids(20);
        let pool: HashSet<_> = candidates.iter().copied().collect();
        for id in sample_additional(&candidates, 5) {
            assert!(pool.contains(&id));
        }
    }

    #[test]
    fn test_sample_from_empty() {
        assert!(sample_additional(&[], 5).is_empty());
    }

    #[test]
    fn test_permits_viewed_and_allowed() {
        let viewed = ids(2);
        let allowed = ids(3);
        let other = Uuid::new_v4();

        let allowance = DailyAllowance {
            already_viewed: viewed.clone(),
            additionally_allowed: allowed.clone(),
        };

        assert!(allowance.permits(viewed[0]));
        assert!(allowance.permits(allowed[2]));
        assert!(!allowance.permits(other));
    }

    #[test]
    fn test_viewed_remain_visible_at_limit() {
        // At the limit: no extra slots, but recorded views stay visible
        let viewed = ids(5);
        let allowance = DailyAllowance {
            already_viewed: viewed.clone(),
            additionally_allowed: Vec::new(),
        };

        for id in &viewed {
            assert!(allowance.permits(*id));
        }
        assert!(!allowance.permits(Uuid::new_v4()));
        assert_eq!(allowance.remaining(5), 0);
    }

    #[test]
    fn test_remaining_saturates() {
        let allowance = DailyAllowance {
            already_viewed: ids(7),
            additionally_allowed: Vec::new(),
        };
        assert_eq!(allowance.remaining(5), 0);
    }
}
