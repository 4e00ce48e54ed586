//! Promotion cache
//!
//! A time-bounded cache of promotion records keyed by client identity. The
//! cache is owned state passed to whoever needs it; nothing here is
//! module-global.

use jiff::Timestamp;
use rustc_hash::FxHashMap;

use super::PromotionRecord;

/// Default time-to-live for cached promotion sets.
pub const DEFAULT_TTL_MS: i64 = 5 * 60 * 1_000;

#[derive(Debug)]
struct CacheEntry {
    fetched_at: Timestamp,
    records: Vec<PromotionRecord>,
}

/// A TTL cache of promotion records, keyed by client identity.
#[derive(Debug)]
pub struct PromotionCache {
    ttl_ms: i64,
    entries: FxHashMap<String, CacheEntry>,
}

impl Default for PromotionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}

impl PromotionCache {
    /// Creates a cache with the given time-to-live in milliseconds.
    #[must_use]
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            ttl_ms,
            entries: FxHashMap::default(),
        }
    }

    /// Returns the cached records for `client_id` when present and fresh.
    #[must_use]
    pub fn get(&self, client_id: &str, now: Timestamp) -> Option<&[PromotionRecord]> {
        let entry = self.entries.get(client_id)?;
        let age_ms = now.as_millisecond() - entry.fetched_at.as_millisecond();

        if age_ms <= self.ttl_ms {
            Some(&entry.records)
        } else {
            None
        }
    }

    /// Stores a freshly fetched record set for `client_id`.
    pub fn insert(&mut self, client_id: &str, records: Vec<PromotionRecord>, now: Timestamp) {
        self.entries.insert(
            client_id.to_owned(),
            CacheEntry {
                fetched_at: now,
                records,
            },
        );
    }

    /// Drops the cached records for `client_id`.
    ///
    /// Called when the caller knows the promotion set changed, e.g. after an
    /// order is placed, rather than waiting for expiry.
    pub fn invalidate(&mut self, client_id: &str) {
        self.entries.remove(client_id);
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::money::millimes;

    use super::*;

    fn record() -> PromotionRecord {
        PromotionRecord {
            promo_id: "promo-1".to_owned(),
            product_id: "p-1".to_owned(),
            original_price: millimes(100_000),
            promo_price: millimes(80_000),
            discount_percent: None,
            valid_from: None,
            valid_to: None,
        }
    }

    #[test]
    fn get_hits_while_fresh() -> TestResult {
        let mut cache = PromotionCache::default();
        let fetched: Timestamp = "2026-03-01T10:00:00Z".parse()?;
        let shortly_after: Timestamp = "2026-03-01T10:04:59Z".parse()?;

        cache.insert("client-1", vec![record()], fetched);

        let hit = cache.get("client-1", shortly_after);
        assert_eq!(hit.map(<[PromotionRecord]>::len), Some(1));

        Ok(())
    }

    #[test]
    fn get_misses_after_ttl() -> TestResult {
        let mut cache = PromotionCache::default();
        let fetched: Timestamp = "2026-03-01T10:00:00Z".parse()?;
        let expired: Timestamp = "2026-03-01T10:05:01Z".parse()?;

        cache.insert("client-1", vec![record()], fetched);

        assert!(cache.get("client-1", expired).is_none());

        Ok(())
    }

    #[test]
    fn get_misses_for_other_client() -> TestResult {
        let mut cache = PromotionCache::default();
        let fetched: Timestamp = "2026-03-01T10:00:00Z".parse()?;

        cache.insert("client-1", vec![record()], fetched);

        assert!(cache.get("client-2", fetched).is_none());

        Ok(())
    }

    #[test]
    fn invalidate_drops_entry_before_expiry() -> TestResult {
        let mut cache = PromotionCache::default();
        let fetched: Timestamp = "2026-03-01T10:00:00Z".parse()?;

        cache.insert("client-1", vec![record()], fetched);
        cache.invalidate("client-1");

        assert!(cache.get("client-1", fetched).is_none());

        Ok(())
    }
}
