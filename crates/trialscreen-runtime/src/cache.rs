//! Caching layer for DOI verification.
//!
//! Verification fetches full documents over the network; the outcome for a
//! DOI does not change within a run, so it is cached by normalized DOI.

use moka::future::Cache;
use std::time::Duration;
use trialscreen_core::Verification;

/// Verification cache using moka.
#[derive(Clone)]
pub struct VerificationCache {
    cache: Cache<String, Verification>,
}

impl VerificationCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, doi: &str) -> Option<Verification> {
        self.cache.get(doi).await
    }

    pub async fn insert(&self, doi: impl Into<String>, verification: Verification) {
        self.cache.insert(doi.into(), verification).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(24 * 3600))
    }
}

impl std::fmt::Debug for VerificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = VerificationCache::default();
        assert!(cache.get("10.1056/nejmoa0904327").await.is_none());

        cache
            .insert("10.1056/nejmoa0904327", Verification::ConfirmedRct)
            .await;
        assert_eq!(
            cache.get("10.1056/nejmoa0904327").await,
            Some(Verification::ConfirmedRct)
        );
        assert!(cache.get("10.1016/other").await.is_none());
    }
}
