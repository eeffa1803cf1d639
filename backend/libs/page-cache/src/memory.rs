//! In-process page cache

use crate::{CacheResult, CachedPage, PageCache};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Entries held before the oldest are evicted
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// How often `set` sweeps out expired entries
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Entry {
    page: CachedPage,
    expires_at: Instant,
}

/// Page cache held in process memory. Cloning shares the same map.
///
/// Expired entries are dropped when read, and swept out by `set` once per
/// `SWEEP_INTERVAL` or whenever the cache is full. A full cache that holds
/// only live entries evicts the tenth that expires soonest.
#[derive(Clone)]
pub struct MemoryPageCache {
    entries: Arc<DashMap<String, Entry>>,
    max_entries: usize,
    next_sweep: Arc<Mutex<Instant>>,
}

impl Default for MemoryPageCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries: max_entries.max(1),
            next_sweep: Arc::new(Mutex::new(Instant::now() + SWEEP_INTERVAL)),
        }
    }

    /// Number of entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep_due(&self, now: Instant) -> bool {
        let mut next_sweep = match self.next_sweep.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now >= *next_sweep {
            *next_sweep = now + SWEEP_INTERVAL;
            true
        } else {
            false
        }
    }

    /// Make room for one more entry
    fn enforce_limits(&self, now: Instant) {
        let full = self.entries.len() >= self.max_entries;
        if !full && !self.sweep_due(now) {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let expired = before - self.entries.len();

        if self.entries.len() < self.max_entries {
            if expired > 0 {
                debug!(expired, "Page cache swept expired entries");
            }
            return;
        }

        let evict_count = (self.entries.len() / 10).max(1);
        let mut by_expiry: Vec<(Instant, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.expires_at, entry.key().clone()))
            .collect();
        by_expiry.sort_unstable();

        for (_, key) in by_expiry.into_iter().take(evict_count) {
            self.entries.remove(&key);
        }
        debug!(expired, evicted = evict_count, "Page cache limit reached");
    }
}

#[async_trait::async_trait]
impl PageCache for MemoryPageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                debug!(key = %key, "Page cache hit");
                return Ok(Some(entry.page.clone()));
            }
        }

        // Expired entries are dropped lazily
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        debug!(key = %key, "Page cache miss");
        Ok(None)
    }

    async fn set(&self, key: &str, page: &CachedPage, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        if !self.entries.contains_key(key) {
            self.enforce_limits(now);
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                page: page.clone(),
                expires_at: now + ttl,
            },
        );
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Page cache set");
        Ok(())
    }

    async fn clear(&self) -> CacheResult<usize> {
        let removed = self.entries.len();
        self.entries.clear();
        debug!(removed, "Page cache cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> CachedPage {
        CachedPage::new("application/json", body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_get_returns_stored_page() {
        let cache = MemoryPageCache::new();
        cache
            .set("v1:page:/", &page("first"), Duration::from_secs(20))
            .await
            .unwrap();

        let cached = cache.get("v1:page:/").await.unwrap();
        assert_eq!(cached, Some(page("first")));
        assert_eq!(cache.get("v1:page:/?page=2").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryPageCache::new();
        cache
            .set("v1:page:/", &page("first"), Duration::from_secs(20))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(19)).await;
        assert!(cache.get("v1:page:/").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("v1:page:/").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let cache = MemoryPageCache::new();
        let ttl = Duration::from_secs(20);
        cache.set("a", &page("a"), ttl).await.unwrap();
        cache.set("b", &page("b"), ttl).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.get("a").await.unwrap().is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = MemoryPageCache::new();
        let other = cache.clone();
        cache
            .set("k", &page("shared"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(other.get("k").await.unwrap(), Some(page("shared")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_sweeps_entries_nobody_reads() {
        let cache = MemoryPageCache::new();
        let ttl = Duration::from_secs(20);
        for i in 0..1000 {
            cache
                .set(&format!("v1:page:/?x={}", i), &page("stale"), ttl)
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        cache.set("v1:page:/", &page("fresh"), ttl).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("v1:page:/").await.unwrap(), Some(page("fresh")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cache_evicts_soonest_expiring() {
        let cache = MemoryPageCache::with_max_entries(10);
        for i in 0..10 {
            cache
                .set(&format!("k{}", i), &page("p"), Duration::from_secs(20 + i))
                .await
                .unwrap();
        }

        cache.set("k10", &page("p"), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.len(), 10);
        assert!(cache.get("k0").await.unwrap().is_none());
        assert!(cache.get("k1").await.unwrap().is_some());
        assert!(cache.get("k10").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwriting_a_key_keeps_other_entries() {
        let cache = MemoryPageCache::with_max_entries(2);
        let ttl = Duration::from_secs(20);
        cache.set("a", &page("a"), ttl).await.unwrap();
        cache.set("b", &page("b"), ttl).await.unwrap();
        cache.set("b", &page("b2"), ttl).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some(page("a")));
        assert_eq!(cache.get("b").await.unwrap(), Some(page("b2")));
    }
}
