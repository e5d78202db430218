//! Region cache with single-flight fetching
//!
//! Keyed by [`CacheKey`] (level + ancestor chain), holding fully decoded and
//! merged region sets. The cache guarantees at most one backend round-trip
//! per distinct key for the lifetime of the session:
//!
//! - A resolved key is served from memory; navigation never refetches.
//! - Concurrent requests for the same unresolved key are coalesced into a
//!   single in-flight fetch (`moka`'s `try_get_with`).
//! - A failed fetch caches nothing; the next request retries.
//!
//! Entries are immutable once written. Explicit [`RegionCache::invalidate`]
//! and [`RegionCache::clear`] exist only for user-forced refreshes of the
//! underlying dataset; normal navigation never evicts.
//!
//! # Why moka?
//!
//! Same reasoning as everywhere else in this codebase: lock-free reads,
//! async-safe coalescing, and bounded capacity without hand-rolled LRU
//! bookkeeping.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::region::{CacheKey, Region};
use crate::source::FetchError;

/// Default maximum number of cached region sets.
///
/// Each entry is one level's worth of regions under one parent; sessions
/// rarely touch more than a few dozen distinct scopes.
pub const DEFAULT_MAX_ENTRIES: u64 = 256;

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Requests served from memory.
    pub hits: u64,
    /// Requests that required a fetch (or joined one in flight).
    pub misses: u64,
    /// Resolved entries currently cached.
    pub entries: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache: {} hits, {} misses, {} entries",
            self.hits, self.misses, self.entries
        )
    }
}

/// Session cache of decoded + merged region sets.
pub struct RegionCache {
    cache: Cache<CacheKey, Arc<Vec<Region>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for RegionCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl RegionCache {
    /// Create a cache bounded to `max_entries` region sets.
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached region set for `key`, fetching it at most once.
    ///
    /// On a miss, `fetch` runs and its successful result is stored under
    /// `key`. Concurrent callers for the same unresolved key share one
    /// in-flight fetch and all receive its result — including its error,
    /// which is reported to every waiter but never cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
    ) -> Result<Arc<Vec<Region>>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Region>, FetchError>>,
    {
        if let Some(cached) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, regions = cached.len(), "Region cache hit");
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        self.cache
            .try_get_with(key.clone(), async move { fetch().await.map(Arc::new) })
            .await
            .map_err(|e: Arc<FetchError>| (*e).clone())
    }

    /// Peek at a cached entry without fetching.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Vec<Region>>> {
        self.cache.get(key).await
    }

    /// Evict one key. Used only for user-forced refreshes.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.cache.invalidate(key).await;
        debug!(key = %key, "Region cache entry invalidated");
    }

    /// Evict everything. Used only for user-forced refreshes of the whole
    /// dataset (e.g. re-fetching base counts).
    pub fn clear(&self) {
        self.cache.invalidate_all();
        debug!("Region cache cleared");
    }

    /// Snapshot hit/miss/entry statistics.
    pub async fn stats(&self) -> CacheStats {
        // Flush pending maintenance so entry_count is accurate.
        self.cache.run_pending_tasks().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }
}
