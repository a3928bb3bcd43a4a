//! In-memory snapshot store using moka
//!
//! Holds the last fetched value per key. Entries are only evicted for
//! capacity; once older than the TTL they are stale but still served until a
//! refetch replaces them.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::CacheKey;
use crate::models::SessionLookup;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 1_000;

/// Default age after which an entry is stale
const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Cached value with the time it was fetched
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Arc<SessionLookup>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: SessionLookup) -> Self {
        Self {
            data: Arc::new(data),
            fetched_at: Utc::now(),
        }
    }

    /// Time since the value was fetched
    pub fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

/// moka-backed store keyed by `CacheKey`
///
/// Cloning is cheap and every clone shares the same entries.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<CacheKey, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a store with custom capacity and staleness age
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();

        Self { cache, default_ttl }
    }

    /// True once `entry` is older than the store's TTL
    pub fn is_stale(&self, entry: &CacheEntry) -> bool {
        entry.is_stale(self.default_ttl)
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.cache.get(key).await
    }

    /// Insert or replace the entry for `key`
    pub async fn insert(&self, key: CacheKey, entry: CacheEntry) {
        self.cache.insert(key, entry).await;
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        self.cache.invalidate(key).await;
    }

    /// Return the cached entry or run `init` to produce it
    ///
    /// Concurrent callers for the same absent key wait on a single `init`.
    /// A failed `init` caches nothing.
    pub async fn get_or_try_insert_with<F, E>(&self, key: CacheKey, init: F) -> Result<CacheEntry, Arc<E>>
    where
        F: Future<Output = Result<CacheEntry, E>>,
        E: Send + Sync + 'static,
    {
        self.cache.try_get_with(key, init).await
    }

    /// Flush pending maintenance so `entry_count` is accurate
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
