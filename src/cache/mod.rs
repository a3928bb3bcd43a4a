//! Cache and revalidation layer
//!
//! Keeps the last fetched session snapshot per `(resource, session id)` key
//! and exposes the loading/error state alongside it.
//!
//! - `read` returns the last known value immediately; an absent key is
//!   fetched first, a stale one is refetched in the background
//! - `revalidate` forces a fetch; on failure the previous value stays
//! - there is no cross-key invalidation
//!
//! # Usage
//!
//! ```rust,ignore
//! use sessionctl::cache::{create_cache, CacheKey};
//!
//! let cache = create_cache(api, &config.cache);
//! let snapshot = cache.read(&CacheKey::session("s1")).await;
//! ```

pub mod memory;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{ClientError, SessionApi};
use crate::config::CacheConfig;
use crate::models::{Session, SessionLookup};

pub use memory::{CacheEntry, MemoryStore};

/// Resource name of session detail lookups
pub const SESSION_RESOURCE: &str = "api/session/getSessionByID";

/// Cache key: resource name plus session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    resource: &'static str,
    session_id: String,
}

impl CacheKey {
    /// Key of a session detail lookup
    pub fn session(session_id: impl Into<String>) -> Self {
        Self {
            resource: SESSION_RESOURCE,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource, self.session_id)
    }
}

/// Point-in-time view of one key
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Last successfully fetched value
    pub data: Option<SessionLookup>,
    /// No value resolved yet, or a fetch for this key is in flight
    pub is_loading: bool,
    /// Message of the last failed fetch, cleared by the next success
    pub error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The session, when the last fetch found one
    pub fn session(&self) -> Option<&Session> {
        self.data.as_ref().and_then(SessionLookup::session)
    }
}

#[derive(Debug, Default)]
struct KeyStatus {
    in_flight: usize,
    error: Option<String>,
    /// Sequence number handed to the latest fetch
    started: u64,
    /// Sequence number of the newest fetch whose outcome was published
    published: u64,
}

/// Loading/error state per key, shared with background refreshes
#[derive(Debug, Clone, Default)]
struct StatusTable(Arc<Mutex<HashMap<CacheKey, KeyStatus>>>);

impl StatusTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, KeyStatus>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self, key: &CacheKey) -> Fetch {
        let mut table = self.lock();
        Self::start(&mut table, self, key)
    }

    /// Start a fetch only when none is running for `key`
    fn begin_if_idle(&self, key: &CacheKey) -> Option<Fetch> {
        let mut table = self.lock();
        if table.get(key).is_some_and(|s| s.in_flight > 0) {
            return None;
        }
        Some(Self::start(&mut table, self, key))
    }

    fn start(table: &mut HashMap<CacheKey, KeyStatus>, owner: &Self, key: &CacheKey) -> Fetch {
        let status = table.entry(key.clone()).or_default();
        status.in_flight += 1;
        status.started += 1;
        Fetch {
            table: owner.clone(),
            key: key.clone(),
            seq: status.started,
        }
    }

    fn get(&self, key: &CacheKey) -> (usize, Option<String>) {
        self.lock()
            .get(key)
            .map(|s| (s.in_flight, s.error.clone()))
            .unwrap_or((0, None))
    }

    /// Forget the error; sequence numbers survive so late fetches stay ordered
    fn reset(&self, key: &CacheKey) {
        if let Some(status) = self.lock().get_mut(key) {
            status.error = None;
        }
    }
}

/// One running fetch; marks its key as loading until dropped
struct Fetch {
    table: StatusTable,
    key: CacheKey,
    seq: u64,
}

impl Fetch {
    /// Record the outcome unless a later fetch already did
    ///
    /// Returns false when this result is outdated and must be discarded.
    fn publish(&self, error: Option<String>) -> bool {
        let mut table = self.table.lock();
        let status = table.entry(self.key.clone()).or_default();
        if self.seq <= status.published {
            return false;
        }
        status.published = self.seq;
        status.error = error;
        true
    }
}

impl Drop for Fetch {
    fn drop(&mut self) {
        if let Some(status) = self.table.lock().get_mut(&self.key) {
            status.in_flight = status.in_flight.saturating_sub(1);
        }
    }
}

/// Keyed session snapshot cache
///
/// Shared behind an `Arc`; every reader of a key sees the same value, which
/// only changes through a fetch (`read` when absent or stale, `revalidate`).
pub struct SessionCache {
    api: Arc<dyn SessionApi>,
    store: MemoryStore,
    status: StatusTable,
}

impl SessionCache {
    pub fn new(api: Arc<dyn SessionApi>, store: MemoryStore) -> Self {
        Self {
            api,
            store,
            status: StatusTable::default(),
        }
    }

    /// Backend the cache fetches from
    pub fn api(&self) -> &Arc<dyn SessionApi> {
        &self.api
    }

    /// Return the last known snapshot of `key`
    ///
    /// An absent key is fetched before returning. A stale value is returned
    /// as is while a background refetch replaces it; a failed refetch keeps
    /// it and only sets the error.
    pub async fn read(&self, key: &CacheKey) -> Snapshot {
        match self.store.get(key).await {
            Some(entry) => {
                if self.store.is_stale(&entry) {
                    self.refresh_in_background(key);
                }
            }
            None => self.fetch_absent(key).await,
        }

        self.peek(key).await
    }

    /// Current state of a key without fetching
    pub async fn peek(&self, key: &CacheKey) -> Snapshot {
        let entry = self.store.get(key).await;
        let (in_flight, error) = self.status.get(key);

        Snapshot {
            is_loading: (entry.is_none() && error.is_none()) || in_flight > 0,
            fetched_at: entry.as_ref().map(|e| e.fetched_at),
            data: entry.map(|e| e.data.as_ref().clone()),
            error,
        }
    }

    /// Force a re-fetch of `key`
    ///
    /// On success the cached value is replaced. On failure the previous value
    /// is kept, the key's error is set and the error is returned.
    pub async fn revalidate(&self, key: &CacheKey) -> Result<Snapshot, ClientError> {
        let fetch = self.status.begin(key);
        tracing::debug!("Revalidating {}", key);

        match self.api.get_session(key.session_id()).await {
            Ok(lookup) => {
                if fetch.publish(None) {
                    self.store.insert(key.clone(), CacheEntry::new(lookup)).await;
                }
            }
            Err(e) => {
                tracing::warn!("Revalidation of {} failed: {}", key, e);
                fetch.publish(Some(e.to_string()));
                return Err(e);
            }
        }
        drop(fetch);

        Ok(self.peek(key).await)
    }

    /// Drop the cached value and error of `key`
    pub async fn invalidate(&self, key: &CacheKey) {
        self.store.invalidate(key).await;
        self.status.reset(key);
    }

    async fn fetch_absent(&self, key: &CacheKey) {
        let fetch = self.status.begin(key);
        let api = self.api.clone();
        let session_id = key.session_id().to_string();
        tracing::debug!("Cache miss for {}", key);

        let result = self
            .store
            .get_or_try_insert_with(key.clone(), async move {
                api.get_session(&session_id).await.map(CacheEntry::new)
            })
            .await;

        match result {
            Ok(_) => {
                fetch.publish(None);
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", key, e);
                fetch.publish(Some(e.to_string()));
            }
        }
    }

    fn refresh_in_background(&self, key: &CacheKey) {
        let Some(fetch) = self.status.begin_if_idle(key) else {
            return;
        };
        tracing::debug!("Refreshing stale {}", key);

        let api = self.api.clone();
        let store = self.store.clone();
        let key = key.clone();
        tokio::spawn(async move {
            match api.get_session(key.session_id()).await {
                Ok(lookup) => {
                    if fetch.publish(None) {
                        store.insert(key, CacheEntry::new(lookup)).await;
                    }
                }
                Err(e) => {
                    tracing::warn!("Refresh of {} failed, keeping stale value: {}", key, e);
                    fetch.publish(Some(e.to_string()));
                }
            }
        });
    }
}

/// Create a session cache for `api` from configuration
pub fn create_cache(api: Arc<dyn SessionApi>, config: &CacheConfig) -> Arc<SessionCache> {
    let store = MemoryStore::with_capacity_and_ttl(config.max_capacity, config.ttl());
    Arc::new(SessionCache::new(api, store))
}
