//! Query Cache Module
//!
//! The read-through cache at the center of the crate: callers hand it a key,
//! a TTL and an asynchronous producer, and it serves stored results while
//! they are fresh, falling back to the producer otherwise.
//!
//! Concurrency is last-write-wins. The internal lock is never held across a
//! producer await, so overlapping fetches for the same key may each invoke
//! their producer and the slower result overwrites the faster one. Producers
//! are expected to be idempotent reads.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore, MemoryStore};
use crate::config::CacheConfig;

// == Shared State ==
/// Store plus counters, mutated together under one lock.
struct CacheState<S> {
    store: S,
    stats: CacheStats,
}

// == Query Cache ==
/// Read-through cache for asynchronous query results.
///
/// The cache is a cheap handle: cloning shares the underlying store, so one
/// instance can be injected everywhere results should be shared. Payloads
/// are cloned out on every hit; wrap large values in `Arc` when that
/// matters.
pub struct QueryCache<S> {
    state: Arc<RwLock<CacheState<S>>>,
    config: CacheConfig,
}

impl<S> Clone for QueryCache<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
        }
    }
}

impl<V: Send + Sync + 'static> QueryCache<MemoryStore<V>> {
    // == Constructors ==
    /// Creates a cache on the default unbounded in-memory backend.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }

    /// Creates a cache with default configuration (5 minute TTL).
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<S: CacheStore> QueryCache<S> {
    /// Creates a cache over an explicit backend, e.g. a
    /// [`BoundedStore`](crate::cache::BoundedStore).
    pub fn with_store(store: S, config: CacheConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState {
                store,
                stats: CacheStats::new(),
            })),
            config,
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Invalidate ==
    /// Removes the entry for `key`.
    ///
    /// Returns false when no entry was present; invalidating an absent key
    /// is a harmless no-op.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut state = self.state.write().await;
        let CacheState { store, stats } = &mut *state;

        let removed = store.delete(key);
        if removed {
            stats.set_total_entries(store.len());
            debug!("invalidated '{}'", key);
        }
        removed
    }

    // == Invalidate By Pattern ==
    /// Removes every entry whose key contains `pattern` as a substring and
    /// returns how many were removed.
    ///
    /// An empty pattern matches every key. A pattern matching nothing is a
    /// no-op.
    pub async fn invalidate_by_pattern(&self, pattern: &str) -> usize {
        let mut state = self.state.write().await;
        let CacheState { store, stats } = &mut *state;

        let removed = store.delete_matching(pattern);
        if removed > 0 {
            stats.set_total_entries(store.len());
            debug!("invalidated {} entries matching '{}'", removed, pattern);
        }
        removed
    }

    // == Clear All ==
    /// Empties the store. Hit/miss counters are cumulative and survive.
    pub async fn clear_all(&self) {
        let mut state = self.state.write().await;
        let CacheState { store, stats } = &mut *state;

        let dropped = store.clear();
        stats.set_total_entries(0);
        debug!("cleared {} cached entries", dropped);
    }

    // == Cleanup Expired ==
    /// Removes entries whose TTL has lapsed, returning the count.
    ///
    /// Driven by the periodic cleanup task; lookups never depend on it
    /// because freshness is re-checked on every read.
    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.state.write().await;
        let CacheState { store, stats } = &mut *state;

        let removed = store.cleanup_expired();
        if removed > 0 {
            stats.record_expirations(removed as u64);
            stats.set_total_entries(store.len());
        }
        removed
    }

    // == Length ==
    /// Number of stored entries, fresh and stale alike.
    pub async fn len(&self) -> usize {
        self.state.read().await.store.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.store.is_empty()
    }

    // == Stats ==
    /// Snapshot of the effectiveness counters.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.read().await;
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.store.len());
        stats
    }
}

impl<S: CacheStore> QueryCache<S>
where
    S::Value: Clone,
{
    // == Get ==
    /// Returns the stored value for `key` if present and fresh.
    ///
    /// Stale entries count as misses but are left in place: a later failed
    /// refresh must find the previous entry untouched.
    pub async fn get(&self, key: &str) -> Option<S::Value> {
        let mut state = self.state.write().await;
        let CacheState { store, stats } = &mut *state;

        let value = match store.get(key) {
            Some(entry) if entry.is_fresh() => Some(entry.value.clone()),
            // Stale entries stay until overwritten, invalidated or swept.
            Some(_) => None,
            None => None,
        };

        if value.is_some() {
            stats.record_hit();
            debug!("cache hit for '{}'", key);
        } else {
            stats.record_miss();
            debug!("cache miss for '{}'", key);
        }
        value
    }

    // == Set ==
    /// Stores `value` under `key`. A `None` TTL means the configured
    /// default.
    pub async fn set(&self, key: &str, value: S::Value, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let mut state = self.state.write().await;
        let CacheState { store, stats } = &mut *state;

        if let Some(evicted) = store.set(key.to_string(), CacheEntry::new(value, ttl)) {
            stats.record_eviction();
            debug!("evicted '{}' to make room for '{}'", evicted, key);
        }
        stats.set_total_entries(store.len());
    }

    // == Get Or Fetch ==
    /// The read-through entry point: serves the cached value while fresh,
    /// otherwise awaits `producer` and stores its result under `key`.
    ///
    /// On a miss the producer runs exactly once for this call. A producer
    /// error propagates verbatim and writes nothing, so a stale (or absent)
    /// entry survives a failed refresh. A `None` TTL means the configured
    /// default.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use ledger_cache::{MemoryStore, QueryCache};
    ///
    /// # tokio_test::block_on(async {
    /// let cache: QueryCache<MemoryStore<u32>> = QueryCache::with_defaults();
    ///
    /// let answer = cache
    ///     .get_or_fetch("answer", Some(Duration::from_secs(60)), || async {
    ///         Ok::<_, String>(42)
    ///     })
    ///     .await
    ///     .unwrap();
    ///
    /// assert_eq!(answer, 42);
    /// # });
    /// ```
    pub async fn get_or_fetch<E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<S::Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S::Value, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        self.refresh(key, ttl, producer).await
    }

    // == Refresh ==
    /// Always awaits the producer, bypassing freshness, and overwrites the
    /// entry on success.
    ///
    /// Backs both the miss path of [`get_or_fetch`](Self::get_or_fetch) and
    /// explicit refetches. The lock is not held while the producer runs.
    pub async fn refresh<E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<S::Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<S::Value, E>>,
    {
        let started = Instant::now();
        let result = producer().await;
        let elapsed = started.elapsed();

        if elapsed >= self.config.slow_fetch_threshold {
            warn!("slow fetch for '{}': {} ms", key, elapsed.as_millis());
        } else {
            debug!("fetched '{}' in {} ms", key, elapsed.as_millis());
        }

        match result {
            Ok(value) => {
                self.set(key, value.clone(), ttl).await;
                Ok(value)
            }
            Err(err) => {
                debug!("fetch for '{}' failed, leaving any prior entry in place", key);
                Err(err)
            }
        }
    }
}
