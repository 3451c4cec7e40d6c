//! Store Backends
//!
//! The key-value abstraction behind the query cache plus the default
//! unbounded in-memory implementation. [`QueryCache`](crate::cache::QueryCache)
//! owns freshness decisions, statistics and logging; a backend only has to be
//! an honest map from key to entry.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Store Trait ==
/// Storage backend for cached query results.
///
/// Backends return entries fresh or stale alike and never consult the clock
/// themselves, except in [`cleanup_expired`](CacheStore::cleanup_expired).
/// Implementations may bound their size by evicting on
/// [`set`](CacheStore::set).
pub trait CacheStore: Send + Sync + 'static {
    /// Payload type held by the entries.
    type Value;

    /// Returns the entry for `key`, fresh or stale.
    ///
    /// Takes `&mut self` so backends can update recency bookkeeping.
    fn get(&mut self, key: &str) -> Option<&CacheEntry<Self::Value>>;

    /// Stores an entry under `key`, replacing any previous one.
    ///
    /// Returns the key of an entry evicted to make room, if any.
    fn set(&mut self, key: String, entry: CacheEntry<Self::Value>) -> Option<String>;

    /// Removes the entry for `key`; returns whether one was present.
    fn delete(&mut self, key: &str) -> bool;

    /// Removes every entry whose key contains `pattern`; returns the count.
    fn delete_matching(&mut self, pattern: &str) -> usize;

    /// Removes every entry whose freshness window has lapsed; returns the
    /// count.
    fn cleanup_expired(&mut self) -> usize;

    /// Removes all entries; returns how many were dropped.
    fn clear(&mut self) -> usize;

    /// Number of stored entries, fresh and stale alike.
    fn len(&self) -> usize;

    /// Returns true when the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Memory Store ==
/// Unbounded `HashMap` backend, the default for a per-process query cache.
///
/// Nothing is evicted except by invalidation or the TTL cleanup sweep. Use
/// [`BoundedStore`](crate::cache::BoundedStore) when the entry count must
/// stay capped.
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V> MemoryStore<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + Sync + 'static> CacheStore for MemoryStore<V> {
    type Value = V;

    fn get(&mut self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    fn set(&mut self, key: String, entry: CacheEntry<V>) -> Option<String> {
        self.entries.insert(key, entry);
        None
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn delete_matching(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        before - self.entries.len()
    }

    fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        before - self.entries.len()
    }

    fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_store_new_is_empty() {
        let store: MemoryStore<String> = MemoryStore::new();

        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = MemoryStore::new();

        store.set("key1".to_string(), CacheEntry::new("value1", TTL));
        let entry = store.get("key1").unwrap();

        assert_eq!(entry.value, "value1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store: MemoryStore<String> = MemoryStore::new();

        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_returns_stale_entries() {
        // Freshness is the wrapper's concern, the backend keeps stale
        // entries addressable until something deletes them.
        let mut store = MemoryStore::new();

        store.set("key1".to_string(), CacheEntry::new("value1", Duration::ZERO));

        let entry = store.get("key1").unwrap();
        assert!(!entry.is_fresh());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = MemoryStore::new();

        store.set("key1".to_string(), CacheEntry::new("value1", TTL));
        store.set("key1".to_string(), CacheEntry::new("value2", TTL));

        assert_eq!(store.get("key1").unwrap().value, "value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_delete() {
        let mut store = MemoryStore::new();

        store.set("key1".to_string(), CacheEntry::new("value1", TTL));

        assert!(store.delete("key1"));
        assert!(store.is_empty());
        assert!(!store.delete("key1"));
    }

    #[test]
    fn test_store_delete_matching() {
        let mut store = MemoryStore::new();

        store.set("transactions_u1_0_20".to_string(), CacheEntry::new("a", TTL));
        store.set("transactions_u1_1_20".to_string(), CacheEntry::new("b", TTL));
        store.set("categories_u1".to_string(), CacheEntry::new("c", TTL));

        let removed = store.delete_matching("transactions");

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("categories_u1").is_some());
    }

    #[test]
    fn test_store_delete_matching_no_match() {
        let mut store = MemoryStore::new();

        store.set("categories_u1".to_string(), CacheEntry::new("c", TTL));

        assert_eq!(store.delete_matching("budgets"), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = MemoryStore::new();

        store.set("short".to_string(), CacheEntry::new("a", Duration::from_millis(20)));
        store.set("long".to_string(), CacheEntry::new("b", TTL));

        sleep(Duration::from_millis(50));

        let removed = store.cleanup_expired();

        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("long").is_some());
    }

    #[test]
    fn test_store_clear() {
        let mut store = MemoryStore::new();

        store.set("key1".to_string(), CacheEntry::new("a", TTL));
        store.set("key2".to_string(), CacheEntry::new("b", TTL));

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }
}
