//! Bounded Store Module
//!
//! A capacity-limited backend with least-recently-used eviction, for callers
//! that want the cache to hold at most N query results.

use std::collections::{HashMap, VecDeque};

use crate::cache::{CacheEntry, CacheStore};

// == LRU Tracker ==
/// Access-order bookkeeping for [`BoundedStore`].
///
/// Keys live in a VecDeque where the front is the most recently used key and
/// the back the least recently used one.
#[derive(Debug, Default)]
pub struct LruTracker {
    order: VecDeque<String>,
}

impl LruTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used, tracking it if it is new.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Drops a key from the tracking order.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key, None when empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Peek Oldest ==
    /// The least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    // == Clear ==
    /// Forgets every tracked key.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks whether a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}

// == Bounded Store ==
/// Backend holding at most `capacity` entries.
///
/// When an insert would exceed the capacity the least recently used entry is
/// evicted first. Both reads and writes refresh recency.
#[derive(Debug)]
pub struct BoundedStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    capacity: usize,
}

impl<V> BoundedStore<V> {
    // == Constructor ==
    /// Creates a store that never holds more than `capacity` entries.
    ///
    /// A zero capacity is bumped to one so the store stays usable.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            capacity: capacity.max(1),
        }
    }

    /// The configured entry limit.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V: Send + Sync + 'static> CacheStore for BoundedStore<V> {
    type Value = V;

    fn get(&mut self, key: &str) -> Option<&CacheEntry<V>> {
        if self.entries.contains_key(key) {
            self.lru.touch(key);
        }
        self.entries.get(key)
    }

    fn set(&mut self, key: String, entry: CacheEntry<V>) -> Option<String> {
        let mut evicted = None;

        // Overwrites never need room; fresh inserts at capacity evict the
        // least recently used entry first.
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.lru.evict_oldest() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, entry);
        evicted
    }

    fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            true
        } else {
            false
        }
    }

    fn delete_matching(&mut self, pattern: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        for key in &matching {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        matching.len()
    }

    fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        expired.len()
    }

    fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        dropped
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
