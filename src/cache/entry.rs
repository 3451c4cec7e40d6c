//! Cache Entry Module
//!
//! A single memoized query result together with the bookkeeping needed to
//! decide whether it may still be served.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A stored producer result and its freshness window.
///
/// An entry is fresh while `now - stored_at < ttl` (strictly less), so an
/// entry stored with a zero TTL is never fresh and every lookup for its key
/// falls through to the producer.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The memoized value.
    pub value: V,
    /// When the value was stored.
    pub stored_at: Instant,
    /// How long the value may be served after `stored_at`.
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with the current instant.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    // == Is Fresh ==
    /// Returns true while the entry may still be served.
    pub fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }

    // == Age ==
    /// Time elapsed since the value was stored.
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    // == TTL Remaining ==
    /// Freshness window still ahead of the entry, zero once expired.
    ///
    /// Useful for debugging and statistics purposes.
    pub fn ttl_remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.stored_at.elapsed())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_fresh_when_stored() {
        let entry = CacheEntry::new("value", Duration::from_secs(60));

        assert!(entry.is_fresh());
        assert!(entry.ttl_remaining() > Duration::ZERO);
    }

    #[test]
    fn test_entry_zero_ttl_never_fresh() {
        let entry = CacheEntry::new("value", Duration::ZERO);

        assert!(!entry.is_fresh());
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new("value", Duration::from_millis(30));

        assert!(entry.is_fresh());

        sleep(Duration::from_millis(60));

        assert!(!entry.is_fresh());
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_entry_age_grows() {
        let entry = CacheEntry::new("value", Duration::from_secs(60));
        let first = entry.age();

        sleep(Duration::from_millis(20));

        assert!(entry.age() > first);
    }

    #[test]
    fn test_ttl_remaining_shrinks() {
        let entry = CacheEntry::new("value", Duration::from_millis(200));
        let first = entry.ttl_remaining();

        sleep(Duration::from_millis(40));

        assert!(entry.ttl_remaining() < first);
    }
}
