//! Cache Module
//!
//! Read-through memoization for asynchronous queries: string keys, per-entry
//! TTL freshness, invalidation by exact key or key substring, and a reactive
//! binding for view code.

mod binding;
mod entry;
mod lru;
mod query;
mod stats;
mod store;


// Re-export public types
pub use binding::{QueryBinding, QueryState};
pub use entry::CacheEntry;
pub use lru::{BoundedStore, LruTracker};
pub use query::QueryCache;
pub use stats::CacheStats;
pub use store::{CacheStore, MemoryStore};
