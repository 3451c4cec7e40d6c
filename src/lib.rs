//! Ledger Cache - a read-through query cache for a finance dashboard
//!
//! Memoizes asynchronous query results under string keys with per-entry TTL
//! freshness, invalidation by exact key or substring pattern, and a reactive
//! binding for view code. Ships with the dashboard's data layer: domain
//! rows, report aggregations, and a cached data service over a pluggable
//! backend seam.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::{
    BoundedStore, CacheEntry, CacheStats, CacheStore, MemoryStore, QueryBinding, QueryCache,
    QueryState,
};
pub use config::CacheConfig;
pub use data::{DataService, DataSource, MemorySource, SharedCache};
pub use error::{DataError, Result};
pub use tasks::spawn_cleanup_task;
