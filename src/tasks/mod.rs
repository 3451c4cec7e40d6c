//! Background Tasks Module
//!
//! Periodic maintenance running alongside the cache.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired cache entries at a configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
