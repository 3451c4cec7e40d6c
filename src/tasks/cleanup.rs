//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries out of a
//! [`QueryCache`]. Purely an occupancy optimization: correctness never
//! depends on the sweep because freshness is re-checked on every read.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, QueryCache};

/// Spawns a background task that periodically removes expired cache entries.
///
/// The task sleeps for `interval` between sweeps and runs until its handle
/// is aborted, typically during shutdown of the owning process.
pub fn spawn_cleanup_task<S: CacheStore>(cache: QueryCache<S>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting TTL cleanup task, sweeping every {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                info!("TTL cleanup removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup found no expired entries");
            }
        }
    })
}
