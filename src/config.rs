//! Configuration Module
//!
//! Cache tuning knobs, loadable from environment variables with defaults
//! matching the dashboard's behavior: serve cached query results for five
//! minutes unless a caller says otherwise.

use std::env;
use std::time::Duration;

/// Default freshness window applied when neither the caller nor the
/// environment picks one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache configuration parameters.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Freshness window used when a caller passes no TTL.
    pub default_ttl: Duration,
    /// How often the background cleanup task sweeps expired entries.
    pub sweep_interval: Duration,
    /// Producer calls slower than this are logged at warn level.
    pub slow_fetch_threshold: Duration,
}

impl CacheConfig {
    /// Creates a config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_SECS` - Default TTL in seconds (default: 300)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Cleanup frequency in seconds (default: 30)
    /// - `CACHE_SLOW_FETCH_MS` - Slow fetch log threshold in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        Self {
            default_ttl: Duration::from_secs(env_u64("CACHE_DEFAULT_TTL_SECS", 300)),
            sweep_interval: Duration::from_secs(env_u64("CACHE_SWEEP_INTERVAL_SECS", 30)),
            slow_fetch_threshold: Duration::from_millis(env_u64("CACHE_SLOW_FETCH_MS", 1_000)),
        }
    }

    /// Replaces the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Replaces the cleanup sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Replaces the slow fetch log threshold.
    pub fn with_slow_fetch_threshold(mut self, threshold: Duration) -> Self {
        self.slow_fetch_threshold = threshold;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            sweep_interval: Duration::from_secs(30),
            slow_fetch_threshold: Duration::from_millis(1_000),
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
