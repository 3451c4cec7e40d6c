//! Data Service Module
//!
//! The dashboard's consumer wiring: every read goes through one shared
//! [`QueryCache`] under the key conventions of [`keys`](crate::data::keys),
//! and every write invalidates by resource-name pattern so all cached
//! parameterizations of the touched resources drop at once.
//!
//! Payloads are cached as `serde_json::Value` so transaction pages, monthly
//! summaries and reference lists share a single store; row validation
//! happens above the cache on the fetch path, never inside it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheStats, MemoryStore, QueryCache};
use crate::data::{keys, DataSource};
use crate::error::{DataError, Result};
use crate::models::{
    Asset, Budget, Category, MonthlyStats, NewAsset, NewTransaction, Transaction, TransactionKind,
};

/// The cache type the service reads through.
pub type SharedCache = QueryCache<MemoryStore<serde_json::Value>>;

// == Data Service ==
/// Cached reads and invalidating writes over a [`DataSource`].
///
/// Cloning shares both the cache and the source, so every view holding a
/// service handle sees the same cached data.
#[derive(Clone)]
pub struct DataService {
    cache: SharedCache,
    source: Arc<dyn DataSource>,
    ttl: Option<Duration>,
}

impl DataService {
    // == Constructor ==
    /// Wires a source to a cache. A `None` TTL means the cache's configured
    /// default for every read.
    pub fn new(cache: SharedCache, source: Arc<dyn DataSource>, ttl: Option<Duration>) -> Self {
        Self { cache, source, ttl }
    }

    /// The shared cache, for bindings and for direct invalidation.
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == Cached Reads ==
    /// One page of the user's transactions, validated and newest first.
    pub async fn transactions_page(
        &self,
        user_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Transaction>> {
        let key = keys::transactions(user_id, page, page_size);
        let source = self.source.clone();
        let user = user_id.to_string();

        let value = self
            .cache
            .get_or_fetch(&key, self.ttl, || async move {
                let rows = source.fetch_transactions(&user, page, page_size).await?;
                to_payload(validate_rows(rows))
            })
            .await?;
        from_payload(value)
    }

    /// The user's monthly summary, computed from that month's transactions
    /// and cached as a whole under the period key.
    pub async fn monthly_stats(&self, user_id: &str, year: i32, month: u32) -> Result<MonthlyStats> {
        let key = keys::monthly_stats(user_id, year, month);
        let source = self.source.clone();
        let user = user_id.to_string();

        let value = self
            .cache
            .get_or_fetch(&key, self.ttl, || async move {
                let rows = validate_rows(source.fetch_transactions_for_month(&user, year, month).await?);
                let categories = source.fetch_categories(&user, None).await?;
                let stats =
                    MonthlyStats::compute(format!("{:04}-{:02}", year, month), &rows, &categories);
                to_payload(stats)
            })
            .await?;
        from_payload(value)
    }

    /// The user's categories, optionally narrowed to one kind.
    pub async fn categories(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>> {
        let key = keys::categories(user_id, kind);
        let source = self.source.clone();
        let user = user_id.to_string();

        let value = self
            .cache
            .get_or_fetch(&key, self.ttl, || async move {
                to_payload(source.fetch_categories(&user, kind).await?)
            })
            .await?;
        from_payload(value)
    }

    /// The user's budgets.
    pub async fn budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        let key = keys::budgets(user_id);
        let source = self.source.clone();
        let user = user_id.to_string();

        let value = self
            .cache
            .get_or_fetch(&key, self.ttl, || async move {
                to_payload(source.fetch_budgets(&user).await?)
            })
            .await?;
        from_payload(value)
    }

    /// The user's assets.
    pub async fn assets(&self, user_id: &str) -> Result<Vec<Asset>> {
        let key = keys::assets(user_id);
        let source = self.source.clone();
        let user = user_id.to_string();

        let value = self
            .cache
            .get_or_fetch(&key, self.ttl, || async move {
                to_payload(source.fetch_assets(&user).await?)
            })
            .await?;
        from_payload(value)
    }

    // == Invalidating Writes ==
    /// Inserts a transaction, then drops every cached transaction page and
    /// monthly summary so the next read reflects the write.
    pub async fn add_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        let row = self.source.insert_transaction(new).await?;
        self.invalidate_transaction_views().await;
        Ok(row)
    }

    /// Deletes a transaction with the same invalidation as an insert.
    pub async fn remove_transaction(&self, id: &str) -> Result<()> {
        self.source.delete_transaction(id).await?;
        self.invalidate_transaction_views().await;
        Ok(())
    }

    /// Inserts an asset and drops the cached asset lists.
    pub async fn add_asset(&self, new: NewAsset) -> Result<Asset> {
        let row = self.source.insert_asset(new).await?;
        self.cache.invalidate_by_pattern(keys::ASSETS_PATTERN).await;
        Ok(row)
    }

    async fn invalidate_transaction_views(&self) {
        self.cache
            .invalidate_by_pattern(keys::TRANSACTIONS_PATTERN)
            .await;
        self.cache
            .invalidate_by_pattern(keys::MONTHLY_STATS_PATTERN)
            .await;
        debug!("invalidated transaction and monthly summary caches after write");
    }

    // == Stats ==
    /// Effectiveness counters of the shared cache.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

// == Payload Helpers ==
/// Drops rows the backend returned in an inconsistent shape. This is the
/// application-level filter layered above the cache; the cache itself stores
/// whatever its producer returns.
fn validate_rows(rows: Vec<Transaction>) -> Vec<Transaction> {
    let total = rows.len();
    let valid: Vec<Transaction> = rows.into_iter().filter(Transaction::is_valid).collect();
    if valid.len() < total {
        warn!("dropped {} invalid transaction rows from fetch", total - valid.len());
    }
    valid
}

fn to_payload<T: serde::Serialize>(rows: T) -> Result<serde_json::Value> {
    serde_json::to_value(rows).map_err(DataError::from)
}

fn from_payload<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(DataError::from)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemorySource;
    use chrono::NaiveDate;

    fn new_tx(user: &str, day: u32, amount: i64) -> NewTransaction {
        NewTransaction {
            user_id: user.to_string(),
            amount,
            kind: if amount >= 0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            },
            category_id: "cat-food".to_string(),
            description: "test".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
        }
    }

    fn service_over(source: MemorySource) -> DataService {
        DataService::new(QueryCache::with_defaults(), Arc::new(source), None)
    }

    #[tokio::test]
    async fn test_second_page_read_is_a_cache_hit() {
        let source = MemorySource::new();
        source.insert_transaction(new_tx("u1", 1, -500)).await.unwrap();
        let service = service_over(source);

        let first = service.transactions_page("u1", 0, 20).await.unwrap();
        let second = service.transactions_page("u1", 0, 20).await.unwrap();

        assert_eq!(first, second);
        let stats = service.cache_stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_write_invalidates_transaction_views_only() {
        let source = MemorySource::new();
        source.insert_transaction(new_tx("u1", 1, -500)).await.unwrap();
        let service = service_over(source);

        // Warm three resources.
        service.transactions_page("u1", 0, 20).await.unwrap();
        service.monthly_stats("u1", 2024, 6).await.unwrap();
        service.categories("u1", None).await.unwrap();
        assert_eq!(service.cache().len().await, 3);

        service.add_transaction(new_tx("u1", 2, -800)).await.unwrap();

        // Only the category list survived the write.
        assert_eq!(service.cache().len().await, 1);
        let page = service.transactions_page("u1", 0, 20).await.unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_monthly_stats_caches_the_computed_summary() {
        let source = MemorySource::new();
        source.insert_transaction(new_tx("u1", 1, 300_000)).await.unwrap();
        source.insert_transaction(new_tx("u1", 5, -120_000)).await.unwrap();
        let service = service_over(source.clone());

        let stats = service.monthly_stats("u1", 2024, 6).await.unwrap();
        assert_eq!(stats.net, 180_000);

        // A write behind the cache's back is not observed until invalidation.
        source.insert_transaction(new_tx("u1", 6, -60_000)).await.unwrap();
        let cached = service.monthly_stats("u1", 2024, 6).await.unwrap();
        assert_eq!(cached.net, 180_000);

        service.cache().invalidate(&keys::monthly_stats("u1", 2024, 6)).await;
        let refreshed = service.monthly_stats("u1", 2024, 6).await.unwrap();
        assert_eq!(refreshed.net, 120_000);
    }

    #[tokio::test]
    async fn test_invalid_rows_are_filtered_above_the_cache() {
        let source = MemorySource::new();
        let mut bad = new_tx("u1", 2, 999).into_row("tx-bad");
        bad.kind = TransactionKind::Expense; // positive expense, fails validation
        source.seed_transactions([new_tx("u1", 1, -500).into_row("tx-ok"), bad]).await;
        let service = service_over(source);

        let page = service.transactions_page("u1", 0, 20).await.unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "tx-ok");
    }

    #[tokio::test]
    async fn test_add_asset_invalidates_asset_lists() {
        let source = MemorySource::new();
        let service = service_over(source);

        assert!(service.assets("u1").await.unwrap().is_empty());
        service
            .add_asset(NewAsset {
                user_id: "u1".to_string(),
                name: "Cash".to_string(),
                kind: "cash".to_string(),
                balance: 20_000,
                note: None,
            })
            .await
            .unwrap();

        let assets = service.assets("u1").await.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].name, "Cash");
    }

    #[tokio::test]
    async fn test_source_failure_propagates_and_leaves_cache_clean() {
        let service = service_over(MemorySource::new());

        let err = service.remove_transaction("tx-missing").await.unwrap_err();

        assert!(matches!(err, DataError::NotFound(_)));
    }
}
