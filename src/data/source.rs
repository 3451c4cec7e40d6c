//! Data Source Module
//!
//! The seam standing in for the hosted backend. [`DataSource`] is the
//! operation set the dashboard actually issues: paged and per-month
//! transaction reads, the per-user reference lists, and the writes.
//! [`MemorySource`] implements it over in-memory tables with optional
//! artificial latency, which is what the tests and the demo run against;
//! a real backend client would implement the same trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Datelike;
use tokio::sync::RwLock;
use tokio::time::sleep;

use crate::error::{DataError, Result};
use crate::models::{
    Asset, Budget, Category, NewAsset, NewTransaction, Transaction, TransactionKind,
};

// == Data Source Trait ==
/// Backend operations the data service reads through the cache.
///
/// All reads are scoped to one user, which the hosted backend enforces with
/// row-level security; implementations here just filter.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// One page of a user's transactions, newest date first.
    async fn fetch_transactions(
        &self,
        user_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Transaction>>;

    /// Every transaction of a user dated inside the given month.
    async fn fetch_transactions_for_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<Transaction>>;

    /// A user's categories, optionally narrowed to one kind, sorted by name.
    async fn fetch_categories(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>>;

    /// A user's budgets.
    async fn fetch_budgets(&self, user_id: &str) -> Result<Vec<Budget>>;

    /// A user's assets.
    async fn fetch_assets(&self, user_id: &str) -> Result<Vec<Asset>>;

    /// Inserts a transaction and returns the stored row.
    async fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction>;

    /// Deletes a transaction by id.
    async fn delete_transaction(&self, id: &str) -> Result<()>;

    /// Inserts an asset and returns the stored row.
    async fn insert_asset(&self, new: NewAsset) -> Result<Asset>;
}

// == Tables ==
#[derive(Default)]
struct Tables {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    budgets: Vec<Budget>,
    assets: Vec<Asset>,
    next_id: u64,
}

// == Memory Source ==
/// In-memory [`DataSource`] for tests and the demo.
///
/// Cloning shares the tables. The optional latency is applied to every
/// operation so cache hits are visibly cheaper than fetches.
#[derive(Clone, Default)]
pub struct MemorySource {
    tables: Arc<RwLock<Tables>>,
    latency: Option<Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artificial delay before every operation.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    // == Seeding ==
    pub async fn seed_transactions(&self, rows: impl IntoIterator<Item = Transaction>) {
        self.tables.write().await.transactions.extend(rows);
    }

    pub async fn seed_categories(&self, rows: impl IntoIterator<Item = Category>) {
        self.tables.write().await.categories.extend(rows);
    }

    pub async fn seed_budgets(&self, rows: impl IntoIterator<Item = Budget>) {
        self.tables.write().await.budgets.extend(rows);
    }

    pub async fn seed_assets(&self, rows: impl IntoIterator<Item = Asset>) {
        self.tables.write().await.assets.extend(rows);
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_transactions(
        &self,
        user_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Transaction>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;

        let mut rows: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(rows
            .into_iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .collect())
    }

    async fn fetch_transactions_for_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<Transaction>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;

        Ok(tables
            .transactions
            .iter()
            .filter(|t| {
                t.user_id == user_id && t.date.year() == year && t.date.month() == month
            })
            .cloned()
            .collect())
    }

    async fn fetch_categories(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Category>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;

        let mut rows: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| c.user_id == user_id && kind.map_or(true, |k| c.kind == k))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn fetch_budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        Ok(tables
            .budgets
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn fetch_assets(&self, user_id: &str) -> Result<Vec<Asset>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        Ok(tables
            .assets
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;

        tables.next_id += 1;
        let row = new.into_row(format!("tx-{}", tables.next_id));
        tables.transactions.push(row.clone());
        Ok(row)
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;

        let before = tables.transactions.len();
        tables.transactions.retain(|t| t.id != id);
        if tables.transactions.len() == before {
            return Err(DataError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn insert_asset(&self, new: NewAsset) -> Result<Asset> {
        self.simulate_latency().await;
        let mut tables = self.tables.write().await;

        tables.next_id += 1;
        let row = new.into_row(format!("asset-{}", tables.next_id));
        tables.assets.push(row.clone());
        Ok(row)
    }
}
