//! Ledger Cache Demo
//!
//! Runs a scripted dashboard session against a seeded in-memory backend
//! with artificial latency: cold and warm reads, a reactive binding, a
//! write with pattern invalidation, a forced refetch, and a stats dump.

mod cache;
mod config;
mod data;
mod error;
mod models;
mod tasks;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache::{QueryBinding, QueryCache};
use config::CacheConfig;
use data::{keys, DataService, DataSource, MemorySource};
use error::DataError;
use models::{BudgetProgress, NewAsset, NewTransaction, TransactionKind};
use tasks::spawn_cleanup_task;

const USER: &str = "u1";

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load cache configuration from environment variables
/// 3. Seed the in-memory backend with a month of data
/// 4. Start the background TTL cleanup task
/// 5. Run the scripted dashboard session
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting ledger-cache demo");

    let config = CacheConfig::from_env();
    info!(
        "configuration loaded: default_ttl={:?}, sweep_interval={:?}, slow_fetch_threshold={:?}",
        config.default_ttl, config.sweep_interval, config.slow_fetch_threshold
    );

    let source = MemorySource::new().with_latency(Duration::from_millis(150));
    seed(&source).await?;

    let cache = QueryCache::new(config.clone());
    let service = DataService::new(cache.clone(), Arc::new(source.clone()), None);

    let cleanup_handle = spawn_cleanup_task(cache.clone(), config.sweep_interval);
    info!("background cleanup task started");

    let today = Utc::now().date_naive();

    // Cold read pays the backend latency, the warm read is served in-memory.
    let started = Instant::now();
    let page = service.transactions_page(USER, 0, 20).await?;
    info!("cold read: {} transactions in {:?}", page.len(), started.elapsed());

    let started = Instant::now();
    service.transactions_page(USER, 0, 20).await?;
    info!("warm read served in {:?}", started.elapsed());

    // A view mounts a binding on the asset list and waits for it to settle.
    let binding_source = source.clone();
    let binding: QueryBinding<_, DataError> =
        QueryBinding::mount(cache.clone(), keys::assets(USER), None, move || {
            let source = binding_source.clone();
            async move {
                let assets = source.fetch_assets(USER).await?;
                serde_json::to_value(assets).map_err(DataError::from)
            }
        })
        .await;
    let state = binding.settled().await;
    info!(
        "asset binding settled: loading={}, assets={}",
        state.loading,
        state.data.as_ref().and_then(|v| v.as_array().map(Vec::len)).unwrap_or(0)
    );

    // Recording an expense invalidates every transaction page and monthly
    // summary by pattern; the next reads refetch.
    service
        .add_transaction(NewTransaction {
            user_id: USER.to_string(),
            amount: -4_800,
            kind: TransactionKind::Expense,
            category_id: "cat-food".to_string(),
            description: "dinner".to_string(),
            date: today,
        })
        .await?;
    let page = service.transactions_page(USER, 0, 20).await?;
    info!("after write: {} transactions (refetched)", page.len());

    let stats = service.monthly_stats(USER, today.year(), today.month()).await?;
    info!(
        "monthly summary {}: income={}, expenses={}, net={}",
        stats.month, stats.total_income, stats.total_expenses, stats.net
    );

    for budget in service.budgets(USER).await? {
        let month_txs = source
            .fetch_transactions_for_month(USER, today.year(), today.month())
            .await?;
        let progress = BudgetProgress::compute(&budget, &month_txs);
        info!(
            "budget {}: spent {}/{} ({:.1}%, {:?})",
            budget.category_id, progress.spent, progress.budget_amount,
            progress.percentage, progress.status
        );
    }

    // The binding refetches after an asset write.
    service
        .add_asset(NewAsset {
            user_id: USER.to_string(),
            name: "Cash".to_string(),
            kind: "cash".to_string(),
            balance: 52_000,
            note: None,
        })
        .await?;
    binding.refetch().await;
    let state = binding.settled().await;
    info!(
        "asset binding after write: assets={}",
        state.data.as_ref().and_then(|v| v.as_array().map(Vec::len)).unwrap_or(0)
    );

    let stats = service.cache_stats().await;
    info!(
        "cache stats: hits={}, misses={}, entries={}, hit_rate={:.2}",
        stats.hits, stats.misses, stats.total_entries, stats.hit_rate()
    );

    cleanup_handle.abort();
    info!("demo complete");
    Ok(())
}

/// Seeds a month of plausible dashboard data for one user.
async fn seed(source: &MemorySource) -> Result<()> {
    let today = Utc::now().date_naive();
    let month_day = |day: u32| {
        NaiveDate::from_ymd_opt(today.year(), today.month(), day).unwrap_or(today)
    };

    source
        .insert_transaction(NewTransaction {
            user_id: USER.to_string(),
            amount: 320_000,
            kind: TransactionKind::Income,
            category_id: "cat-salary".to_string(),
            description: "salary".to_string(),
            date: month_day(1),
        })
        .await?;
    source
        .insert_transaction(NewTransaction {
            user_id: USER.to_string(),
            amount: -68_000,
            kind: TransactionKind::Expense,
            category_id: "cat-food".to_string(),
            description: "groceries".to_string(),
            date: month_day(5),
        })
        .await?;
    source
        .insert_transaction(NewTransaction {
            user_id: USER.to_string(),
            amount: -12_500,
            kind: TransactionKind::Expense,
            category_id: "cat-transport".to_string(),
            description: "commuter pass".to_string(),
            date: month_day(8),
        })
        .await?;

    source
        .seed_budgets([models::Budget {
            id: "b1".to_string(),
            user_id: USER.to_string(),
            category_id: "cat-food".to_string(),
            amount: 80_000,
            period: models::BudgetPeriod::Monthly,
            start_date: month_day(1),
            end_date: month_day(28),
            created_at: Utc::now(),
        }])
        .await;

    Ok(())
}
