//! Domain Rows
//!
//! The finance-dashboard row types as the hosted backend returns them:
//! transactions, categories, budgets and assets, all keyed by caller-owned
//! string ids and scoped to a user. Amounts are signed minor units and
//! expenses are stored negative, so summing a mixed slice nets out directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// == Transaction Kind ==
/// Whether a transaction adds to or draws from the user's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The lowercase wire name, also used in cache-key segments.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

// == Transaction ==
/// A single income or expense row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    /// Signed minor units; expense rows carry a negative amount.
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: String,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Magnitude of the amount, for report sums that ignore sign.
    pub fn abs_amount(&self) -> i64 {
        self.amount.abs()
    }

    /// Returns true when the row is internally consistent: non-empty ids
    /// and an amount sign matching the kind.
    ///
    /// The backend occasionally returns rows that fail this (the amount
    /// sign convention predates some of the stored data); the data service
    /// filters them out above the cache.
    pub fn is_valid(&self) -> bool {
        if self.id.is_empty() || self.user_id.is_empty() {
            return false;
        }
        match self.kind {
            TransactionKind::Income => self.amount >= 0,
            TransactionKind::Expense => self.amount <= 0,
        }
    }
}

// == New Transaction ==
/// Insert payload for a transaction; the backend assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: String,
    pub description: String,
    pub date: NaiveDate,
}

impl NewTransaction {
    /// Materializes the row the way the backend would, stamping `id` and
    /// the current time.
    pub fn into_row(self, id: impl Into<String>) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: id.into(),
            user_id: self.user_id,
            amount: self.amount,
            kind: self.kind,
            category_id: self.category_id,
            description: self.description,
            date: self.date,
            created_at: now,
            updated_at: now,
        }
    }
}

// == Category ==
/// A user-defined transaction category with its display attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Hex color used by the charts, e.g. `#EF4444`.
    pub color: String,
    pub icon: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

// == Budget Period ==
/// Granularity over which a budget amount applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Monthly,
    Weekly,
    Yearly,
}

// == Budget ==
/// A spending limit for one category over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    /// Budgeted amount in minor units, always positive.
    pub amount: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// == Asset ==
/// A tracked account or holding, e.g. a bank account or cash on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Free-form asset class, e.g. "bank", "cash", "securities".
    #[serde(rename = "type")]
    pub kind: String,
    /// Current balance in minor units.
    pub balance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// == New Asset ==
/// Insert payload for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAsset {
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub balance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NewAsset {
    pub fn into_row(self, id: impl Into<String>) -> Asset {
        let now = Utc::now();
        Asset {
            id: id.into(),
            user_id: self.user_id,
            name: self.name,
            kind: self.kind,
            balance: self.balance,
            note: self.note,
            created_at: now,
            updated_at: now,
        }
    }
}
