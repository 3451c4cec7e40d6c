//! Models Module
//!
//! Domain rows as the backend returns them, plus the report aggregations
//! computed from them.

mod reports;
mod rows;

// Re-export public types
pub use reports::{BudgetProgress, BudgetStatus, CategoryShare, MonthlyStats};
pub use rows::{
    Asset, Budget, BudgetPeriod, Category, NewAsset, NewTransaction, Transaction, TransactionKind,
};
