//! Report Aggregations
//!
//! In-memory reductions over transaction slices: the monthly income/expense
//! summary with its per-category breakdown, and budget progress with the
//! over/warning thresholds the budget screen colors by. All sums use
//! absolute amounts so the stored sign convention never flips a report.

use serde::{Deserialize, Serialize};

use crate::models::{Budget, Category, Transaction, TransactionKind};

/// Budgets at or past this percentage are over.
const OVER_THRESHOLD: f64 = 100.0;
/// Budgets at or past this percentage get a warning.
const WARNING_THRESHOLD: f64 = 80.0;

// == Category Share ==
/// One category's slice of a month's expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category_id: String,
    pub name: String,
    pub color: String,
    /// Absolute amount spent in the category, minor units.
    pub amount: i64,
    /// Share of the month's total expenses, 0–100.
    pub percentage: f64,
}

// == Monthly Stats ==
/// Aggregated view of one user-month of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    /// Period label, `YYYY-MM`.
    pub month: String,
    pub total_income: i64,
    pub total_expenses: i64,
    /// `total_income - total_expenses`; negative when spending exceeded
    /// income.
    pub net: i64,
    /// Expense breakdown, largest share first.
    pub breakdown: Vec<CategoryShare>,
}

impl MonthlyStats {
    // == Compute ==
    /// Reduces a month's transactions into the summary the dashboard and
    /// reports screens render.
    ///
    /// Categories only label the breakdown; an expense whose category is
    /// missing from `categories` still counts, under its raw id.
    pub fn compute(month: impl Into<String>, transactions: &[Transaction], categories: &[Category]) -> Self {
        let total_income: i64 = transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Income)
            .map(Transaction::abs_amount)
            .sum();
        let total_expenses: i64 = transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
            .map(Transaction::abs_amount)
            .sum();

        // Sum expenses per category, preserving first-seen order before the
        // final sort so equal amounts stay deterministic.
        let mut order: Vec<String> = Vec::new();
        let mut spent: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
        for tx in transactions.iter().filter(|t| t.kind == TransactionKind::Expense) {
            if !spent.contains_key(&tx.category_id) {
                order.push(tx.category_id.clone());
            }
            *spent.entry(tx.category_id.clone()).or_insert(0) += tx.abs_amount();
        }

        let mut breakdown: Vec<CategoryShare> = order
            .into_iter()
            .map(|category_id| {
                let amount = spent[&category_id];
                let percentage = if total_expenses > 0 {
                    amount as f64 / total_expenses as f64 * 100.0
                } else {
                    0.0
                };
                let labels = categories.iter().find(|c| c.id == category_id);
                CategoryShare {
                    name: labels.map_or_else(|| category_id.clone(), |c| c.name.clone()),
                    color: labels.map_or_else(String::new, |c| c.color.clone()),
                    category_id,
                    amount,
                    percentage,
                }
            })
            .collect();
        breakdown.sort_by(|a, b| b.amount.cmp(&a.amount));

        Self {
            month: month.into(),
            total_income,
            total_expenses,
            net: total_income - total_expenses,
            breakdown,
        }
    }
}

// == Budget Status ==
/// Traffic-light classification of budget consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Ok,
    Warning,
    Over,
}

// == Budget Progress ==
/// How far one budget has been consumed by the expenses in its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget_id: String,
    pub category_id: String,
    pub budget_amount: i64,
    /// Absolute expense total inside the budget window.
    pub spent: i64,
    /// Consumption percentage for the progress bar, capped at 100.
    pub percentage: f64,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    // == Compute ==
    /// Sums the expenses charged to the budget's category inside its date
    /// window. The bar percentage is capped at 100 but the status uses the
    /// uncapped value, so 150% consumption still reads as over, not merely
    /// full.
    pub fn compute(budget: &Budget, transactions: &[Transaction]) -> Self {
        let spent: i64 = transactions
            .iter()
            .filter(|t| {
                t.kind == TransactionKind::Expense
                    && t.category_id == budget.category_id
                    && t.date >= budget.start_date
                    && t.date <= budget.end_date
            })
            .map(Transaction::abs_amount)
            .sum();

        let raw = if budget.amount > 0 {
            spent as f64 / budget.amount as f64 * 100.0
        } else {
            // A zero budget is over as soon as anything is spent.
            if spent > 0 { OVER_THRESHOLD } else { 0.0 }
        };

        let status = if raw >= OVER_THRESHOLD {
            BudgetStatus::Over
        } else if raw >= WARNING_THRESHOLD {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        };

        Self {
            budget_id: budget.id.clone(),
            category_id: budget.category_id.clone(),
            budget_amount: budget.amount,
            spent,
            percentage: raw.min(100.0),
            status,
        }
    }
}
