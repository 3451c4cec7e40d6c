//! Cache Key Conventions
//!
//! Every cached query key is the logical resource name followed by its
//! identifying parameters, underscore-separated. The convention is what
//! makes pattern invalidation work: a write to a resource invalidates by
//! the resource-name substring and clears every parameterization at once,
//! without the writer knowing which pages or periods are currently cached.

use crate::models::TransactionKind;

// == Invalidation Patterns ==
/// Clears every cached transaction page, any user, any pagination.
pub const TRANSACTIONS_PATTERN: &str = "transactions";
/// Clears every cached monthly summary.
pub const MONTHLY_STATS_PATTERN: &str = "monthly_stats";
/// Clears every cached category list.
pub const CATEGORIES_PATTERN: &str = "categories";
/// Clears every cached budget list.
pub const BUDGETS_PATTERN: &str = "budgets";
/// Clears every cached asset list.
pub const ASSETS_PATTERN: &str = "assets";

// == Key Builders ==
/// Key for one page of a user's transaction list.
pub fn transactions(user_id: &str, page: usize, page_size: usize) -> String {
    format!("transactions_{}_{}_{}", user_id, page, page_size)
}

/// Key for a user's monthly summary; the period segment is `YYYY-MM`.
pub fn monthly_stats(user_id: &str, year: i32, month: u32) -> String {
    format!("monthly_stats_{}_{:04}-{:02}", user_id, year, month)
}

/// Key for a user's category list, optionally narrowed to one kind.
pub fn categories(user_id: &str, kind: Option<TransactionKind>) -> String {
    match kind {
        Some(kind) => format!("categories_{}_{}", user_id, kind.as_str()),
        None => format!("categories_{}", user_id),
    }
}

/// Key for a user's budget list.
pub fn budgets(user_id: &str) -> String {
    format!("budgets_{}", user_id)
}

/// Key for a user's asset list.
pub fn assets(user_id: &str) -> String {
    format!("assets_{}", user_id)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(transactions("u1", 0, 20), "transactions_u1_0_20");
        assert_eq!(monthly_stats("u1", 2024, 6), "monthly_stats_u1_2024-06");
        assert_eq!(categories("u1", None), "categories_u1");
        assert_eq!(
            categories("u1", Some(TransactionKind::Expense)),
            "categories_u1_expense"
        );
        assert_eq!(budgets("u1"), "budgets_u1");
        assert_eq!(assets("u1"), "assets_u1");
    }

    #[test]
    fn test_month_segment_is_zero_padded() {
        assert_eq!(monthly_stats("u1", 2024, 11), "monthly_stats_u1_2024-11");
        assert_eq!(monthly_stats("u1", 987, 1), "monthly_stats_u1_0987-01");
    }

    #[test]
    fn test_keys_contain_their_resource_pattern() {
        assert!(transactions("u1", 0, 20).contains(TRANSACTIONS_PATTERN));
        assert!(monthly_stats("u1", 2024, 6).contains(MONTHLY_STATS_PATTERN));
        assert!(categories("u1", None).contains(CATEGORIES_PATTERN));
        assert!(budgets("u1").contains(BUDGETS_PATTERN));
        assert!(assets("u1").contains(ASSETS_PATTERN));
    }
}
