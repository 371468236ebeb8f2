//! Pure aggregation over the transaction set.
//!
//! Every view here is recomputed synchronously from the in-memory list on
//! each read. The list is small (tens to low thousands of records), so there
//! is no caching layer and nothing to invalidate.

use shared::{category_icon, CategoryData, Transaction, TransactionType, CATEGORY_PALETTE};

/// How many transactions the dashboard's recent slice shows
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// Sum of all income amounts
pub fn total_income(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.transaction_type == TransactionType::Income)
        .map(|tx| tx.amount)
        .sum()
}

/// Sum of all expense amounts
pub fn total_expense(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.transaction_type == TransactionType::Expense)
        .map(|tx| tx.amount)
        .sum()
}

/// Income minus expense
pub fn balance(transactions: &[Transaction]) -> f64 {
    total_income(transactions) - total_expense(transactions)
}

/// The first entries of the date-descending list
pub fn recent_transactions(transactions: &[Transaction]) -> Vec<Transaction> {
    transactions
        .iter()
        .take(RECENT_TRANSACTION_COUNT)
        .cloned()
        .collect()
}

/// Per-category breakdown of expense amounts.
///
/// Covers exactly the expense-type subset: income never appears here.
/// Categories keep their first-appearance order, colors are assigned by
/// palette index (wrapping), and each percentage is the category's share of
/// the summed expense total.
pub fn category_data(transactions: &[Transaction]) -> Vec<CategoryData> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.transaction_type == TransactionType::Expense)
    {
        match totals.iter_mut().find(|(name, _)| *name == tx.category) {
            Some((_, sum)) => *sum += tx.amount,
            None => totals.push((tx.category.clone(), tx.amount)),
        }
    }

    let expense_total: f64 = totals.iter().map(|(_, amount)| amount).sum();

    totals
        .into_iter()
        .enumerate()
        .map(|(index, (name, amount))| CategoryData {
            color: CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()].to_string(),
            icon: category_icon(&name).to_string(),
            percentage: if expense_total > 0.0 {
                amount / expense_total * 100.0
            } else {
                0.0
            },
            name,
            amount,
        })
        .collect()
}
