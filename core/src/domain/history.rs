//! Filtered and sorted transaction views for the history screen.
//!
//! Everything here is a pure, non-mutating projection of the loaded list;
//! the authoritative set stays untouched in the transaction service.

use shared::{Transaction, TransactionType};

/// Which transaction types the view includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => transaction.transaction_type == TransactionType::Income,
            TypeFilter::Expense => transaction.transaction_type == TransactionType::Expense,
        }
    }
}

/// Ordering of the history view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistorySort {
    /// Most recent first (the store's natural order)
    #[default]
    DateDescending,
    /// Largest amount first
    AmountDescending,
}

/// Criteria applied to the loaded list
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Case-insensitive substring match against title and category
    pub search: Option<String>,
    pub type_filter: TypeFilter,
    pub sort_by: HistorySort,
}

/// Income and expense sums over a filtered view
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistoryTotals {
    pub income: f64,
    pub expense: f64,
}

/// Service producing history-screen projections
#[derive(Clone, Default)]
pub struct HistoryService;

impl HistoryService {
    pub fn new() -> Self {
        Self
    }

    /// Apply search, type filter and sort; the input slice is never mutated
    pub fn filter_transactions(
        &self,
        transactions: &[Transaction],
        filter: &HistoryFilter,
    ) -> Vec<Transaction> {
        let needle = filter
            .search
            .as_ref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut view: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| filter.type_filter.matches(tx))
            .filter(|tx| match &needle {
                Some(needle) => {
                    tx.title.to_lowercase().contains(needle)
                        || tx.category.to_lowercase().contains(needle)
                }
                None => true,
            })
            .cloned()
            .collect();

        match filter.sort_by {
            HistorySort::DateDescending => view.sort_by(|a, b| b.date.cmp(&a.date)),
            HistorySort::AmountDescending => {
                view.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(std::cmp::Ordering::Equal))
            }
        }
        view
    }

    /// Totals over a filtered view, for the history screen's summary bar
    pub fn totals(&self, transactions: &[Transaction]) -> HistoryTotals {
        let mut totals = HistoryTotals::default();
        for tx in transactions {
            match tx.transaction_type {
                TransactionType::Income => totals.income += tx.amount,
                TransactionType::Expense => totals.expense += tx.amount,
            }
        }
        totals
    }
}
