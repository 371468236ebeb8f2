use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use shared::{CreateTransactionRequest, Transaction, UpdateTransactionRequest};
use std::sync::Arc;
use uuid::Uuid;

use super::connection::{MemoryStore, TransactionRow};
use crate::storage::traits::TransactionStore;

/// In-memory transaction repository.
///
/// Rows are kept unordered; every listing sorts by date descending the way
/// the hosted store is asked to pre-sort on fetch.
#[derive(Clone)]
pub struct TransactionRepository {
    store: Arc<MemoryStore>,
}

impl TransactionRepository {
    pub(crate) fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    fn collect_sorted<F>(&self, predicate: F) -> Result<Vec<Transaction>>
    where
        F: Fn(&TransactionRow) -> bool,
    {
        let rows = self
            .store
            .transactions
            .read()
            .map_err(|_| anyhow!("transaction store lock poisoned"))?;
        let mut transactions: Vec<Transaction> = rows
            .iter()
            .filter(|row| predicate(row))
            .map(|row| row.transaction.clone())
            .collect();
        // RFC 3339 timestamps in a common offset sort lexicographically
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.store.ensure_online()?;
        self.collect_sorted(|row| row.user_id == user_id)
    }

    async fn list_transactions_in_range(
        &self,
        user_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Transaction>> {
        self.store.ensure_online()?;
        self.collect_sorted(|row| {
            row.user_id == user_id
                && row.transaction.date.as_str() >= start_date
                && row.transaction.date.as_str() <= end_date
        })
    }

    async fn list_transactions_by_category(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<Vec<Transaction>> {
        self.store.ensure_online()?;
        self.collect_sorted(|row| row.user_id == user_id && row.transaction.category == category)
    }

    async fn create_transaction(
        &self,
        user_id: &str,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction> {
        self.store.ensure_online()?;
        let now = Utc::now().to_rfc3339();
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            title: request.title.clone(),
            amount: request.amount,
            transaction_type: request.transaction_type,
            category: request.category.clone(),
            date: request.date.clone().unwrap_or_else(|| now.clone()),
            notes: request.notes.clone(),
        };

        let mut rows = self
            .store
            .transactions
            .write()
            .map_err(|_| anyhow!("transaction store lock poisoned"))?;
        rows.push(TransactionRow {
            user_id: user_id.to_string(),
            transaction: transaction.clone(),
            created_at: now.clone(),
            updated_at: now,
        });
        Ok(transaction)
    }

    async fn update_transaction(
        &self,
        transaction_id: &str,
        request: &UpdateTransactionRequest,
    ) -> Result<Transaction> {
        self.store.ensure_online()?;
        let mut rows = self
            .store
            .transactions
            .write()
            .map_err(|_| anyhow!("transaction store lock poisoned"))?;

        let row = rows
            .iter_mut()
            .find(|row| row.transaction.id == transaction_id)
            .ok_or_else(|| anyhow!("transaction not found: {}", transaction_id))?;

        if let Some(ref title) = request.title {
            row.transaction.title = title.clone();
        }
        if let Some(amount) = request.amount {
            row.transaction.amount = amount;
        }
        if let Some(transaction_type) = request.transaction_type {
            row.transaction.transaction_type = transaction_type;
        }
        if let Some(ref category) = request.category {
            row.transaction.category = category.clone();
        }
        if let Some(ref date) = request.date {
            row.transaction.date = date.clone();
        }
        if let Some(ref notes) = request.notes {
            row.transaction.notes = Some(notes.clone());
        }
        row.updated_at = Utc::now().to_rfc3339();

        Ok(row.transaction.clone())
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<bool> {
        self.store.ensure_online()?;
        let mut rows = self
            .store
            .transactions
            .write()
            .map_err(|_| anyhow!("transaction store lock poisoned"))?;
        let before = rows.len();
        rows.retain(|row| row.transaction.id != transaction_id);
        Ok(rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryConnection;
    use crate::storage::traits::Connection;
    use shared::TransactionType;

    fn draft(title: &str, amount: f64, date: &str) -> CreateTransactionRequest {
        CreateTransactionRequest {
            title: title.to_string(),
            amount,
            transaction_type: TransactionType::Expense,
            category: "Food".to_string(),
            date: Some(date.to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn listing_is_date_descending_and_scoped_to_owner() {
        let connection = MemoryConnection::new();
        let repo = connection.create_transaction_repository();

        repo.create_transaction("user-1", &draft("Coffee", 4.5, "2025-01-02T08:00:00Z"))
            .await
            .unwrap();
        repo.create_transaction("user-1", &draft("Lunch", 12.0, "2025-01-03T12:00:00Z"))
            .await
            .unwrap();
        repo.create_transaction("user-2", &draft("Taxi", 20.0, "2025-01-04T09:00:00Z"))
            .await
            .unwrap();

        let transactions = repo.list_transactions("user-1").await.unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].title, "Lunch");
        assert_eq!(transactions[1].title, "Coffee");
    }

    #[tokio::test]
    async fn range_and_category_queries_filter_rows() {
        let connection = MemoryConnection::new();
        let repo = connection.create_transaction_repository();

        repo.create_transaction("user-1", &draft("Coffee", 4.5, "2025-01-02T08:00:00Z"))
            .await
            .unwrap();
        let mut salary = draft("Salary", 500.0, "2025-02-01T09:00:00Z");
        salary.transaction_type = TransactionType::Income;
        salary.category = "Salary".to_string();
        repo.create_transaction("user-1", &salary).await.unwrap();

        let january = repo
            .list_transactions_in_range("user-1", "2025-01-01T00:00:00Z", "2025-01-31T23:59:59Z")
            .await
            .unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].title, "Coffee");

        let food = repo
            .list_transactions_by_category("user-1", "Food")
            .await
            .unwrap();
        assert_eq!(food.len(), 1);
    }

    #[tokio::test]
    async fn update_returns_merged_record() {
        let connection = MemoryConnection::new();
        let repo = connection.create_transaction_repository();

        let created = repo
            .create_transaction("user-1", &draft("Coffee", 4.5, "2025-01-02T08:00:00Z"))
            .await
            .unwrap();

        let update = UpdateTransactionRequest {
            amount: Some(5.0),
            ..Default::default()
        };
        let merged = repo.update_transaction(&created.id, &update).await.unwrap();
        assert_eq!(merged.amount, 5.0);
        assert_eq!(merged.title, "Coffee");
        assert_eq!(merged.category, "Food");
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let connection = MemoryConnection::new();
        let repo = connection.create_transaction_repository();

        let created = repo
            .create_transaction("user-1", &draft("Coffee", 4.5, "2025-01-02T08:00:00Z"))
            .await
            .unwrap();

        assert!(repo.delete_transaction(&created.id).await.unwrap());
        assert!(!repo.delete_transaction(&created.id).await.unwrap());
        assert!(repo.list_transactions("user-1").await.unwrap().is_empty());
    }
}
