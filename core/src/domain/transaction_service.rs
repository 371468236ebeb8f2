//! The authoritative in-memory transaction list.
//!
//! Owns the loaded transaction set for the signed-in user, mediates every
//! remote CRUD call, and exposes derived views (totals, balance, category
//! breakdown) computed on demand from the current list. Subscribers observe
//! `{transactions, loading, refreshing, error}` through a watch channel.

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use shared::{CategoryData, CreateTransactionRequest, Transaction, UpdateTransactionRequest};
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::session_service::SessionManager;
use crate::domain::summary;
use crate::domain::transaction_form::TransactionFormService;
use crate::storage::{Connection, TransactionStore};

/// Observable transaction state.
///
/// `loading` covers the initial fetch (no data yet), `refreshing` covers a
/// fetch that runs behind an already-populated list. When a fetch fails the
/// previous list is kept and `error` is set, so the UI shows stale data with
/// a notice rather than a blank screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionsState {
    pub transactions: Vec<Transaction>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
}

/// Service owning the transaction list lifecycle.
///
/// Cheap to clone; all clones share the same state. Every mutation validates
/// client-side first and applies the store's returned record to the local
/// list, so the list always mirrors what the store accepted.
pub struct TransactionService<C: Connection> {
    inner: Arc<TxInner<C>>,
}

impl<C: Connection> Clone for TransactionService<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct TxInner<C: Connection> {
    repository: C::TransactionRepository,
    session: SessionManager<C>,
    form: TransactionFormService,
    state: watch::Sender<TransactionsState>,
}

impl<C: Connection> TransactionService<C> {
    pub fn new(connection: &C, session: SessionManager<C>) -> Self {
        let repository = connection.create_transaction_repository();
        let (state, _) = watch::channel(TransactionsState::default());
        Self {
            inner: Arc::new(TxInner {
                repository,
                session,
                form: TransactionFormService::new(),
                state,
            }),
        }
    }

    /// Subscribe to transaction state changes
    pub fn subscribe(&self) -> watch::Receiver<TransactionsState> {
        self.inner.state.subscribe()
    }

    /// Read the current transaction state
    pub fn current(&self) -> TransactionsState {
        self.inner.state.borrow().clone()
    }

    /// Initial fetch of the signed-in user's transactions
    pub async fn load_transactions(&self) {
        self.fetch(false).await;
    }

    /// Re-fetch behind the already-displayed list
    pub async fn refresh_transactions(&self) {
        self.fetch(true).await;
    }

    async fn fetch(&self, refreshing: bool) {
        let user = match self.inner.session.current().user {
            Some(user) => user,
            None => {
                self.inner.state.send_modify(|state| {
                    state.transactions.clear();
                    state.loading = false;
                    state.refreshing = false;
                    state.error = None;
                });
                return;
            }
        };

        self.inner.state.send_modify(|state| {
            if refreshing {
                state.refreshing = true;
            } else {
                state.loading = true;
            }
            state.error = None;
        });

        match self.inner.repository.list_transactions(&user.id).await {
            Ok(transactions) => {
                info!("loaded {} transactions for {}", transactions.len(), user.id);
                self.inner.state.send_modify(|state| {
                    state.transactions = transactions;
                    state.loading = false;
                    state.refreshing = false;
                    state.error = None;
                });
            }
            Err(err) => {
                error!("failed to load transactions: {:#}", err);
                // Keep whatever was already loaded; stale data beats a blank
                // screen.
                self.inner.state.send_modify(|state| {
                    state.loading = false;
                    state.refreshing = false;
                    state.error = Some("Failed to load transactions".to_string());
                });
            }
        }
    }

    /// Create a transaction after client-side validation.
    ///
    /// Invalid drafts never reach the store. The store-assigned record is
    /// prepended so the newest entry leads the date-descending list.
    pub async fn create_transaction(&self, request: &CreateTransactionRequest) -> bool {
        let validation = self.inner.form.validate_draft(request);
        if !validation.is_valid {
            let message = validation
                .errors
                .first()
                .map(|err| err.message())
                .unwrap_or_else(|| "Invalid transaction".to_string());
            warn!("rejected invalid transaction draft: {}", message);
            self.inner
                .state
                .send_modify(|state| state.error = Some(message));
            return false;
        }

        let user = match self.inner.session.current().user {
            Some(user) => user,
            None => {
                warn!("create_transaction called with no authenticated user");
                return false;
            }
        };

        match self.inner.repository.create_transaction(&user.id, request).await {
            Ok(created) => {
                info!("created transaction {}", created.id);
                self.inner.state.send_modify(|state| {
                    state.transactions.insert(0, created.clone());
                    state.error = None;
                });
                true
            }
            Err(err) => {
                error!("failed to create transaction: {:#}", err);
                self.inner
                    .state
                    .send_modify(|state| state.error = Some("Failed to add transaction".to_string()));
                false
            }
        }
    }

    /// Apply a partial update; the store's merged record replaces the local
    /// copy, so server-side defaults and normalization win.
    pub async fn update_transaction(
        &self,
        transaction_id: &str,
        request: &UpdateTransactionRequest,
    ) -> bool {
        match self.inner.repository.update_transaction(transaction_id, request).await {
            Ok(updated) => {
                self.inner.state.send_modify(|state| {
                    if let Some(slot) = state
                        .transactions
                        .iter_mut()
                        .find(|tx| tx.id == updated.id)
                    {
                        *slot = updated.clone();
                    }
                    state.error = None;
                });
                true
            }
            Err(err) => {
                error!("failed to update transaction {}: {:#}", transaction_id, err);
                self.inner.state.send_modify(|state| {
                    state.error = Some("Failed to update transaction".to_string())
                });
                false
            }
        }
    }

    /// Delete a transaction and drop it from the local list
    pub async fn delete_transaction(&self, transaction_id: &str) -> bool {
        match self.inner.repository.delete_transaction(transaction_id).await {
            Ok(true) => {
                self.inner.state.send_modify(|state| {
                    state.transactions.retain(|tx| tx.id != transaction_id);
                    state.error = None;
                });
                true
            }
            Ok(false) => {
                warn!("delete requested for unknown transaction {}", transaction_id);
                false
            }
            Err(err) => {
                error!("failed to delete transaction {}: {:#}", transaction_id, err);
                self.inner.state.send_modify(|state| {
                    state.error = Some("Failed to delete transaction".to_string())
                });
                false
            }
        }
    }

    /// Sum of loaded income amounts
    pub fn total_income(&self) -> f64 {
        summary::total_income(&self.inner.state.borrow().transactions)
    }

    /// Sum of loaded expense amounts
    pub fn total_expense(&self) -> f64 {
        summary::total_expense(&self.inner.state.borrow().transactions)
    }

    /// Income minus expense over the loaded list
    pub fn balance(&self) -> f64 {
        summary::balance(&self.inner.state.borrow().transactions)
    }

    /// The most recent transactions, capped for the dashboard
    pub fn recent_transactions(&self) -> Vec<Transaction> {
        summary::recent_transactions(&self.inner.state.borrow().transactions)
    }

    /// Per-category expense breakdown over the loaded list
    pub fn category_data(&self) -> Vec<CategoryData> {
        summary::category_data(&self.inner.state.borrow().transactions)
    }

    /// Fetch transactions in a date range directly from the store
    pub async fn transactions_in_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Transaction>> {
        let user = self.require_user()?;
        self.inner
            .repository
            .list_transactions_in_range(&user, start_date, end_date)
            .await
    }

    /// Fetch transactions in a single category directly from the store
    pub async fn transactions_by_category(&self, category: &str) -> Result<Vec<Transaction>> {
        let user = self.require_user()?;
        self.inner
            .repository
            .list_transactions_by_category(&user, category)
            .await
    }

    fn require_user(&self) -> Result<String> {
        self.inner
            .session
            .current()
            .user
            .map(|user| user.id)
            .ok_or_else(|| anyhow!("no authenticated user"))
    }
}
