//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    CreateTransactionRequest, NewProfileRequest, Transaction, UpdateProfileRequest,
    UpdateTransactionRequest, User,
};

/// Interface for the profile collection of the remote store.
///
/// Profiles are keyed by the provider-issued user identifier and are created
/// on first successful authentication; the client never deletes them.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Retrieve the profile for a provider identity, if one exists
    async fn get_profile(&self, user_id: &str) -> Result<Option<User>>;

    /// Create a profile row for a provider identity.
    ///
    /// Creating a profile that already exists returns the stored row
    /// unchanged, so concurrent reconciliation attempts stay idempotent.
    async fn create_profile(&self, request: &NewProfileRequest) -> Result<User>;

    /// Apply a partial update and return the merged profile
    async fn update_profile(&self, user_id: &str, request: &UpdateProfileRequest) -> Result<User>;
}

/// Interface for the transaction collection of the remote store.
///
/// All listing operations return transactions ordered by date descending
/// (most recent first); the store assigns ids on creation.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// List every transaction owned by a user
    async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;

    /// List transactions whose date falls within `[start_date, end_date]`
    async fn list_transactions_in_range(
        &self,
        user_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Transaction>>;

    /// List transactions in a single category
    async fn list_transactions_by_category(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<Vec<Transaction>>;

    /// Persist a new transaction and return the stored record with its
    /// store-assigned id
    async fn create_transaction(
        &self,
        user_id: &str,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction>;

    /// Apply a partial update and return the full merged record.
    /// The store's merge result is authoritative, not the caller's input.
    async fn update_transaction(
        &self,
        transaction_id: &str,
        request: &UpdateTransactionRequest,
    ) -> Result<Transaction>;

    /// Delete a transaction permanently.
    /// Returns true if the transaction was found and deleted, false otherwise
    async fn delete_transaction(&self, transaction_id: &str) -> Result<bool>;
}

/// Interface for durable local key-value storage.
///
/// Used for the session cache and preference strings. Keys are namespaced by
/// convention (`auth.*`, `preferences.*`); writes are infrequent and
/// idempotent per key, so no locking is required of implementations beyond
/// their own internal consistency.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Trait defining the interface for storage connections.
///
/// Abstracts away the specific backend and provides factory methods for
/// creating repositories, so the domain layer can work with any remote store
/// without knowing the implementation details.
pub trait Connection: Send + Sync + Clone + 'static {
    /// The type of ProfileStore this connection creates
    type ProfileRepository: ProfileStore + Clone + 'static;

    /// The type of TransactionStore this connection creates
    type TransactionRepository: TransactionStore + Clone + 'static;

    /// Create a new profile repository for this connection
    fn create_profile_repository(&self) -> Self::ProfileRepository;

    /// Create a new transaction repository for this connection
    fn create_transaction_repository(&self) -> Self::TransactionRepository;
}
