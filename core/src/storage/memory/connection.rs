use anyhow::{anyhow, Result};
use shared::{Transaction, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::profile_repository::ProfileRepository;
use super::transaction_repository::TransactionRepository;
use crate::storage::traits::Connection;

/// A stored profile row with its bookkeeping timestamps
#[derive(Debug, Clone)]
pub(crate) struct ProfileRow {
    pub user: User,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored transaction row with its owner and bookkeeping timestamps
#[derive(Debug, Clone)]
pub(crate) struct TransactionRow {
    pub user_id: String,
    pub transaction: Transaction,
    pub created_at: String,
    pub updated_at: String,
}

/// Shared backing state for all repositories created from one connection
pub(crate) struct MemoryStore {
    pub profiles: RwLock<HashMap<String, ProfileRow>>,
    pub transactions: RwLock<Vec<TransactionRow>>,
    offline: AtomicBool,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            transactions: RwLock::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Every remote operation checks this before touching state
    pub fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(anyhow!("remote store unavailable"))
        } else {
            Ok(())
        }
    }
}

/// MemoryConnection hands out repositories over one shared in-process store
#[derive(Clone)]
pub struct MemoryConnection {
    store: Arc<MemoryStore>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Simulate a remote outage: while offline, every repository operation
    /// fails without mutating state.
    pub fn set_offline(&self, offline: bool) {
        self.store.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MemoryConnection {
    type ProfileRepository = ProfileRepository;
    type TransactionRepository = TransactionRepository;

    fn create_profile_repository(&self) -> Self::ProfileRepository {
        ProfileRepository::new(self.store())
    }

    fn create_transaction_repository(&self) -> Self::TransactionRepository {
        TransactionRepository::new(self.store())
    }
}
