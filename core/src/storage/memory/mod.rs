//! In-memory storage backend.
//!
//! Implements the storage traits over process-local maps. Stands in for the
//! hosted relational store in tests and demo setups, including an `offline`
//! switch for simulating remote outages.

pub mod connection;
pub mod kv;
pub mod profile_repository;
pub mod transaction_repository;

pub use connection::MemoryConnection;
pub use kv::MemoryKeyValueStore;
pub use profile_repository::ProfileRepository;
pub use transaction_repository::TransactionRepository;
