//! # Storage Module
//!
//! Abstractions over the external collaborators that persist data for the
//! expense tracker: the remote relational store (profiles and transactions)
//! and the durable local key-value store (session cache, preferences).
//!
//! The traits here let the domain layer work against any backend without
//! modification; the `memory` module provides the in-process reference
//! implementation used by tests and demos.

pub mod memory;
pub mod traits;

pub use memory::{MemoryConnection, MemoryKeyValueStore};
pub use traits::{Connection, KeyValueStore, ProfileStore, TransactionStore};
