//! # Expense Tracker Core
//!
//! Contains all non-UI logic for the expense tracker application.
//!
//! This crate brings together:
//! - **Auth**: the identity-provider seam and session lifecycle
//! - **Domain**: session management, transaction aggregation and the
//!   derived summary views the UI renders
//! - **Storage**: the remote-store and local-storage abstractions
//!
//! The core is UI-agnostic: screens consume it purely through the observable
//! state handles (`subscribe`/`current`) and the operations on the two
//! services, so it could back a mobile shell, a web frontend or a CLI
//! without modification.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer (screens, navigation)
//!     ↓
//! Domain Layer (SessionManager, TransactionService)
//!     ↓
//! Collaborator seams (IdentityProvider, ProfileStore,
//!                     TransactionStore, KeyValueStore)
//! ```

pub mod auth;
pub mod domain;
pub mod storage;

pub use auth::{AuthError, AuthEvent, AuthEventKind, IdentityProvider, OAuthProvider, ProviderUser};
pub use domain::{
    AuthPhase, AuthState, HistoryFilter, HistoryService, SessionManager, ThemeService,
    TransactionFormService, TransactionService, TransactionsState,
};
pub use storage::{Connection, KeyValueStore, ProfileStore, TransactionStore};
