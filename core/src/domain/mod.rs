//! # Domain Module
//!
//! Business logic for the expense tracker, independent of any UI framework
//! or storage mechanism.
//!
//! ## Module Organization
//!
//! - **session_service**: the session lifecycle state machine and profile
//!   reconciliation
//! - **transaction_service**: the authoritative in-memory transaction list
//!   and its remote CRUD operations
//! - **summary**: pure aggregation over the transaction set (totals,
//!   balance, category breakdown)
//! - **transaction_form**: client-side form validation and amount parsing
//! - **history**: non-mutating filtered and sorted transaction views
//! - **theme_service**: theme preference persistence

pub mod history;
pub mod session_service;
pub mod summary;
pub mod theme_service;
pub mod transaction_form;
pub mod transaction_service;

pub use history::{HistoryFilter, HistoryService, HistorySort, HistoryTotals, TypeFilter};
pub use session_service::{AuthPhase, AuthState, SessionManager};
pub use theme_service::ThemeService;
pub use transaction_form::TransactionFormService;
pub use transaction_service::{TransactionService, TransactionsState};
