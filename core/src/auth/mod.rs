//! # Auth Module
//!
//! The identity-provider seam: the trait the session lifecycle is written
//! against, the typed error surface for authentication failures, and the
//! in-memory provider used by tests and demos.

pub mod memory;
pub mod provider;

pub use memory::MemoryIdentityProvider;
pub use provider::{
    AuthError, AuthEvent, AuthEventKind, IdentityProvider, OAuthProvider, ProviderUser,
    SignInOutcome, SignUpOutcome,
};
