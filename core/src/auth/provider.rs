//! Identity-provider abstraction.
//!
//! The provider owns accounts and sessions; the client treats it as the
//! single source of truth for session state. Besides the request/response
//! operations, providers deliver asynchronous `AuthEvent`s describing state
//! changes (OAuth completions, token refreshes, remote sign-outs), which the
//! session manager consumes as its authoritative feed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::Session;
use thiserror::Error;
use tokio::sync::broadcast;

/// Authentication failures, surfaced to callers as displayable messages.
///
/// The `Display` string of each variant is the human-readable message the
/// presentation layer shows verbatim; no retry is automatic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),
    #[error("Please confirm your email address before signing in")]
    UnconfirmedEmail,
    #[error("OAuth sign-in is not configured")]
    OAuthNotConfigured,
    #[error("No active session")]
    SessionMissing,
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    Provider(String),
}

/// The provider's own account handle, returned from sign-in/sign-up.
/// Carries the metadata the provider knows about the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Result of a successful password sign-in
#[derive(Debug, Clone, PartialEq)]
pub struct SignInOutcome {
    pub user: ProviderUser,
    pub session: Session,
}

/// Result of a successful sign-up.
///
/// `session` is `None` when the provider requires email confirmation before
/// the first session can be issued.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: ProviderUser,
    pub session: Option<Session>,
}

/// External consent flows the provider can redirect to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    GitHub,
}

impl OAuthProvider {
    pub fn slug(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }
}

/// Kind of asynchronous auth-state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// An asynchronous auth-state notification.
///
/// Events are delivered in chronological order and are the single source of
/// truth for session state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

/// Interface to the external identity provider.
///
/// Every remote call suspends until a response or timeout arrives; none of
/// them hold locks across the suspension. OAuth sign-in does not return a
/// user synchronously - the eventual identity arrives through the event
/// subscription.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Password sign-in; yields the account handle and a fresh session
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, AuthError>;

    /// Create a provider account. The session is absent when the account
    /// still needs email confirmation.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, AuthError>;

    /// Start an OAuth consent flow; returns the redirect URL. The resulting
    /// identity is delivered via a `SignedIn` event, never synchronously.
    async fn begin_oauth(&self, provider: OAuthProvider) -> Result<String, AuthError>;

    /// The session this client currently holds, if any
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Force a token refresh, returning the renewed session
    async fn refresh_session(&self) -> Result<Session, AuthError>;

    /// Invalidate the provider-side session
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Request a password-reset email; no state change
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Subscribe to asynchronous auth-state notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
