//! Session lifecycle for the expense tracker.
//!
//! Owns the authenticated-user state machine: establish, refresh and tear
//! down identity against the external provider, and reconcile each provider
//! identity with its application profile row. Subscribers observe the
//! current `{phase, user, session}` through a watch channel.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use shared::{NewProfileRequest, Session, UpdateProfileRequest, User};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use crate::auth::{AuthError, AuthEvent, AuthEventKind, IdentityProvider, OAuthProvider, ProviderUser};
use crate::storage::{Connection, ProfileStore};

/// How long the bootstrap waits for the provider before giving up and
/// showing the login screen instead of hanging
pub const SESSION_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(3);

/// Client-side password policy, enforced before any provider call
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Lifecycle phase of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Before `start()` has been called
    Uninitialized,
    /// Waiting for the provider to report whether a session exists
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Observable session state.
///
/// Invariant: when `session` is set, `user` is either the matching profile
/// or the minimal metadata fallback for the same provider identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl AuthState {
    fn initial() -> Self {
        Self {
            phase: AuthPhase::Uninitialized,
            user: None,
            session: None,
        }
    }

    pub fn loading(&self) -> bool {
        matches!(self.phase, AuthPhase::Loading)
    }

    pub fn authenticated(&self) -> bool {
        matches!(self.phase, AuthPhase::Authenticated)
    }
}

/// Service owning the session lifecycle.
///
/// Cheap to clone; all clones share the same state. The provider's event
/// feed is the single source of truth for session state, and every
/// session-establishment attempt is tagged with a generation number so a
/// profile loaded for a superseded attempt is discarded instead of racing a
/// newer sign-in.
pub struct SessionManager<C: Connection> {
    inner: Arc<SessionInner<C>>,
}

impl<C: Connection> Clone for SessionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<C: Connection> {
    provider: Arc<dyn IdentityProvider>,
    profiles: C::ProfileRepository,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
}

impl<C: Connection> SessionManager<C> {
    pub fn new(provider: Arc<dyn IdentityProvider>, connection: &C) -> Self {
        let profiles = connection.create_profile_repository();
        let (state, _) = watch::channel(AuthState::initial());
        Self {
            inner: Arc::new(SessionInner {
                provider,
                profiles,
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribe to session state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Read the current session state
    pub fn current(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Bring the state machine up: start listening to provider events and
    /// check for an existing session.
    ///
    /// The provider check runs under a bounded timeout; if the provider
    /// never answers the state lands in `Unauthenticated` so the UI shows a
    /// login screen rather than an indefinite spinner.
    pub async fn start(&self) {
        let events = self.inner.provider.subscribe();
        let listener = Arc::clone(&self.inner);
        tokio::spawn(async move {
            SessionInner::listen(listener, events).await;
        });

        self.inner
            .state
            .send_modify(|state| state.phase = AuthPhase::Loading);

        match tokio::time::timeout(SESSION_BOOTSTRAP_TIMEOUT, self.inner.provider.current_session())
            .await
        {
            Ok(Ok(Some(session))) => {
                info!("found existing session for {}", session.email);
                SessionInner::establish_session(&self.inner, session);
            }
            Ok(Ok(None)) => {
                debug!("no existing session");
                SessionInner::clear_session(&self.inner);
            }
            Ok(Err(err)) => {
                warn!("session bootstrap failed: {}", err);
                SessionInner::clear_session(&self.inner);
            }
            Err(_) => {
                warn!(
                    "provider did not answer within {:?}, treating as signed out",
                    SESSION_BOOTSTRAP_TIMEOUT
                );
                SessionInner::clear_session(&self.inner);
            }
        }
    }

    /// Password sign-in.
    ///
    /// On success the session is published immediately and the profile load
    /// is scheduled in the background; the call does not block on it.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
        let outcome = self.inner.provider.sign_in_with_password(email, password).await?;
        info!("signed in {}", outcome.user.email);
        SessionInner::establish_session(&self.inner, outcome.session);
        Ok(outcome.user)
    }

    /// Create a provider account and its profile row.
    ///
    /// The password policy is enforced client-side before the provider call.
    /// When the provider withholds the session pending email confirmation,
    /// the state stays `Unauthenticated` until the confirmation sign-in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<ProviderUser, AuthError> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LENGTH));
        }

        let outcome = self.inner.provider.sign_up(email, password, name).await?;

        let profile_name = if name.trim().is_empty() {
            local_part(&outcome.user.email)
        } else {
            name.trim().to_string()
        };
        let request = NewProfileRequest {
            id: outcome.user.id.clone(),
            email: outcome.user.email.clone(),
            name: profile_name,
            avatar: outcome.user.avatar.clone(),
        };
        // Reconciliation recreates the row later if this write is lost
        if let Err(err) = self.inner.profiles.create_profile(&request).await {
            warn!("profile creation during sign-up failed: {:#}", err);
        }

        match outcome.session.clone() {
            Some(session) => SessionInner::establish_session(&self.inner, session),
            None => info!("account created for {}, awaiting confirmation", email),
        }
        Ok(outcome.user)
    }

    /// Start the Google OAuth consent flow; returns the redirect URL.
    ///
    /// The eventual identity arrives through the provider's event feed, not
    /// from this call.
    pub async fn sign_in_with_google(&self) -> Result<String, AuthError> {
        let redirect = self.inner.provider.begin_oauth(OAuthProvider::Google).await?;
        info!("oauth consent flow started");
        Ok(redirect)
    }

    /// Sign out. Local state clears unconditionally, even when the remote
    /// invalidation fails, so the UI can never get stuck authenticated.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.inner.provider.sign_out().await;
        SessionInner::clear_session(&self.inner);
        if let Err(ref err) = result {
            warn!("provider sign-out failed, local state cleared anyway: {}", err);
        }
        result
    }

    /// Request a password-reset email; no state change
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.inner.provider.send_password_reset(email).await
    }

    /// Force a token refresh. Best effort: failures are logged, never
    /// surfaced as a hard error.
    pub async fn refresh_session(&self) {
        match self.inner.provider.refresh_session().await {
            Ok(session) => SessionInner::apply_refreshed(&self.inner, session),
            Err(err) => warn!("session refresh failed: {}", err),
        }
    }

    /// Update the active user's profile row and publish the merged result
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<User> {
        let user_id = self
            .current()
            .user
            .map(|user| user.id)
            .ok_or_else(|| anyhow!("no authenticated user"))?;

        let updated = self.inner.profiles.update_profile(&user_id, request).await?;
        self.inner.state.send_modify(|state| {
            if state.user.as_ref().map(|u| u.id.as_str()) == Some(updated.id.as_str()) {
                state.user = Some(updated.clone());
            }
        });
        Ok(updated)
    }
}

impl<C: Connection> SessionInner<C> {
    async fn listen(inner: Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => Self::apply_auth_event(&inner, event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("auth event listener lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    fn apply_auth_event(inner: &Arc<Self>, event: AuthEvent) {
        debug!("auth state changed: {:?}", event.kind);
        match (event.kind, event.session) {
            (AuthEventKind::SignedIn, Some(session)) => {
                Self::establish_session(inner, session);
            }
            (AuthEventKind::TokenRefreshed, Some(session)) => {
                Self::apply_refreshed(inner, session);
            }
            (AuthEventKind::SignedOut, _) => {
                Self::clear_session(inner);
            }
            (kind, None) => {
                warn!("auth event {:?} carried no session, treating as sign-out", kind);
                Self::clear_session(inner);
            }
        }
    }

    /// Single code path for every session establishment: direct sign-in
    /// results, the bootstrap check and provider events all converge here.
    fn establish_session(inner: &Arc<Self>, session: Session) {
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let fallback = fallback_profile(&session);

        inner.state.send_modify(|state| {
            // Keep the already-loaded profile when it belongs to the same
            // identity, otherwise show the metadata fallback immediately so
            // the UI is never blocked on the profile store.
            let kept = state
                .user
                .take()
                .filter(|user| user.id == session.user_id);
            state.user = Some(kept.unwrap_or(fallback));
            state.session = Some(session.clone());
            state.phase = AuthPhase::Authenticated;
        });

        let task = Arc::clone(inner);
        tokio::spawn(async move {
            task.reconcile_profile(session, generation).await;
        });
    }

    /// Look up the profile for a provider identity, creating it from
    /// provider metadata when absent. Failures leave the fallback profile in
    /// place and are never surfaced - identity availability is prioritized
    /// over profile completeness.
    async fn reconcile_profile(&self, session: Session, generation: u64) {
        let profile = match self.profiles.get_profile(&session.user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("no profile for {}, creating from provider metadata", session.user_id);
                let request = NewProfileRequest {
                    id: session.user_id.clone(),
                    email: session.email.clone(),
                    name: display_name(&session),
                    avatar: session.avatar_hint.clone(),
                };
                match self.profiles.create_profile(&request).await {
                    Ok(profile) => profile,
                    Err(err) => {
                        warn!("profile creation failed, keeping fallback profile: {:#}", err);
                        return;
                    }
                }
            }
            Err(err) => {
                warn!("profile lookup failed, keeping fallback profile: {:#}", err);
                return;
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("discarding profile from superseded sign-in attempt {}", generation);
            return;
        }

        self.state.send_modify(|state| {
            if state.session.as_ref().map(|s| s.user_id.as_str()) == Some(profile.id.as_str()) {
                state.user = Some(profile.clone());
            }
        });
    }

    /// A refreshed token for the current identity swaps the session in
    /// place; a refresh for a different identity is a full establishment.
    fn apply_refreshed(inner: &Arc<Self>, session: Session) {
        let same_user = inner
            .state
            .borrow()
            .session
            .as_ref()
            .map(|current| current.user_id == session.user_id)
            .unwrap_or(false);

        if same_user {
            inner.state.send_modify(|state| state.session = Some(session));
        } else {
            Self::establish_session(inner, session);
        }
    }

    fn clear_session(inner: &Arc<Self>) {
        inner.generation.fetch_add(1, Ordering::SeqCst);
        inner.state.send_modify(|state| {
            state.user = None;
            state.session = None;
            state.phase = AuthPhase::Unauthenticated;
        });
    }
}

/// Minimal in-memory profile built purely from provider metadata
fn fallback_profile(session: &Session) -> User {
    User {
        id: session.user_id.clone(),
        name: display_name(session),
        email: session.email.clone(),
        avatar: session.avatar_hint.clone(),
    }
}

/// Display name from provider metadata, falling back to the email local-part
fn display_name(session: &Session) -> String {
    session
        .name_hint
        .as_ref()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| local_part(&session.email))
}

fn local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryIdentityProvider;
    use crate::storage::{MemoryConnection, MemoryKeyValueStore};
    use async_trait::async_trait;
    use shared::Session;

    struct TestEnv {
        manager: SessionManager<MemoryConnection>,
        provider: Arc<MemoryIdentityProvider>,
        connection: MemoryConnection,
    }

    fn test_env() -> TestEnv {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let provider = Arc::new(MemoryIdentityProvider::new(storage));
        let connection = MemoryConnection::new();
        let manager = SessionManager::new(provider.clone(), &connection);
        TestEnv {
            manager,
            provider,
            connection,
        }
    }

    async fn wait_for_state(
        manager: &SessionManager<MemoryConnection>,
        predicate: impl Fn(&AuthState) -> bool,
    ) -> AuthState {
        let mut rx = manager.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async move {
            loop {
                let state = rx.borrow_and_update().clone();
                if predicate(&state) {
                    return state;
                }
                rx.changed().await.expect("state channel closed");
            }
        })
        .await
        .expect("timed out waiting for auth state")
    }

    #[tokio::test]
    async fn sign_up_authenticates_and_creates_profile() {
        let env = test_env();
        env.manager.start().await;

        let user = env
            .manager
            .sign_up("amy@example.com", "secret1", "Amy")
            .await
            .unwrap();

        let state = wait_for_state(&env.manager, |s| {
            s.authenticated() && s.user.as_ref().map(|u| u.name.as_str()) == Some("Amy")
        })
        .await;
        assert_eq!(state.session.as_ref().unwrap().user_id, user.id);

        let profiles = env.connection.create_profile_repository();
        let stored = profiles.get_profile(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "amy@example.com");
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_the_provider_call() {
        let env = test_env();
        env.manager.start().await;

        let err = env
            .manager
            .sign_up("amy@example.com", "short", "Amy")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::WeakPassword(MIN_PASSWORD_LENGTH));
        assert!(!env.manager.current().authenticated());
    }

    #[tokio::test]
    async fn invalid_credentials_surface_a_displayable_message() {
        let env = test_env();
        env.manager.start().await;

        let err = env
            .manager
            .sign_in("nobody@example.com", "whatever")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(env.manager.current().phase, AuthPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn sign_in_and_provider_event_converge_to_one_pair() {
        let env = test_env();
        env.manager.start().await;
        env.provider
            .sign_up("amy@example.com", "secret1", "Amy")
            .await
            .unwrap();
        env.provider.sign_out().await.unwrap();
        wait_for_state(&env.manager, |s| s.phase == AuthPhase::Unauthenticated).await;

        // The direct call result and the provider's SignedIn event both
        // arrive; subscribers must end up with one consistent pair.
        env.manager.sign_in("amy@example.com", "secret1").await.unwrap();

        let state = wait_for_state(&env.manager, |s| {
            s.authenticated()
                && s.user.is_some()
                && s.session.is_some()
                && s.user.as_ref().map(|u| u.id.as_str())
                    == s.session.as_ref().map(|sess| sess.user_id.as_str())
        })
        .await;
        assert_eq!(state.user.unwrap().email, "amy@example.com");
    }

    #[tokio::test]
    async fn profile_store_outage_falls_back_to_provider_metadata() {
        let env = test_env();
        env.manager.start().await;
        env.connection.set_offline(true);

        env.manager
            .sign_up("amy@example.com", "secret1", "Amy")
            .await
            .unwrap();

        let state = wait_for_state(&env.manager, |s| s.authenticated()).await;
        let user = state.user.unwrap();
        assert_eq!(user.name, "Amy");
        assert_eq!(user.email, "amy@example.com");
    }

    #[tokio::test]
    async fn fallback_name_uses_email_local_part() {
        let session = Session {
            access_token: "token".to_string(),
            user_id: "user-1".to_string(),
            email: "amy.lee@example.com".to_string(),
            expires_at: i64::MAX,
            name_hint: None,
            avatar_hint: None,
        };
        assert_eq!(fallback_profile(&session).name, "amy.lee");
    }

    #[tokio::test]
    async fn sign_out_clears_local_state_even_when_the_provider_fails() {
        let env = test_env();
        env.manager.start().await;
        env.manager
            .sign_up("amy@example.com", "secret1", "Amy")
            .await
            .unwrap();
        wait_for_state(&env.manager, |s| s.authenticated()).await;

        env.provider.set_network_down(true);
        let result = env.manager.sign_out().await;
        assert!(matches!(result, Err(AuthError::Network(_))));

        let state = env.manager.current();
        assert_eq!(state.phase, AuthPhase::Unauthenticated);
        assert!(state.user.is_none());
        assert!(state.session.is_none());
    }

    #[tokio::test]
    async fn oauth_identity_arrives_through_the_event_feed() {
        let env = test_env();
        env.manager.start().await;

        let err = env.manager.sign_in_with_google().await.unwrap_err();
        assert_eq!(err, AuthError::OAuthNotConfigured);

        env.provider.set_oauth_configured(true);
        let redirect = env.manager.sign_in_with_google().await.unwrap();
        assert!(redirect.contains("google"));
        assert!(!env.manager.current().authenticated());

        env.provider
            .complete_oauth("amy@example.com", "Amy", Some("https://cdn.invalid/amy.png"))
            .await
            .unwrap();

        let state = wait_for_state(&env.manager, |s| s.authenticated()).await;
        assert_eq!(state.user.unwrap().email, "amy@example.com");
    }

    #[tokio::test]
    async fn bootstrap_restores_a_cached_session() {
        let env = test_env();
        env.provider
            .sign_up("amy@example.com", "secret1", "Amy")
            .await
            .unwrap();

        // A fresh manager over the same provider storage finds the session
        let manager = SessionManager::new(env.provider.clone(), &env.connection);
        manager.start().await;

        let state = wait_for_state(&manager, |s| s.authenticated()).await;
        assert_eq!(state.session.unwrap().email, "amy@example.com");
    }

    /// A provider that never answers anything
    struct HangingProvider {
        events: broadcast::Sender<AuthEvent>,
    }

    impl HangingProvider {
        fn new() -> Self {
            let (events, _) = broadcast::channel(4);
            Self { events }
        }
    }

    #[async_trait]
    impl IdentityProvider for HangingProvider {
        async fn sign_in_with_password(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<crate::auth::SignInOutcome, AuthError> {
            std::future::pending().await
        }

        async fn sign_up(
            &self,
            _email: &str,
            _password: &str,
            _name: &str,
        ) -> Result<crate::auth::SignUpOutcome, AuthError> {
            std::future::pending().await
        }

        async fn begin_oauth(&self, _provider: OAuthProvider) -> Result<String, AuthError> {
            std::future::pending().await
        }

        async fn current_session(&self) -> Result<Option<Session>, AuthError> {
            std::future::pending().await
        }

        async fn refresh_session(&self) -> Result<Session, AuthError> {
            std::future::pending().await
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            std::future::pending().await
        }

        async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
            std::future::pending().await
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_provider_lands_in_unauthenticated_after_the_timeout() {
        let connection = MemoryConnection::new();
        let manager = SessionManager::new(Arc::new(HangingProvider::new()), &connection);

        manager.start().await;

        let state = manager.current();
        assert_eq!(state.phase, AuthPhase::Unauthenticated);
        assert!(state.user.is_none());
    }
}
