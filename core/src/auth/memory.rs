//! In-memory identity provider.
//!
//! Backs tests and demo setups with the full provider contract: password
//! accounts, session persistence through the injected key-value store,
//! OAuth consent simulation and the asynchronous event feed.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use shared::Session;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::provider::{
    AuthError, AuthEvent, AuthEventKind, IdentityProvider, OAuthProvider, ProviderUser,
    SignInOutcome, SignUpOutcome,
};
use crate::storage::KeyValueStore;

/// Key under which the session cache lives in local storage
pub const SESSION_STORAGE_KEY: &str = "auth.session";

/// Issued sessions live for one hour before a refresh is needed
const SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    id: String,
    email: String,
    password: String,
    name: String,
    avatar: Option<String>,
    confirmed: bool,
}

impl Account {
    fn provider_user(&self) -> ProviderUser {
        ProviderUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: Some(self.name.clone()),
            avatar: self.avatar.clone(),
        }
    }
}

/// In-memory `IdentityProvider` implementation.
///
/// Sessions are persisted as JSON in the injected key-value store under
/// [`SESSION_STORAGE_KEY`], matching how a hosted provider client caches its
/// session in platform storage.
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    storage: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<AuthEvent>,
    oauth_configured: AtomicBool,
    require_confirmation: AtomicBool,
    network_down: AtomicBool,
}

impl MemoryIdentityProvider {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: RwLock::new(HashMap::new()),
            storage,
            events,
            oauth_configured: AtomicBool::new(false),
            require_confirmation: AtomicBool::new(false),
            network_down: AtomicBool::new(false),
        }
    }

    /// Enable or disable the simulated OAuth configuration
    pub fn set_oauth_configured(&self, configured: bool) {
        self.oauth_configured.store(configured, Ordering::SeqCst);
    }

    /// When set, new accounts need confirmation before a session is issued
    pub fn set_require_confirmation(&self, required: bool) {
        self.require_confirmation.store(required, Ordering::SeqCst);
    }

    /// Simulate a network partition: every remote call fails while set
    pub fn set_network_down(&self, down: bool) {
        self.network_down.store(down, Ordering::SeqCst);
    }

    /// Complete a previously started OAuth consent flow.
    ///
    /// Creates the account on first login (the OAuth path has no explicit
    /// sign-up) and delivers the identity through a `SignedIn` event, the
    /// same way a real redirect callback would.
    pub async fn complete_oauth(
        &self,
        email: &str,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<Session, AuthError> {
        self.ensure_reachable()?;
        let account = {
            let mut accounts = self.lock_accounts_mut()?;
            accounts
                .entry(email.to_lowercase())
                .or_insert_with(|| Account {
                    id: Uuid::new_v4().to_string(),
                    email: email.to_string(),
                    password: String::new(),
                    name: name.to_string(),
                    avatar: avatar.map(str::to_string),
                    confirmed: true,
                })
                .clone()
        };

        let session = self.issue_session(&account).await?;
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        info!("oauth consent completed for {}", email);
        Ok(session)
    }

    fn ensure_reachable(&self) -> Result<(), AuthError> {
        if self.network_down.load(Ordering::SeqCst) {
            Err(AuthError::Network("identity provider unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock_accounts(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Account>>, AuthError> {
        self.accounts
            .read()
            .map_err(|_| AuthError::Provider("account store lock poisoned".to_string()))
    }

    fn lock_accounts_mut(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Account>>, AuthError> {
        self.accounts
            .write()
            .map_err(|_| AuthError::Provider("account store lock poisoned".to_string()))
    }

    fn build_session(&self, account: &Account) -> Session {
        Session {
            access_token: Uuid::new_v4().to_string(),
            user_id: account.id.clone(),
            email: account.email.clone(),
            expires_at: Utc::now().timestamp() + SESSION_TTL_SECS,
            name_hint: Some(account.name.clone()),
            avatar_hint: account.avatar.clone(),
        }
    }

    async fn issue_session(&self, account: &Account) -> Result<Session, AuthError> {
        let session = self.build_session(account);
        self.persist_session(&session).await?;
        Ok(session)
    }

    async fn persist_session(&self, session: &Session) -> Result<(), AuthError> {
        let json = serde_json::to_string(session)
            .map_err(|err| AuthError::Provider(format!("session serialization failed: {}", err)))?;
        self.storage
            .set(SESSION_STORAGE_KEY, &json)
            .await
            .map_err(|err| AuthError::Provider(format!("session cache write failed: {}", err)))
    }

    fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        // No receivers is fine; the manager may not have started yet
        let _ = self.events.send(AuthEvent { kind, session });
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInOutcome, AuthError> {
        self.ensure_reachable()?;
        let account = {
            let accounts = self.lock_accounts()?;
            match accounts.get(&email.to_lowercase()) {
                Some(account) if account.password == password => account.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        if !account.confirmed {
            return Err(AuthError::UnconfirmedEmail);
        }

        let session = self.issue_session(&account).await?;
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        debug!("password sign-in for {}", account.email);
        Ok(SignInOutcome {
            user: account.provider_user(),
            session,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignUpOutcome, AuthError> {
        self.ensure_reachable()?;
        if !email.contains('@') {
            return Err(AuthError::Provider("Invalid email address".to_string()));
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword(6));
        }

        let confirmed = !self.require_confirmation.load(Ordering::SeqCst);
        let account = {
            let mut accounts = self.lock_accounts_mut()?;
            if accounts.contains_key(&email.to_lowercase()) {
                return Err(AuthError::EmailTaken);
            }
            let account = Account {
                id: Uuid::new_v4().to_string(),
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                avatar: None,
                confirmed,
            };
            accounts.insert(email.to_lowercase(), account.clone());
            account
        };

        let session = if confirmed {
            let session = self.issue_session(&account).await?;
            self.emit(AuthEventKind::SignedIn, Some(session.clone()));
            Some(session)
        } else {
            info!("account for {} awaiting confirmation", account.email);
            None
        };

        Ok(SignUpOutcome {
            user: account.provider_user(),
            session,
        })
    }

    async fn begin_oauth(&self, provider: OAuthProvider) -> Result<String, AuthError> {
        self.ensure_reachable()?;
        if !self.oauth_configured.load(Ordering::SeqCst) {
            return Err(AuthError::OAuthNotConfigured);
        }
        Ok(format!(
            "https://auth.invalid/oauth/{}/consent",
            provider.slug()
        ))
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        self.ensure_reachable()?;
        let cached = self
            .storage
            .get(SESSION_STORAGE_KEY)
            .await
            .map_err(|err| AuthError::Provider(format!("session cache read failed: {}", err)))?;

        let Some(json) = cached else {
            return Ok(None);
        };
        let session: Session = match serde_json::from_str(&json) {
            Ok(session) => session,
            Err(err) => {
                warn!("discarding unreadable cached session: {}", err);
                let _ = self.storage.remove(SESSION_STORAGE_KEY).await;
                return Ok(None);
            }
        };
        if session.is_expired() {
            debug!("cached session for {} expired", session.email);
            let _ = self.storage.remove(SESSION_STORAGE_KEY).await;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        self.ensure_reachable()?;
        let current = self.current_session().await?.ok_or(AuthError::SessionMissing)?;
        let refreshed = Session {
            access_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now().timestamp() + SESSION_TTL_SECS,
            ..current
        };
        self.persist_session(&refreshed).await?;
        self.emit(AuthEventKind::TokenRefreshed, Some(refreshed.clone()));
        Ok(refreshed)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.ensure_reachable()?;
        self.storage
            .remove(SESSION_STORAGE_KEY)
            .await
            .map_err(|err| AuthError::Provider(format!("session cache clear failed: {}", err)))?;
        self.emit(AuthEventKind::SignedOut, None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.ensure_reachable()?;
        let accounts = self.lock_accounts()?;
        if accounts.contains_key(&email.to_lowercase()) {
            info!("password reset link issued for {}", email);
        } else {
            // Do not reveal whether the account exists
            debug!("password reset requested for unknown email");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
