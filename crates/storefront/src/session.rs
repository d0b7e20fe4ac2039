//! Session store - single authority for "who is logged in".
//!
//! Owns the authenticated-user identity, token custody, and a one-time
//! initialization gate that protected views await before making any
//! authorization decision.
//!
//! # State machine
//!
//! Four reachable states over `(is_initialized, is_authenticated)`:
//!
//! ```text
//! Uninitialized --check_auth--> InitializedAnon | InitializedAuth
//! InitializedAuth --logout / failed revalidation--> InitializedAnon
//! InitializedAnon --login / register--> InitializedAuth
//! ```
//!
//! There is no path back to `Uninitialized`: `is_initialized` latches true
//! exactly once per process lifetime.
//!
//! # Persistence
//!
//! Only `{user, is_authenticated}` are persisted (under the `auth-storage`
//! vault key); a fresh store rehydrates them as a stale hint and must not be
//! trusted until [`SessionStore::initialize`] has revalidated against the
//! backend. The two token keys live in the vault only and are the sole
//! source of truth for whether a session is claimed at all.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use marigold_core::Email;

use crate::api::{StorefrontApi, User};
use crate::error::StoreError;
use crate::vault::{self, Vault};

/// Minimum password length accepted before a register call goes out.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Per-operation fallback messages when the backend sends no `detail`.
const LOGIN_FALLBACK: &str = "Login failed. Please try again.";
const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

/// Observable session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// The current user. Replaced wholesale on every successful fetch.
    pub user: Option<User>,
    /// True iff `user` was fetched successfully and is non-null.
    pub is_authenticated: bool,
    /// True while an auth-affecting network call is in flight.
    pub is_loading: bool,
    /// One-shot latch: false until the first authentication check completes.
    pub is_initialized: bool,
}

/// The `{user, is_authenticated}` slice persisted under `auth-storage`.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user: Option<User>,
    is_authenticated: bool,
}

/// Session store over an API client and a vault.
pub struct SessionStore<A, V> {
    api: A,
    vault: V,
    state: SessionState,
}

impl<A: StorefrontApi, V: Vault> SessionStore<A, V> {
    /// Create a store, rehydrating the persisted snapshot if one exists.
    ///
    /// The rehydrated identity is a stale cache: callers must await
    /// [`Self::initialize`] before trusting `is_authenticated`.
    pub fn new(api: A, vault: V) -> Self {
        let persisted = vault
            .get(vault::keys::AUTH_SNAPSHOT)
            .and_then(|raw| match serde_json::from_str::<PersistedSession>(&raw) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable session snapshot");
                    None
                }
            });

        let state = persisted.map_or(
            SessionState {
                user: None,
                is_authenticated: false,
                is_loading: true,
                is_initialized: false,
            },
            |p| SessionState {
                user: p.user,
                is_authenticated: p.is_authenticated,
                is_loading: true,
                is_initialized: false,
            },
        );

        Self { api, vault, state }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Guarded entry point: validates the persisted session exactly once.
    ///
    /// No-ops if initialization already completed, so any number of mounting
    /// views can call it without duplicating validation traffic.
    pub async fn initialize(&mut self) {
        if self.state.is_initialized {
            return;
        }
        self.check_auth().await;
    }

    /// Authenticate with email and password.
    ///
    /// On success the token pair is persisted and the profile fetched; on
    /// failure nothing is cleared - tokens from a prior session remain
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`StoreError`]: `Validation` before any network
    /// call for a malformed email, otherwise the backend's `detail` message
    /// (or a generic fallback).
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), StoreError> {
        self.state.is_loading = true;

        let email = self.validate_email(email)?;

        let tokens = match self.api.login(email.as_str(), password).await {
            Ok(tokens) => tokens,
            Err(e) => return Err(self.fail_attempt(&e, LOGIN_FALLBACK)),
        };
        self.claim_tokens_and_fetch_profile(&tokens, LOGIN_FALLBACK)
            .await
    }

    /// Register a new account. Identical contract to [`Self::login`];
    /// registration immediately authenticates the new user.
    ///
    /// # Errors
    ///
    /// As [`Self::login`], plus a `Validation` error for a password shorter
    /// than the minimum length.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), StoreError> {
        self.state.is_loading = true;

        let email = self.validate_email(email)?;
        if password.len() < MIN_PASSWORD_LENGTH {
            self.state.is_loading = false;
            self.state.is_initialized = true;
            return Err(StoreError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let tokens = match self.api.register(name, email.as_str(), password).await {
            Ok(tokens) => tokens,
            Err(e) => return Err(self.fail_attempt(&e, REGISTER_FALLBACK)),
        };
        self.claim_tokens_and_fetch_profile(&tokens, REGISTER_FALLBACK)
            .await
    }

    /// Drop the session: remove both tokens, reset to anonymous.
    ///
    /// Synchronous and idempotent. `is_initialized` is left alone - the
    /// store stays initialized for the rest of the process lifetime.
    pub fn logout(&mut self) {
        self.vault.remove(vault::keys::ACCESS_TOKEN);
        self.vault.remove(vault::keys::REFRESH_TOKEN);
        self.state.user = None;
        self.state.is_authenticated = false;
        self.state.is_loading = false;
        self.persist();
    }

    /// Revalidate the persisted session against the backend.
    ///
    /// With no stored access token this settles into the anonymous terminal
    /// state without a network call. Any failure of the profile fetch purges
    /// both tokens and lands in the same anonymous state - this is the sole
    /// recovery path for stale or revoked sessions, and it is silent because
    /// it runs unattended on every protected-view mount.
    pub async fn check_auth(&mut self) {
        self.state.is_loading = true;

        let Some(token) = self.vault.get(vault::keys::ACCESS_TOKEN) else {
            self.enter_anonymous();
            return;
        };

        match self.api.current_user(&token).await {
            Ok(user) => self.enter_authenticated(user),
            Err(e) => {
                tracing::debug!(error = %e, "session revalidation failed; clearing credentials");
                self.vault.remove(vault::keys::ACCESS_TOKEN);
                self.vault.remove(vault::keys::REFRESH_TOKEN);
                self.enter_anonymous();
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn validate_email(&mut self, email: &str) -> Result<Email, StoreError> {
        Email::parse(email).map_err(|e| {
            self.state.is_loading = false;
            self.state.is_initialized = true;
            StoreError::validation(e.to_string())
        })
    }

    async fn claim_tokens_and_fetch_profile(
        &mut self,
        tokens: &crate::api::AuthTokens,
        fallback: &str,
    ) -> Result<(), StoreError> {
        self.vault
            .set(vault::keys::ACCESS_TOKEN, tokens.access_token.expose_secret());
        self.vault.set(
            vault::keys::REFRESH_TOKEN,
            tokens.refresh_token.expose_secret(),
        );

        match self
            .api
            .current_user(tokens.access_token.expose_secret())
            .await
        {
            Ok(user) => {
                self.enter_authenticated(user);
                Ok(())
            }
            Err(e) => Err(self.fail_attempt(&e, fallback)),
        }
    }

    /// Settle a failed login/register attempt without touching identity.
    fn fail_attempt(&mut self, err: &crate::api::ApiError, fallback: &str) -> StoreError {
        self.state.is_loading = false;
        self.state.is_initialized = true;
        StoreError::from_api(err, fallback)
    }

    fn enter_authenticated(&mut self, user: User) {
        self.state.user = Some(user);
        self.state.is_authenticated = true;
        self.state.is_loading = false;
        self.state.is_initialized = true;
        self.persist();
    }

    fn enter_anonymous(&mut self) {
        self.state.user = None;
        self.state.is_authenticated = false;
        self.state.is_loading = false;
        self.state.is_initialized = true;
        self.persist();
    }

    fn persist(&self) {
        let snapshot = PersistedSession {
            user: self.state.user.clone(),
            is_authenticated: self.state.is_authenticated,
        };
        match serde_json::to_string(&snapshot) {
            Ok(raw) => self.vault.set(vault::keys::AUTH_SNAPSHOT, &raw),
            Err(e) => tracing::warn!(error = %e, "failed to serialize session snapshot"),
        }
    }
}
