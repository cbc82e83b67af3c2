//! Session store: the single source of truth for who is logged in.
//!
//! A [`Session`] starts in the loading state and leaves it exactly once, when
//! [`Session::initialize`] resolves the persisted credential. After that the
//! identity only changes through [`Session::login`] and [`Session::logout`].
//!
//! The identity is set if and only if the server accepted the credential on
//! the most recent `initialize` or `login`. There is no state in which an
//! identity is held without its credential having been persisted.

use std::sync::{PoisonError, RwLock};

use payment_voucher_core::{Credential, Identity, NavigationEntry, Role, menu_for};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::credentials::StoreError;
use crate::transport::{ApiClient, ApiError};

/// Endpoint that resolves the current credential to an identity.
pub const ME_PATH: &str = "/auth/me";

/// Endpoint that exchanges a username and password for a credential.
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Message used when the server does not explain a failed login.
pub const LOGIN_FAILED: &str = "Login failed";

/// Errors surfaced by [`Session::login`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server refused the login, or could not be reached.
    #[error("{0}")]
    Authentication(String),

    /// The server accepted the login but the credential could not be saved;
    /// the session stays logged out.
    #[error("failed to persist credential: {0}")]
    Store(#[from] StoreError),
}

/// Snapshot of the session at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Current identity, `None` when logged out.
    pub identity: Option<Identity>,
    /// Whether initialization has not finished yet.
    pub loading: bool,
}

impl SessionState {
    /// State before initialization completes.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }

    /// Initialized with nobody logged in.
    #[must_use]
    pub const fn unauthenticated() -> Self {
        Self {
            identity: None,
            loading: false,
        }
    }

    /// Initialized with `identity` logged in.
    #[must_use]
    pub const fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            loading: false,
        }
    }

    /// Whether someone is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Recognized role of the logged-in identity.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().and_then(Identity::role)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::loading()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: Identity,
}

/// Explicitly constructed session, shared by reference with whatever needs
/// to read it (route guard, menus, views).
#[derive(Debug)]
pub struct Session {
    api: ApiClient,
    state: RwLock<SessionState>,
}

impl Session {
    /// A new session in the loading state.
    ///
    /// The credential store is the one the `api` client reads from, so login
    /// and logout are immediately visible to every subsequent request.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(SessionState::loading()),
        }
    }

    /// Transport shared with peripheral views.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current identity, if logged in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.snapshot().identity
    }

    /// Whether someone is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read(SessionState::is_authenticated)
    }

    /// Whether initialization is still pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read(|state| state.loading)
    }

    /// Navigation entries for the current role; empty while loading or
    /// logged out.
    #[must_use]
    pub fn menu(&self) -> Vec<NavigationEntry> {
        menu_for(self.read(SessionState::role))
    }

    /// Resolve the persisted credential into an identity.
    ///
    /// With no credential stored this makes no network call. Any failure to
    /// resolve a stored credential (rejected, unreachable server, malformed
    /// reply) discards it. Never fails; the outcome is observable through
    /// [`Session::snapshot`].
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        let store = self.api.credentials();

        let credential = match store.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Could not read persisted credential, treating as logged out");
                None
            }
        };

        let identity = if credential.is_some() {
            match self.api.get::<Identity>(ME_PATH).await {
                Ok(identity) => {
                    info!(username = %identity.username, role = %identity.role_name, "Session restored");
                    Some(identity)
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        status = ?e.status,
                        "Persisted credential could not be resolved, discarding it"
                    );
                    if let Err(e) = store.clear() {
                        warn!(error = %e, "Failed to remove persisted credential");
                    }
                    None
                }
            }
        } else {
            debug!("No persisted credential");
            None
        };

        self.replace(SessionState {
            identity,
            loading: false,
        });
    }

    /// Log in with `username` and `password`.
    ///
    /// On success the credential is persisted before the identity becomes
    /// visible. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Authentication` with the server's message, or
    /// [`LOGIN_FAILED`] when it sent none. Returns `SessionError::Store` if
    /// the credential cannot be saved.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Identity, SessionError> {
        let request = LoginRequest {
            username,
            password: password.expose_secret(),
        };

        let response: LoginResponse = self
            .api
            .post(LOGIN_PATH, &request)
            .await
            .map_err(|e| login_failure(&e))?;

        let credential = Credential::new(response.token);
        if credential.is_blank() {
            warn!("Login response carried an empty token");
            return Err(SessionError::Authentication(LOGIN_FAILED.to_string()));
        }

        self.api.credentials().save(&credential)?;

        let identity = response.user;
        info!(role = %identity.role_name, "Login successful");
        self.replace(SessionState {
            identity: Some(identity.clone()),
            loading: false,
        });

        Ok(identity)
    }

    /// Forget the credential and the identity. Safe to call when already
    /// logged out.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        if let Err(e) = self.api.credentials().clear() {
            warn!(error = %e, "Failed to remove persisted credential during logout");
        }
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .identity = None;
        info!("Logged out");
    }

    fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    fn replace(&self, next: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

fn login_failure(err: &ApiError) -> SessionError {
    debug!(kind = ?err.kind, status = ?err.status, "Login request failed");
    SessionError::Authentication(err.server_message().unwrap_or(LOGIN_FAILED).to_string())
}
