#![forbid(unsafe_code)]

//! Auth token ownership.
//!
//! The token lives in an [`Observable`] so views can react to sign-in and
//! sign-out. It is mirrored into one of two stores: the persistent store
//! (survives restarts, like `localStorage`) or the session store (like
//! `sessionStorage`). On construction the persistent store wins.

use std::fmt;
use std::sync::Arc;

use pnl_runtime::{KeyValueStore, Observable, Subscription};
use serde::{Deserialize, Serialize};

/// Storage key for the auth token in both stores.
pub const TOKEN_STORAGE_KEY: &str = "token";

/// Where a newly set token is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPersistence {
    /// Survives restarts.
    #[default]
    Persistent,
    /// Dropped when the browsing session ends.
    Session,
}

/// Credentials sent to `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Successful login body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Explicitly constructed auth state, shared by cloning.
#[derive(Clone)]
pub struct AuthSession {
    token: Observable<Option<String>>,
    persistent: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl AuthSession {
    /// Restore the token from `persistent`, then `session`.
    #[must_use]
    pub fn new(persistent: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        let restored = read_token(persistent.as_ref()).or_else(|| read_token(session.as_ref()));
        tracing::debug!(restored = restored.is_some(), "auth session created");
        Self {
            token: Observable::new(restored),
            persistent,
            session,
        }
    }

    /// The current token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.get()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.with(Option::is_some)
    }

    /// `Authorization` header value, when signed in.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        self.token.with(|t| t.as_ref().map(|t| format!("Bearer {t}")))
    }

    /// Set or clear the token, keeping it in the persistent store.
    pub fn set_token(&self, token: Option<String>) {
        self.set_token_with(token, TokenPersistence::Persistent);
    }

    /// Set the token in the chosen store, or clear it from both.
    ///
    /// An empty token signs out, the same as `None`.
    pub fn set_token_with(&self, token: Option<String>, persistence: TokenPersistence) {
        let token = token.filter(|t| !t.is_empty());
        match &token {
            Some(value) => {
                let store = match persistence {
                    TokenPersistence::Persistent => &self.persistent,
                    TokenPersistence::Session => &self.session,
                };
                if let Err(err) = store.set(TOKEN_STORAGE_KEY, value) {
                    tracing::warn!(store = store.name(), error = %err, "failed to store token");
                }
            }
            None => self.forget_stored(),
        }
        if self.token.set(token) {
            tracing::debug!(authenticated = self.is_authenticated(), "auth state changed");
        }
    }

    /// Store a login response's token.
    pub fn apply_login(&self, response: LoginResponse, persistence: TokenPersistence) {
        self.set_token_with(Some(response.token), persistence);
    }

    /// Sign out.
    pub fn clear(&self) {
        self.set_token(None);
    }

    /// Apply the response policy: a 401 signs the user out.
    ///
    /// Returns `true` if the token was cleared.
    pub fn handle_response_status(&self, status: u16) -> bool {
        if status != 401 {
            return false;
        }
        let had_token = self.is_authenticated();
        tracing::info!(had_token, "unauthorized response, clearing token");
        self.clear();
        had_token
    }

    /// Subscribe to token changes.
    pub fn subscribe(&self, callback: impl Fn(&Option<String>) + 'static) -> Subscription {
        self.token.subscribe(callback)
    }

    fn forget_stored(&self) {
        for store in [&self.persistent, &self.session] {
            if let Err(err) = store.remove(TOKEN_STORAGE_KEY) {
                tracing::warn!(store = store.name(), error = %err, "failed to remove token");
            }
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.persistent.name())
            .field("session", &self.session.name())
            .finish()
    }
}

fn read_token(store: &dyn KeyValueStore) -> Option<String> {
    match store.get(TOKEN_STORAGE_KEY) {
        Ok(token) => token.filter(|t| !t.is_empty()),
        Err(err) => {
            tracing::warn!(store = store.name(), error = %err, "failed to read token");
            None
        }
    }
}
