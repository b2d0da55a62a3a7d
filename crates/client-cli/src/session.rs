//! The current session: who is logged in, with which token.
//!
//! `SessionContext` is the single owner of that state. Components that need
//! auth receive it explicitly instead of reading a global.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use shared::routes::{self, Navigation, Route};
use shared::User;

use crate::api::now_millis;
use crate::error::ClientError;
use crate::storage::LocalStore;

const SESSION_KEY: &str = "session";

/// What is persisted under the session key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: User,
    pub token: String,
}

pub struct SessionContext {
    store: LocalStore,
    current: Option<StoredSession>,
}

impl SessionContext {
    /// Restore whatever session was persisted by a previous login
    pub fn load(store: LocalStore) -> Self {
        let current = store.get::<StoredSession>(SESSION_KEY);
        if let Some(session) = &current {
            tracing::debug!("Restored session for {}", session.user.email);
        }
        Self { store, current }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Start a session and persist it. The password hash is never cached.
    pub fn begin(&mut self, user: &User, token: String) -> Result<(), ClientError> {
        let session = StoredSession {
            user: user.without_secret(),
            token,
        };
        self.store.set(SESSION_KEY, &session)?;
        self.current = Some(session);
        Ok(())
    }

    /// Replace the cached user after a profile or credential change, if it is
    /// the one logged in
    pub fn refresh_user(&mut self, user: &User) -> Result<(), ClientError> {
        let Some(session) = self.current.as_mut() else {
            return Ok(());
        };
        if session.user.id != user.id {
            return Ok(());
        }

        session.user = user.without_secret();
        self.store.set(SESSION_KEY, &*session)?;
        Ok(())
    }

    /// Drop the session from memory and disk. Purely local: the token is not
    /// revoked anywhere.
    pub fn end(&mut self) -> Result<(), ClientError> {
        self.current = None;
        self.store.remove(SESSION_KEY)
    }

    pub fn guard(&self, route: Route) -> Navigation {
        routes::guard(route, self.is_authenticated())
    }
}

/// Parts of a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub issued_at: i64,
}

/// Opaque stand-in token: base64 of `uid:<id>;email:<email>;ts:<millis>`.
/// Nothing verifies it; it only marks that a login happened.
pub fn generate_token(user: &User) -> String {
    STANDARD.encode(format!("uid:{};email:{};ts:{}", user.id, user.email, now_millis()))
}

pub fn decode_token(token: &str) -> Result<TokenClaims, ClientError> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| ClientError::MalformedToken)?;
    let raw = String::from_utf8(bytes).map_err(|_| ClientError::MalformedToken)?;

    let rest = raw.strip_prefix("uid:").ok_or(ClientError::MalformedToken)?;
    let (user_id, rest) = rest.split_once(";email:").ok_or(ClientError::MalformedToken)?;
    let (email, issued_at) = rest.rsplit_once(";ts:").ok_or(ClientError::MalformedToken)?;
    let issued_at = issued_at.parse().map_err(|_| ClientError::MalformedToken)?;

    Ok(TokenClaims {
        user_id: user_id.to_string(),
        email: email.to_string(),
        issued_at,
    })
}
