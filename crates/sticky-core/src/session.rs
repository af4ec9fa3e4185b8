//! Auth session held in local storage.

use std::fmt;

use crate::error::{Error, Result, ValidationError};
use crate::storage::{LocalStorage, TOKEN_KEY, USERNAME_KEY};

/// Bearer token and the username it belongs to
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        let username = username.into().trim().to_string();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        if token.is_empty() {
            return Err(Error::Auth("token must not be empty".to_string()));
        }
        Ok(Self { token, username })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore<S: LocalStorage> {
    storage: S,
}

impl<S: LocalStorage> SessionStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// The stored session, if a token is present.
    pub fn load(&self) -> Result<Option<Session>> {
        let Some(token) = self.storage.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        let username = self.storage.get(USERNAME_KEY)?.unwrap_or_default();
        Ok(Session::new(token, username).ok())
    }

    /// The stored session, or the login-required error.
    pub fn require(&self) -> Result<Session> {
        self.load()?
            .ok_or_else(|| Error::Auth("not signed in; log in to continue".to_string()))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        self.storage.set(TOKEN_KEY, &session.token)?;
        self.storage.set(USERNAME_KEY, &session.username)
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USERNAME_KEY)
    }
}
