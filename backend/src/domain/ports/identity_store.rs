//! Driven port for the external identity store.
//!
//! The identity store owns users, sessions, and profile metadata. The
//! gateway asks it about the current request's session and the audience
//! resolver asks it for the full user list.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{Identity, Session, SessionCredentials, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity store adapters.
    pub enum IdentityStoreError {
        /// The store could not be reached or is not configured for the call.
        Connection { message: String } =>
            "identity store connection failed: {message}",
        /// The store answered with an unexpected status.
        Query { message: String } =>
            "identity store query failed: {message}",
        /// The store's response could not be decoded.
        Decode { message: String } =>
            "identity store response could not be decoded: {message}",
    }
}

/// Port for reading sessions and users from the identity store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolve the session carried by `credentials`.
    ///
    /// Returns `None` when no credentials were presented or they have
    /// expired.
    async fn get_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<Session>, IdentityStoreError>;

    /// Fetch the user owning `session`.
    ///
    /// Returns `None` when the store does not recognise the session.
    async fn get_user(&self, session: &Session) -> Result<Option<Identity>, IdentityStoreError>;

    /// List every user with profile metadata in one request.
    async fn list_users(&self) -> Result<Vec<Identity>, IdentityStoreError>;

    /// Revoke `session` at the store.
    async fn sign_out(&self, session: &Session) -> Result<(), IdentityStoreError>;
}

/// In-memory identity store for development and tests.
///
/// Sessions map raw access tokens to user ids. Tokens are matched exactly
/// and expiry is ignored.
#[derive(Debug, Default)]
pub struct FixtureIdentityStore {
    users: Vec<Identity>,
    sessions: Mutex<HashMap<String, UserId>>,
}

impl FixtureIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user returned by [`IdentityStore::list_users`].
    pub fn with_user(mut self, identity: Identity) -> Self {
        self.users.push(identity);
        self
    }

    /// Register `token` as a live session for `user_id`.
    pub fn with_session(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.sessions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), user_id);
        self
    }

    fn session_owner(&self, token: &str) -> Option<UserId> {
        let sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.get(token).cloned()
    }
}

#[async_trait]
impl IdentityStore for FixtureIdentityStore {
    async fn get_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<Session>, IdentityStoreError> {
        let Some(token) = credentials.access_token() else {
            return Ok(None);
        };
        if self.session_owner(token.expose()).is_none() {
            return Ok(None);
        }
        Ok(Some(Session::new(token.clone(), credentials.expires_at())))
    }

    async fn get_user(&self, session: &Session) -> Result<Option<Identity>, IdentityStoreError> {
        let Some(owner) = self.session_owner(session.access_token().expose()) else {
            return Ok(None);
        };
        Ok(self.users.iter().find(|user| user.id() == &owner).cloned())
    }

    async fn list_users(&self) -> Result<Vec<Identity>, IdentityStoreError> {
        Ok(self.users.clone())
    }

    async fn sign_out(&self, session: &Session) -> Result<(), IdentityStoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session.access_token().expose());
        Ok(())
    }
}
