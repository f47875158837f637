//! Identity, session, and credential primitives.
//!
//! The identity store owns users and sessions; these types are the shapes
//! the domain reasons about. Nothing here is persisted by the gateway.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroizing;

use super::Role;

/// Validation errors for identity primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityValidationError {
    #[error("user id must not be empty")]
    EmptyUserId,
    #[error("user id must not contain whitespace")]
    WhitespaceInUserId,
    #[error("session token must not be empty")]
    EmptyToken,
}

/// Identifier assigned to a user by the identity store.
///
/// The store owns the format; the domain only requires a non-empty string
/// without whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityValidationError::EmptyUserId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(IdentityValidationError::WhitespaceInUserId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A user record as returned by the identity store.
///
/// `metadata` is free-form profile data. Its `role` key is untrusted until
/// [`resolve_role`](super::resolve_role) has parsed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    id: UserId,
    email: Option<String>,
    metadata: Value,
}

impl Identity {
    pub fn new(id: UserId, email: Option<String>, metadata: Value) -> Self {
        Self {
            id,
            email,
            metadata,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }
}

/// Opaque bearer token issued by the identity store.
///
/// The secret is wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(IdentityValidationError::EmptyToken);
        }
        Ok(Self(Zeroizing::new(raw)))
    }

    /// Borrow the raw token for transmission to the identity store.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(**redacted**)")
    }
}

/// Credentials presented with a single request.
///
/// Built by the inbound adapter from cookies or the `Authorization` header
/// and passed explicitly to every evaluation. An empty carrier means the
/// caller presented nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    access_token: Option<SessionToken>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionCredentials {
    /// Credentials with neither token nor expiry.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(access_token: SessionToken, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: Some(access_token),
            expires_at,
        }
    }

    pub fn access_token(&self) -> Option<&SessionToken> {
        self.access_token.as_ref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// A live session confirmed by the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    access_token: SessionToken,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(access_token: SessionToken, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }

    pub fn access_token(&self) -> &SessionToken {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True when an expiry is known and not after `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// The staff member admitted by the gateway for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    user_id: UserId,
    email: Option<String>,
    role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, email: Option<String>, role: Role) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
