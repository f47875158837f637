//! Authentication state changes and the in-process bus that carries them.
//!
//! Sign-out and access denials are published as messages instead of being
//! written to shared state. Any number of listeners may subscribe; a slow
//! listener loses old events rather than blocking the publisher.

use tokio::sync::broadcast;

use super::ports::AuthEventPublisher;
use super::{Role, TraceId, UserId};

/// Default number of undelivered events retained per subscriber.
pub const DEFAULT_AUTH_EVENT_CAPACITY: usize = 64;

/// A change in a user's authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    /// A session was ended by its owner.
    SignedOut {
        trace_id: Option<TraceId>,
        user_id: Option<UserId>,
    },
    /// An authenticated user was refused entry to the protected area.
    ///
    /// `user_id` is absent when the session resolved to no user record.
    AccessDenied {
        trace_id: Option<TraceId>,
        user_id: Option<UserId>,
        role: Option<Role>,
    },
}

impl AuthStateChange {
    /// Short machine-readable name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SignedOut { .. } => "signed_out",
            Self::AccessDenied { .. } => "access_denied",
        }
    }
}

/// Broadcast channel implementing [`AuthEventPublisher`].
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthStateChange>,
}

impl AuthEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new listener. It sees only events published afterwards.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.sender.subscribe()
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_EVENT_CAPACITY)
    }
}

impl AuthEventPublisher for AuthEventBus {
    fn publish(&self, event: AuthStateChange) {
        // No subscribers is not an error.
        if self.sender.send(event).is_err() {
            tracing::trace!("auth event dropped: no subscribers");
        }
    }
}
