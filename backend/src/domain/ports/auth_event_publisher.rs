//! Driven port for broadcasting authentication state changes.

use crate::domain::AuthStateChange;

/// Publish auth state changes to interested listeners.
///
/// Publishing is fire-and-forget and must not block the request path.
#[cfg_attr(test, mockall::automock)]
pub trait AuthEventPublisher: Send + Sync {
    fn publish(&self, event: AuthStateChange);
}

/// Publisher that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuthEventPublisher;

impl AuthEventPublisher for NoopAuthEventPublisher {
    fn publish(&self, _event: AuthStateChange) {}
}
