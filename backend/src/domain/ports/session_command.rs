//! Driving port for ending a staff session.

use async_trait::async_trait;

use crate::domain::SessionCredentials;

/// Ends the session carried by a request.
///
/// Sign-out is best effort against the identity store; the caller always
/// clears its local credentials afterwards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionCommand: Send + Sync {
    async fn sign_out(&self, credentials: &SessionCredentials);
}
