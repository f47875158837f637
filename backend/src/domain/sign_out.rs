//! Ending a staff session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ports::{AuthEventPublisher, IdentityStore, SessionCommand};
use super::{AuthStateChange, SessionCredentials, TraceId};

/// Revokes the request's session at the identity store and announces it.
///
/// Store failures are logged and swallowed so the caller can always drop
/// its local credentials.
#[derive(Clone)]
pub struct SignOutService {
    store: Option<Arc<dyn IdentityStore>>,
    events: Arc<dyn AuthEventPublisher>,
}

impl SignOutService {
    pub fn new(store: Arc<dyn IdentityStore>, events: Arc<dyn AuthEventPublisher>) -> Self {
        Self {
            store: Some(store),
            events,
        }
    }

    /// Service for a deployment without an identity store; it only
    /// announces the sign-out.
    pub fn unconfigured(events: Arc<dyn AuthEventPublisher>) -> Self {
        Self {
            store: None,
            events,
        }
    }
}

#[async_trait]
impl SessionCommand for SignOutService {
    async fn sign_out(&self, credentials: &SessionCredentials) {
        let mut user_id = None;
        if let Some(store) = self.store.as_ref() {
            match store.get_session(credentials).await {
                Ok(Some(session)) => {
                    match store.get_user(&session).await {
                        Ok(identity) => user_id = identity.map(|found| found.id().clone()),
                        Err(err) => debug!(error = %err, "could not identify signing-out user"),
                    }
                    if let Err(err) = store.sign_out(&session).await {
                        warn!(error = %err, "identity store sign-out failed");
                    }
                }
                Ok(None) => debug!("sign-out without an active session"),
                Err(err) => debug!(error = %err, "session lookup failed during sign-out"),
            }
        }
        self.events.publish(AuthStateChange::SignedOut {
            trace_id: TraceId::current(),
            user_id,
        });
    }
}
