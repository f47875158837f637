//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` so they depend only on
//! driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{NotificationCommand, SessionCommand};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub notifications: Arc<dyn NotificationCommand>,
    pub sessions: Arc<dyn SessionCommand>,
}

impl HttpState {
    /// Construct state from driving port implementations.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use marketplace_gateway::domain::ports::{
    ///     FixtureIdentityStore, FixtureNotificationRepository, NoopAuthEventPublisher,
    /// };
    /// use marketplace_gateway::domain::{NotificationFanoutService, SignOutService};
    /// use marketplace_gateway::inbound::http::state::HttpState;
    ///
    /// let store = Arc::new(FixtureIdentityStore::new());
    /// let fanout = NotificationFanoutService::new(
    ///     store.clone(),
    ///     Arc::new(FixtureNotificationRepository::new()),
    ///     Arc::new(mockable::DefaultClock),
    /// );
    /// let sign_out = SignOutService::new(store, Arc::new(NoopAuthEventPublisher));
    /// let state = HttpState::new(Arc::new(fanout), Arc::new(sign_out));
    /// let _notifications = state.notifications.clone();
    /// ```
    pub fn new(
        notifications: Arc<dyn NotificationCommand>,
        sessions: Arc<dyn SessionCommand>,
    ) -> Self {
        Self {
            notifications,
            sessions,
        }
    }
}
