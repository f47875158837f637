//! Builders selecting real adapters or in-memory fallbacks for each port.

use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use tracing::warn;

use marketplace_gateway::domain::ports::{
    AccessGate, AuthEventPublisher, FixtureNotificationRepository, IdentityStore,
    IdentityStoreError, NotificationCommand, NotificationRepository, SessionCommand,
};
use marketplace_gateway::domain::{
    AccessGateway, Identity, NotificationFanoutService, Session, SessionCredentials,
    SignOutService,
};
use marketplace_gateway::inbound::http::state::HttpState;
use marketplace_gateway::outbound::identity::HttpIdentityStore;
use marketplace_gateway::outbound::persistence::{DbPool, DieselNotificationRepository};

use super::ServerConfig;

/// Identity store used for audience resolution when none is configured.
///
/// Every call fails, so role and broadcast fan-outs report the store as
/// unavailable while single-user sends keep working.
struct UnconfiguredIdentityStore;

fn not_configured() -> IdentityStoreError {
    IdentityStoreError::connection("identity store is not configured")
}

#[async_trait]
impl IdentityStore for UnconfiguredIdentityStore {
    async fn get_session(
        &self,
        _credentials: &SessionCredentials,
    ) -> Result<Option<Session>, IdentityStoreError> {
        Err(not_configured())
    }

    async fn get_user(&self, _session: &Session) -> Result<Option<Identity>, IdentityStoreError> {
        Err(not_configured())
    }

    async fn list_users(&self) -> Result<Vec<Identity>, IdentityStoreError> {
        Err(not_configured())
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), IdentityStoreError> {
        Err(not_configured())
    }
}

/// Ports shared by every worker.
#[derive(Clone)]
pub(super) struct GatewayPorts {
    pub(super) gate: Arc<dyn AccessGate>,
    pub(super) http_state: web::Data<HttpState>,
}

fn build_identity_store(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<Option<Arc<dyn IdentityStore>>> {
    let Some(identity) = config.identity.clone() else {
        return Ok(None);
    };
    let store = HttpIdentityStore::new(identity, config.identity_timeout, clock).map_err(|err| {
        std::io::Error::other(format!("identity store client construction failed: {err}"))
    })?;
    Ok(Some(Arc::new(store)))
}

/// Only debug builds may keep notifications in process memory.
const IN_MEMORY_NOTIFICATIONS_ALLOWED: bool = cfg!(debug_assertions);

fn build_notification_repository(
    pool: Option<&DbPool>,
    allow_in_memory: bool,
) -> std::io::Result<Arc<dyn NotificationRepository>> {
    match pool {
        Some(pool) => Ok(Arc::new(DieselNotificationRepository::new(pool.clone()))),
        None if allow_in_memory => {
            warn!("no database configured; notifications are kept in memory");
            Ok(Arc::new(FixtureNotificationRepository::new()))
        }
        None => Err(std::io::Error::other(
            "GATEWAY_DATABASE_URL is required outside development builds",
        )),
    }
}

/// Wire domain services onto the configured adapters.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the identity store HTTP client cannot be
/// built, or when a release build has no database configured.
pub(super) fn build_ports(
    config: &ServerConfig,
    events: Arc<dyn AuthEventPublisher>,
) -> std::io::Result<GatewayPorts> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let store = build_identity_store(config, Arc::clone(&clock))?;
    let repository =
        build_notification_repository(config.db_pool.as_ref(), IN_MEMORY_NOTIFICATIONS_ALLOWED)?;

    let (gate, sessions): (Arc<dyn AccessGate>, Arc<dyn SessionCommand>) = match &store {
        Some(store) => (
            Arc::new(AccessGateway::new(Arc::clone(store), Arc::clone(&events))),
            Arc::new(SignOutService::new(Arc::clone(store), events)),
        ),
        None => {
            warn!("identity store not configured; protected routes redirect to /config-error");
            (
                Arc::new(AccessGateway::unconfigured(Arc::clone(&events))),
                Arc::new(SignOutService::unconfigured(events)),
            )
        }
    };

    let audience_store: Arc<dyn IdentityStore> = match store {
        Some(store) => store,
        None => Arc::new(UnconfiguredIdentityStore),
    };
    let notifications: Arc<dyn NotificationCommand> = Arc::new(NotificationFanoutService::new(
        audience_store,
        repository,
        clock,
    ));

    Ok(GatewayPorts {
        gate,
        http_state: web::Data::new(HttpState::new(notifications, sessions)),
    })
}
