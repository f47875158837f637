//! HTTP server configuration object.

use std::net::SocketAddr;
use std::time::Duration;

use marketplace_gateway::middleware::ProtectedPrefix;
use marketplace_gateway::outbound::identity::IdentityStoreConfig;
use marketplace_gateway::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) prefix: ProtectedPrefix,
    pub(crate) identity: Option<IdentityStoreConfig>,
    pub(crate) identity_timeout: Duration,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, prefix: ProtectedPrefix, identity_timeout: Duration) -> Self {
        Self {
            bind_addr,
            prefix,
            identity: None,
            identity_timeout,
            db_pool: None,
        }
    }

    /// Connect the gateway to an identity store.
    ///
    /// Without one the gateway redirects protected requests to the
    /// configuration error page and audiences cannot be resolved.
    #[must_use]
    pub fn with_identity_store(mut self, identity: IdentityStoreConfig) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Store notifications in PostgreSQL instead of memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
