//! Gateway settings loaded via OrthoConfig from CLI flags, `GATEWAY_*`
//! environment variables and configuration files.

use std::net::SocketAddr;
use std::time::Duration;

use marketplace_gateway::middleware::{DEFAULT_PROTECTED_PREFIX, ProtectedPrefix};
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error(transparent)]
    Prefix(#[from] marketplace_gateway::middleware::ProtectedPrefixError),
    #[error("identity store timeout must be at least one second")]
    ZeroTimeout,
}

/// Runtime settings for the gateway binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GATEWAY")]
pub struct GatewaySettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Path prefix guarded by the access gate.
    pub protected_prefix: Option<String>,
    /// PostgreSQL URL for notification storage; in-memory when unset.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub database_max_connections: Option<u32>,
    /// Per-request timeout for identity store calls, in seconds.
    pub identity_timeout_secs: Option<u64>,
}

impl GatewaySettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn protected_prefix(&self) -> Result<ProtectedPrefix, SettingsError> {
        let raw = self
            .protected_prefix
            .as_deref()
            .unwrap_or(DEFAULT_PROTECTED_PREFIX);
        Ok(ProtectedPrefix::new(raw)?)
    }

    pub fn identity_timeout(&self) -> Result<Duration, SettingsError> {
        match self.identity_timeout_secs.unwrap_or(DEFAULT_IDENTITY_TIMEOUT_SECS) {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
