//! Gateway entry-point: loads settings, wires adapters and serves HTTP.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use marketplace_gateway::domain::{AuthEventBus, AuthStateChange};
use marketplace_gateway::inbound::http::health::HealthState;
use marketplace_gateway::outbound::identity::identity_config_from_env;
use marketplace_gateway::outbound::persistence::{DbPool, PoolConfig};
use ortho_config::OrthoConfig;
use server::{GatewaySettings, ServerConfig, create_server};

fn io_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

/// Write every authentication state change to the audit log.
async fn audit_auth_events(mut events: broadcast::Receiver<AuthStateChange>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let (trace_id, user_id) = match &event {
                    AuthStateChange::SignedOut { trace_id, user_id }
                    | AuthStateChange::AccessDenied {
                        trace_id, user_id, ..
                    } => (trace_id, user_id),
                };
                info!(
                    target: "audit",
                    kind = event.kind(),
                    trace_id = trace_id.as_ref().map(ToString::to_string),
                    user_id = user_id.as_ref().map(ToString::to_string),
                    "auth state changed"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(target: "audit", skipped, "audit log fell behind auth events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn build_config(settings: &GatewaySettings) -> std::io::Result<ServerConfig> {
    let mut config = ServerConfig::new(
        settings.bind_addr().map_err(io_error)?,
        settings.protected_prefix().map_err(io_error)?,
        settings.identity_timeout().map_err(io_error)?,
    );

    match identity_config_from_env(&DefaultEnv::new()) {
        Ok(identity) => config = config.with_identity_store(identity),
        Err(err) => warn!(error = %err, "identity store not configured"),
    }

    if let Some(url) = settings.database_url() {
        let mut pool_config = PoolConfig::new(url);
        if let Some(max) = settings.database_max_connections {
            pool_config = pool_config.with_max_size(max);
        }
        let pool = DbPool::new(pool_config).await.map_err(io_error)?;
        config = config.with_db_pool(pool);
    }

    Ok(config)
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GatewaySettings::load().map_err(io_error)?;
    let config = build_config(&settings).await?;

    let events = AuthEventBus::default();
    actix_web::rt::spawn(audit_auth_events(events.subscribe()));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config, Arc::new(events))?;
    server.await
}
