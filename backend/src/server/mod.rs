//! Server construction and middleware wiring.

mod config;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::GatewaySettings;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

#[cfg(debug_assertions)]
use marketplace_gateway::ApiDoc;
use marketplace_gateway::Trace;
use marketplace_gateway::domain::ports::{AccessGate, AuthEventPublisher};
use marketplace_gateway::inbound::http::auth::sign_out;
use marketplace_gateway::inbound::http::dashboard::current_session;
use marketplace_gateway::inbound::http::error::{json_error_handler, query_error_handler};
use marketplace_gateway::inbound::http::health::{HealthState, live, ready};
use marketplace_gateway::inbound::http::notifications::{fan_out, send_to_user};
use marketplace_gateway::inbound::http::state::HttpState;
use marketplace_gateway::middleware::{AccessGateLayer, ProtectedPrefix};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use state_builders::build_ports;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    gate: Arc<dyn AccessGate>,
    prefix: ProtectedPrefix,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        gate,
        prefix,
    } = deps;

    let dashboard = web::scope(prefix.as_str()).service(current_session);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .wrap(AccessGateLayer::new(gate, prefix))
        .wrap(Trace)
        .service(dashboard)
        .service(send_to_user)
        .service(fan_out)
        .service(sign_out)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the HTTP server.
///
/// `health_state` is marked ready once the listener is bound.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when an adapter cannot be built or the
/// socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    events: Arc<dyn AuthEventPublisher>,
) -> std::io::Result<Server> {
    let ports = build_ports(&config, events)?;
    let ServerConfig {
        bind_addr, prefix, ..
    } = config;
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: ports.http_state.clone(),
            gate: Arc::clone(&ports.gate),
            prefix: prefix.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
