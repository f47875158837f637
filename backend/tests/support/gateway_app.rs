//! In-process gateway assembly shared by the behaviour suites.
//!
//! Mirrors the production app wiring around fixture adapters so scenarios
//! exercise the real middleware, handlers and error mapping.

use std::sync::{Arc, Mutex, PoisonError};

use actix_web::http::header::LOCATION;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use async_trait::async_trait;
use serde_json::Value;

use marketplace_gateway::Trace;
use marketplace_gateway::domain::ports::{
    AuthEventPublisher, FixtureNotificationRepository, IdentityStore, IdentityStoreError,
};
use marketplace_gateway::domain::{
    AccessGateway, AuthStateChange, Identity, NotificationFanoutService, Session,
    SessionCredentials, SignOutService,
};
use marketplace_gateway::inbound::http::auth::sign_out;
use marketplace_gateway::inbound::http::dashboard::current_session;
use marketplace_gateway::inbound::http::error::{json_error_handler, query_error_handler};
use marketplace_gateway::inbound::http::health::{HealthState, live, ready};
use marketplace_gateway::inbound::http::notifications::{fan_out, send_to_user};
use marketplace_gateway::inbound::http::state::HttpState;
use marketplace_gateway::middleware::{AccessGateLayer, DEFAULT_PROTECTED_PREFIX, ProtectedPrefix};

/// Identity store whose every call fails as if the network were down.
pub struct UnreachableIdentityStore;

#[async_trait]
impl IdentityStore for UnreachableIdentityStore {
    async fn get_session(
        &self,
        _credentials: &SessionCredentials,
    ) -> Result<Option<Session>, IdentityStoreError> {
        Err(IdentityStoreError::connection("identity store unreachable"))
    }

    async fn get_user(&self, _session: &Session) -> Result<Option<Identity>, IdentityStoreError> {
        Err(IdentityStoreError::connection("identity store unreachable"))
    }

    async fn list_users(&self) -> Result<Vec<Identity>, IdentityStoreError> {
        Err(IdentityStoreError::connection("identity store unreachable"))
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), IdentityStoreError> {
        Err(IdentityStoreError::connection("identity store unreachable"))
    }
}

/// Publisher that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AuthStateChange>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<AuthStateChange> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuthEventPublisher for RecordingPublisher {
    fn publish(&self, event: AuthStateChange) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Adapters backing one scenario. Shared across requests so state such as
/// revoked sessions carries over.
#[derive(Clone)]
pub struct GatewayFixture {
    pub store: Arc<dyn IdentityStore>,
    pub repository: Arc<FixtureNotificationRepository>,
    pub events: Arc<RecordingPublisher>,
}

impl GatewayFixture {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            repository: Arc::new(FixtureNotificationRepository::new()),
            events: Arc::new(RecordingPublisher::default()),
        }
    }
}

/// Response details the scenarios assert on.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Value,
}

/// Run `request` through a freshly assembled app on its own runtime.
pub fn dispatch(fixture: &GatewayFixture, request: TestRequest) -> CapturedResponse {
    let fixture = fixture.clone();
    actix_web::rt::System::new().block_on(async move {
        let events: Arc<dyn AuthEventPublisher> = fixture.events.clone();
        let gate = Arc::new(AccessGateway::new(fixture.store.clone(), events.clone()));
        let fanout = NotificationFanoutService::new(
            fixture.store.clone(),
            fixture.repository.clone(),
            Arc::new(mockable::DefaultClock),
        );
        let sessions = SignOutService::new(fixture.store.clone(), events);
        let http_state = web::Data::new(HttpState::new(Arc::new(fanout), Arc::new(sessions)));
        let health_state = web::Data::new(HealthState::new());

        let app = test::init_service(
            App::new()
                .app_data(health_state)
                .app_data(http_state)
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .wrap(AccessGateLayer::new(gate, ProtectedPrefix::default()))
                .wrap(Trace)
                .service(web::scope(DEFAULT_PROTECTED_PREFIX).service(current_session))
                .service(send_to_user)
                .service(fan_out)
                .service(sign_out)
                .service(ready)
                .service(live),
        )
        .await;

        let response = test::call_service(&app, request.to_request()).await;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = test::read_body(response).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON response body")
        };

        CapturedResponse {
            status,
            location,
            body,
        }
    })
}
