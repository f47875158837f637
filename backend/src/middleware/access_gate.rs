//! Access gate middleware for the protected dashboard prefix.
//!
//! Requests outside the prefix pass straight through. Requests under it are
//! evaluated by an [`AccessGate`]; refused requests receive a
//! `307 Temporary Redirect` and admitted ones carry the [`Principal`] in
//! request extensions for the `AuthenticatedStaff` extractor.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{CACHE_CONTROL, LOCATION};
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

use crate::domain::ports::AccessGate;
use crate::domain::{AccessOutcome, Principal};
use crate::inbound::http::session::credentials_from_request;

/// Default protected path prefix.
pub const DEFAULT_PROTECTED_PREFIX: &str = "/dashboard";

/// Rejected protected prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtectedPrefixError {
    #[error("protected prefix must not be empty or the root path")]
    Root,
    #[error("protected prefix must not contain whitespace: {0:?}")]
    Whitespace(String),
}

/// A normalised path prefix such as `/dashboard`.
///
/// Matching is segment aware: `/dashboard` covers `/dashboard` and
/// `/dashboard/orders` but not `/dashboards`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPrefix(String);

impl ProtectedPrefix {
    /// Normalise `raw` to a single leading slash and no trailing slash.
    ///
    /// # Examples
    /// ```
    /// use marketplace_gateway::middleware::ProtectedPrefix;
    ///
    /// let prefix = ProtectedPrefix::new("dashboard/").expect("valid prefix");
    /// assert_eq!(prefix.as_str(), "/dashboard");
    /// assert!(prefix.covers("/dashboard/orders"));
    /// assert!(!prefix.covers("/dashboards"));
    /// ```
    pub fn new(raw: &str) -> Result<Self, ProtectedPrefixError> {
        if raw.chars().any(char::is_whitespace) {
            return Err(ProtectedPrefixError::Whitespace(raw.to_owned()));
        }
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(ProtectedPrefixError::Root);
        }
        Ok(Self(format!("/{trimmed}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn covers(&self, path: &str) -> bool {
        path.strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

impl Default for ProtectedPrefix {
    fn default() -> Self {
        Self(DEFAULT_PROTECTED_PREFIX.to_owned())
    }
}

/// Middleware factory gating a path prefix.
#[derive(Clone)]
pub struct AccessGateLayer {
    gate: Arc<dyn AccessGate>,
    prefix: ProtectedPrefix,
}

impl AccessGateLayer {
    pub fn new(gate: Arc<dyn AccessGate>, prefix: ProtectedPrefix) -> Self {
        Self { gate, prefix }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGateLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessGateMiddleware {
            service: Rc::new(service),
            gate: Arc::clone(&self.gate),
            prefix: self.prefix.clone(),
        }))
    }
}

/// Service wrapper produced by [`AccessGateLayer`].
pub struct AccessGateMiddleware<S> {
    service: Rc<S>,
    gate: Arc<dyn AccessGate>,
    prefix: ProtectedPrefix,
}

impl<S> AccessGateMiddleware<S> {
    /// Routing matches the percent-decoded path, so both forms are checked.
    fn guards(&self, req: &ServiceRequest) -> bool {
        self.prefix.covers(req.match_info().path()) || self.prefix.covers(req.path())
    }
}

fn redirect_response(location: &'static str) -> HttpResponse {
    HttpResponse::TemporaryRedirect()
        .insert_header((LOCATION, location))
        .insert_header((CACHE_CONTROL, "no-store"))
        .finish()
}

impl<S, B> Service<ServiceRequest> for AccessGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.guards(&req) {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_boxed_body()) });
        }

        let service = Rc::clone(&self.service);
        let gate = Arc::clone(&self.gate);
        Box::pin(async move {
            let credentials = credentials_from_request(req.request());
            let decision = gate.evaluate(&credentials).await;
            match decision.outcome() {
                AccessOutcome::Allow => {
                    if let Some(principal) = decision.into_principal() {
                        req.extensions_mut().insert::<Principal>(principal);
                    }
                    Ok(service.call(req).await?.map_into_boxed_body())
                }
                AccessOutcome::Redirect(target) => {
                    debug!(path = %req.path(), location = target.path(), "access gate redirect");
                    Ok(req.into_response(redirect_response(target.path())))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAccessGate;
    use crate::domain::{
        AccessDecision, AccessReason, RedirectTarget, Role, SessionToken, UserId,
    };
    use crate::inbound::http::session::{ACCESS_TOKEN_COOKIE, AuthenticatedStaff};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, web};
    use rstest::rstest;

    fn admin() -> Principal {
        Principal::new(UserId::new("admin-1").expect("valid id"), None, Role::Admin)
    }

    async fn whoami(staff: AuthenticatedStaff) -> HttpResponse {
        HttpResponse::Ok().body(staff.0.user_id().to_string())
    }

    async fn call(gate: MockAccessGate, request: actix_test::TestRequest) -> ServiceResponse {
        let layer = AccessGateLayer::new(Arc::new(gate), ProtectedPrefix::default());
        let app = actix_test::init_service(
            App::new()
                .wrap(layer)
                .route("/dashboard", web::get().to(whoami))
                .route("/dashboard/orders", web::get().to(whoami))
                .route("/dashboards", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/login", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        actix_test::call_service(&app, request.to_request()).await
    }

    fn location(res: &ServiceResponse) -> Option<&str> {
        res.headers().get(LOCATION).and_then(|v| v.to_str().ok())
    }

    #[rstest]
    #[case("dashboard", "/dashboard")]
    #[case("/dashboard/", "/dashboard")]
    #[case("//staff/area//", "/staff/area")]
    fn prefix_is_normalised(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ProtectedPrefix::new(raw).expect("valid prefix").as_str(), expected);
    }

    #[rstest]
    #[case("", ProtectedPrefixError::Root)]
    #[case("/", ProtectedPrefixError::Root)]
    #[case("/dash board", ProtectedPrefixError::Whitespace("/dash board".to_owned()))]
    fn prefix_rejects_root_and_whitespace(
        #[case] raw: &str,
        #[case] expected: ProtectedPrefixError,
    ) {
        assert_eq!(ProtectedPrefix::new(raw), Err(expected));
    }

    #[rstest]
    #[case("/dashboard", true)]
    #[case("/dashboard/", true)]
    #[case("/dashboard/orders/7", true)]
    #[case("/dashboards", false)]
    #[case("/login", false)]
    #[case("/", false)]
    fn prefix_matching_is_segment_aware(#[case] path: &str, #[case] covered: bool) {
        assert_eq!(ProtectedPrefix::default().covers(path), covered);
    }

    #[rstest]
    #[case(RedirectTarget::ConfigError, AccessReason::MissingConfiguration)]
    #[case(RedirectTarget::Login, AccessReason::NoSession)]
    #[case(
        RedirectTarget::Unauthorized,
        AccessReason::InsufficientRole {
            user_id: Some(UserId::new("vendor-1").expect("valid id")),
            role: Some(Role::Vendor),
        }
    )]
    #[actix_web::test]
    async fn refused_requests_are_redirected(
        #[case] target: RedirectTarget,
        #[case] reason: AccessReason,
    ) {
        let mut gate = MockAccessGate::new();
        gate.expect_evaluate()
            .times(1)
            .return_once(move |_| AccessDecision::redirect(target, reason));

        let res = call(gate, actix_test::TestRequest::get().uri("/dashboard/orders")).await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), Some(target.path()));
        assert_eq!(
            res.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-store")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn admitted_request_reaches_handler_with_principal() {
        let mut gate = MockAccessGate::new();
        gate.expect_evaluate()
            .withf(|credentials| {
                credentials.access_token().map(SessionToken::expose) == Some("tok-admin")
            })
            .times(1)
            .return_once(|_| AccessDecision::allow(admin()));

        let res = call(
            gate,
            actix_test::TestRequest::get()
                .uri("/dashboard")
                .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "tok-admin")),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert_eq!(body.as_ref(), b"admin-1");
    }

    #[rstest]
    #[case("/dashboards")]
    #[case("/login")]
    #[actix_web::test]
    async fn paths_outside_prefix_skip_evaluation(#[case] uri: &str) {
        let mut gate = MockAccessGate::new();
        gate.expect_evaluate().times(0);

        let res = call(gate, actix_test::TestRequest::get().uri(uri)).await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_paths_under_prefix_are_still_gated() {
        let mut gate = MockAccessGate::new();
        gate.expect_evaluate()
            .times(1)
            .return_once(|_| AccessDecision::redirect(RedirectTarget::Login, AccessReason::NoSession));

        let res = call(gate, actix_test::TestRequest::get().uri("/dashboard/missing")).await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), Some("/login"));
    }

    #[rstest]
    #[case("/%64ashboard")]
    #[case("/dash%62oard/orders")]
    #[case("/%64%61%73%68%62%6F%61%72%64/orders")]
    #[actix_web::test]
    async fn percent_encoded_paths_under_prefix_are_gated(#[case] uri: &str) {
        let mut gate = MockAccessGate::new();
        gate.expect_evaluate()
            .times(1)
            .return_once(|_| AccessDecision::redirect(RedirectTarget::Login, AccessReason::NoSession));

        let res = call(gate, actix_test::TestRequest::get().uri(uri)).await;

        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), Some("/login"));
    }

    #[rstest]
    #[actix_web::test]
    async fn percent_encoded_path_reaches_handler_once_admitted() {
        let mut gate = MockAccessGate::new();
        gate.expect_evaluate()
            .times(1)
            .return_once(|_| AccessDecision::allow(admin()));

        let res = call(gate, actix_test::TestRequest::get().uri("/dash%62oard/orders")).await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert_eq!(body.as_ref(), b"admin-1");
    }

    #[rstest]
    #[actix_web::test]
    async fn each_request_is_evaluated_independently() {
        let mut gate = MockAccessGate::new();
        let mut seq = mockall::Sequence::new();
        gate.expect_evaluate()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| AccessDecision::allow(admin()));
        gate.expect_evaluate()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| AccessDecision::redirect(RedirectTarget::Login, AccessReason::NoSession));

        let layer = AccessGateLayer::new(Arc::new(gate), ProtectedPrefix::default());
        let app = actix_test::init_service(
            App::new()
                .wrap(layer)
                .route("/dashboard", web::get().to(whoami)),
        )
        .await;

        let first =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/dashboard").to_request()).await;
        let second =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/dashboard").to_request()).await;

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TEMPORARY_REDIRECT);
    }
}
