//! Credential extraction and the admitted-staff extractor.
//!
//! The identity store's browser client keeps the access token and its
//! expiry in cookies; API clients may send `Authorization: Bearer` instead.
//! Either way the handler or middleware receives an explicit
//! [`SessionCredentials`] value rather than reading ambient state.

use actix_web::cookie::Cookie;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponseBuilder, dev::Payload};
use chrono::{DateTime, Utc};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::{Error, Principal, SessionCredentials, SessionToken};

/// Cookie holding the identity store access token.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// Cookie holding the access token expiry as Unix seconds.
pub const EXPIRES_AT_COOKIE: &str = "sb-expires-at";

const BEARER_PREFIX: &str = "Bearer ";

/// Read the credentials presented with `req`.
///
/// The access token cookie wins over a bearer header. Malformed values are
/// treated as absent.
pub fn credentials_from_request(req: &HttpRequest) -> SessionCredentials {
    let Some(token) = cookie_token(req).or_else(|| bearer_token(req)) else {
        return SessionCredentials::anonymous();
    };
    SessionCredentials::new(token, cookie_expiry(req))
}

fn cookie_token(req: &HttpRequest) -> Option<SessionToken> {
    let cookie = req.cookie(ACCESS_TOKEN_COOKIE)?;
    SessionToken::new(cookie.value()).ok()
}

fn bearer_token(req: &HttpRequest) -> Option<SessionToken> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let raw = header.strip_prefix(BEARER_PREFIX)?;
    SessionToken::new(raw.trim()).ok()
}

fn cookie_expiry(req: &HttpRequest) -> Option<DateTime<Utc>> {
    let cookie = req.cookie(EXPIRES_AT_COOKIE)?;
    let parsed = cookie
        .value()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    if parsed.is_none() {
        debug!(value = cookie.value(), "ignoring malformed session expiry cookie");
    }
    parsed
}

/// Append removal cookies for both credential cookies.
pub fn clear_credential_cookies(builder: &mut HttpResponseBuilder) {
    for name in [ACCESS_TOKEN_COOKIE, EXPIRES_AT_COOKIE] {
        let mut cookie = Cookie::build(name, "").path("/").http_only(true).finish();
        cookie.make_removal();
        builder.cookie(cookie);
    }
}

/// Extractor yielding the request's [`SessionCredentials`].
#[derive(Debug, Clone)]
pub struct RequestCredentials(pub SessionCredentials);

impl FromRequest for RequestCredentials {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self(credentials_from_request(req))))
    }
}

/// Extractor yielding the staff member admitted by the access gate.
///
/// Fails with `401` when used on a route the gate does not cover.
#[derive(Debug, Clone)]
pub struct AuthenticatedStaff(pub Principal);

impl FromRequest for AuthenticatedStaff {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        ready(principal.map(Self).ok_or_else(|| Error::unauthorized("staff session required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::HttpResponse;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    fn token_of(credentials: &SessionCredentials) -> Option<&str> {
        credentials.access_token().map(SessionToken::expose)
    }

    #[rstest]
    fn reads_token_and_expiry_from_cookies() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "tok-cookie"))
            .cookie(Cookie::new(EXPIRES_AT_COOKIE, "1700000000"))
            .to_http_request();

        let credentials = credentials_from_request(&req);

        assert_eq!(token_of(&credentials), Some("tok-cookie"));
        assert_eq!(
            credentials.expires_at(),
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
        );
    }

    #[rstest]
    fn falls_back_to_bearer_header() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer tok-header"))
            .to_http_request();

        let credentials = credentials_from_request(&req);

        assert_eq!(token_of(&credentials), Some("tok-header"));
        assert!(credentials.expires_at().is_none());
    }

    #[rstest]
    fn cookie_wins_over_bearer_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "tok-cookie"))
            .insert_header((AUTHORIZATION, "Bearer tok-header"))
            .to_http_request();

        assert_eq!(token_of(&credentials_from_request(&req)), Some("tok-cookie"));
    }

    #[rstest]
    #[case(TestRequest::default())]
    #[case(TestRequest::default().insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz")))]
    #[case(TestRequest::default().insert_header((AUTHORIZATION, "Bearer   ")))]
    #[case(TestRequest::default().cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "")))]
    fn missing_or_malformed_credentials_are_anonymous(#[case] req: TestRequest) {
        let credentials = credentials_from_request(&req.to_http_request());
        assert_eq!(credentials, SessionCredentials::anonymous());
    }

    #[rstest]
    fn malformed_expiry_is_ignored() {
        let req = TestRequest::default()
            .cookie(Cookie::new(ACCESS_TOKEN_COOKIE, "tok"))
            .cookie(Cookie::new(EXPIRES_AT_COOKIE, "tomorrow"))
            .to_http_request();

        let credentials = credentials_from_request(&req);

        assert_eq!(token_of(&credentials), Some("tok"));
        assert!(credentials.expires_at().is_none());
    }

    #[rstest]
    fn clearing_cookies_emits_removals() {
        let mut builder = HttpResponse::SeeOther();
        clear_credential_cookies(&mut builder);
        let response = builder.finish();

        let removed: Vec<_> = response
            .cookies()
            .map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
            .collect();
        assert_eq!(
            removed,
            [
                (ACCESS_TOKEN_COOKIE.to_owned(), String::new()),
                (EXPIRES_AT_COOKIE.to_owned(), String::new()),
            ]
        );
    }
}
