//! Reqwest-backed identity store adapter.
//!
//! Owns transport details only: endpoint construction, auth headers, status
//! mapping, and decoding user payloads into domain identities.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;

use super::config::IdentityStoreConfig;
use super::dto::{UserDto, UserListDto};
use crate::domain::ports::{IdentityStore, IdentityStoreError};
use crate::domain::{Identity, Session, SessionCredentials};

const USER_PATH: &str = "auth/v1/user";
const ADMIN_USERS_PATH: &str = "auth/v1/admin/users";
const LOGOUT_PATH: &str = "auth/v1/logout";
const API_KEY_HEADER: &str = "apikey";

/// Identity store adapter talking to a GoTrue-compatible auth API.
pub struct HttpIdentityStore {
    client: Client,
    config: IdentityStoreConfig,
    clock: Arc<dyn Clock>,
}

impl HttpIdentityStore {
    /// Build an adapter with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        config: IdentityStoreConfig,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config,
            clock,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityStoreError> {
        endpoint(self.config.url(), path)
    }

    fn authorised(&self, request: RequestBuilder, api_key: &str, bearer: &str) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, api_key)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Resolve the user owning `session`; `None` when the token is unknown.
    async fn fetch_user(&self, session: &Session) -> Result<Option<Identity>, IdentityStoreError> {
        let request = self.client.get(self.endpoint(USER_PATH)?);
        let response = self
            .authorised(request, self.config.anon_key(), session.access_token().expose())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if is_unknown_session(status) {
            debug!(status = status.as_u16(), "identity store did not recognise session");
            return Ok(None);
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_user(body.as_ref()).map(Some)
    }
}

/// Join `path` onto `base`, keeping any path prefix `base` already has.
fn endpoint(base: &Url, path: &str) -> Result<Url, IdentityStoreError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|err| IdentityStoreError::connection(format!("invalid endpoint {path}: {err}")))
}

fn map_transport_error(error: reqwest::Error) -> IdentityStoreError {
    if error.is_decode() {
        IdentityStoreError::decode(error.to_string())
    } else {
        IdentityStoreError::connection(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityStoreError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };
    if status.is_server_error() {
        IdentityStoreError::connection(message)
    } else {
        IdentityStoreError::query(message)
    }
}

/// Statuses meaning the token is not (or no longer) recognised.
fn is_unknown_session(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
    )
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

fn parse_user(body: &[u8]) -> Result<Identity, IdentityStoreError> {
    let dto: UserDto = serde_json::from_slice(body)
        .map_err(|err| IdentityStoreError::decode(format!("invalid user payload: {err}")))?;
    dto.into_identity().map_err(IdentityStoreError::decode)
}

fn parse_users(body: &[u8]) -> Result<Vec<Identity>, IdentityStoreError> {
    let dto: UserListDto = serde_json::from_slice(body)
        .map_err(|err| IdentityStoreError::decode(format!("invalid user list payload: {err}")))?;
    dto.into_identities().map_err(IdentityStoreError::decode)
}

#[async_trait]
impl IdentityStore for HttpIdentityStore {
    async fn get_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<Session>, IdentityStoreError> {
        let Some(token) = credentials.access_token() else {
            return Ok(None);
        };
        let session = Session::new(token.clone(), credentials.expires_at());
        if session.is_expired_at(self.clock.utc()) {
            debug!("presented session has expired");
            return Ok(None);
        }
        // Revoked or forged tokens are rejected by the store, not by expiry.
        Ok(self.fetch_user(&session).await?.map(|_| session))
    }

    async fn get_user(&self, session: &Session) -> Result<Option<Identity>, IdentityStoreError> {
        self.fetch_user(session).await
    }

    async fn list_users(&self) -> Result<Vec<Identity>, IdentityStoreError> {
        let service_key = self.config.service_role_key().ok_or_else(|| {
            IdentityStoreError::connection("service role key is not configured")
        })?;
        let request = self.client.get(self.endpoint(ADMIN_USERS_PATH)?);
        let response = self
            .authorised(request, service_key, service_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_users(body.as_ref())
    }

    async fn sign_out(&self, session: &Session) -> Result<(), IdentityStoreError> {
        let request = self.client.post(self.endpoint(LOGOUT_PATH)?);
        let response = self
            .authorised(request, self.config.anon_key(), session.access_token().expose())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() || is_unknown_session(status) {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}
