//! Request-time access gateway for the protected dashboard area.
//!
//! Evaluation walks four checks in order and stops at the first redirect:
//! configuration, session, identity, then role. Nothing is cached between
//! evaluations, so a revoked session or a changed role takes effect on the
//! very next request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::ports::{AccessGate, AuthEventPublisher, IdentityStore};
use super::{AuthStateChange, Principal, Role, SessionCredentials, TraceId, UserId, resolve_role};

/// Where a refused request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectTarget {
    ConfigError,
    Login,
    Unauthorized,
}

impl RedirectTarget {
    /// Absolute path used in the `Location` header.
    pub const fn path(self) -> &'static str {
        match self {
            Self::ConfigError => "/config-error",
            Self::Login => "/login",
            Self::Unauthorized => "/unauthorized",
        }
    }
}

/// Terminal outcome of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Allow,
    Redirect(RedirectTarget),
}

/// Why the gateway reached its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessReason {
    /// The caller is an admitted staff member.
    Admitted(Principal),
    /// No identity store connection is configured.
    MissingConfiguration,
    /// No credentials were presented or the session has expired.
    NoSession,
    /// The session lookup failed in transport.
    SessionLookupFailed,
    /// The identity lookup failed in transport.
    IdentityLookupFailed,
    /// The identity's role does not grant access.
    InsufficientRole {
        user_id: Option<UserId>,
        role: Option<Role>,
    },
}

/// Outcome plus reason for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    outcome: AccessOutcome,
    reason: AccessReason,
}

impl AccessDecision {
    /// Admit `principal`.
    pub fn allow(principal: Principal) -> Self {
        Self {
            outcome: AccessOutcome::Allow,
            reason: AccessReason::Admitted(principal),
        }
    }

    /// Refuse with `target`.
    pub fn redirect(target: RedirectTarget, reason: AccessReason) -> Self {
        Self {
            outcome: AccessOutcome::Redirect(target),
            reason,
        }
    }

    pub fn outcome(&self) -> AccessOutcome {
        self.outcome
    }

    pub fn reason(&self) -> &AccessReason {
        &self.reason
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self.outcome, AccessOutcome::Allow)
    }

    /// Redirect target, if the request was refused.
    pub fn redirect_target(&self) -> Option<RedirectTarget> {
        match self.outcome {
            AccessOutcome::Allow => None,
            AccessOutcome::Redirect(target) => Some(target),
        }
    }

    /// Consume the decision, yielding the admitted principal.
    pub fn into_principal(self) -> Option<Principal> {
        match self.reason {
            AccessReason::Admitted(principal) => Some(principal),
            _ => None,
        }
    }
}

/// Access gateway service.
///
/// Holds no per-request state. An unconfigured gateway refuses every
/// request with [`RedirectTarget::ConfigError`].
#[derive(Clone)]
pub struct AccessGateway {
    store: Option<Arc<dyn IdentityStore>>,
    events: Arc<dyn AuthEventPublisher>,
}

impl AccessGateway {
    /// Gateway backed by a configured identity store.
    pub fn new(store: Arc<dyn IdentityStore>, events: Arc<dyn AuthEventPublisher>) -> Self {
        Self {
            store: Some(store),
            events,
        }
    }

    /// Gateway for a deployment whose identity store is not configured.
    pub fn unconfigured(events: Arc<dyn AuthEventPublisher>) -> Self {
        Self {
            store: None,
            events,
        }
    }

    fn deny(&self, user_id: Option<UserId>, role: Option<Role>) -> AccessDecision {
        warn!(
            user_id = user_id.as_ref().map(UserId::as_ref),
            role = role.map(Role::as_str),
            "access denied: role does not grant dashboard access"
        );
        self.events.publish(AuthStateChange::AccessDenied {
            trace_id: TraceId::current(),
            user_id: user_id.clone(),
            role,
        });
        AccessDecision::redirect(
            RedirectTarget::Unauthorized,
            AccessReason::InsufficientRole { user_id, role },
        )
    }
}

#[async_trait]
impl AccessGate for AccessGateway {
    async fn evaluate(&self, credentials: &SessionCredentials) -> AccessDecision {
        let Some(store) = self.store.as_ref() else {
            error!("identity store connection is not configured");
            return AccessDecision::redirect(
                RedirectTarget::ConfigError,
                AccessReason::MissingConfiguration,
            );
        };

        let session = match store.get_session(credentials).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("no active session");
                return AccessDecision::redirect(RedirectTarget::Login, AccessReason::NoSession);
            }
            Err(err) => {
                debug!(error = %err, "session lookup failed");
                return AccessDecision::redirect(
                    RedirectTarget::Login,
                    AccessReason::SessionLookupFailed,
                );
            }
        };

        let identity = match store.get_user(&session).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "identity lookup failed");
                return AccessDecision::redirect(
                    RedirectTarget::Login,
                    AccessReason::IdentityLookupFailed,
                );
            }
        };

        let role = resolve_role(identity.as_ref());
        match (identity, role) {
            (Some(identity), Some(role)) if role.is_staff() => {
                let principal = Principal::new(
                    identity.id().clone(),
                    identity.email().map(str::to_owned),
                    role,
                );
                debug!(user_id = %principal.user_id(), "access granted");
                AccessDecision::allow(principal)
            }
            (identity, role) => self.deny(identity.map(|found| found.id().clone()), role),
        }
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
