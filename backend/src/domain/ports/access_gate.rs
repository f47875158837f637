//! Driving port for the per-request access decision.

use async_trait::async_trait;

use crate::domain::{AccessDecision, SessionCredentials};

/// Decide whether a request under the protected prefix may proceed.
///
/// Evaluation never fails: every failure mode maps to a redirect.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessGate: Send + Sync {
    async fn evaluate(&self, credentials: &SessionCredentials) -> AccessDecision;
}
