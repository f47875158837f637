//! Driving port for notification fan-out.
//!
//! Inbound adapters translate their request shapes into a
//! [`SendNotificationRequest`] and call this port; the domain resolves the
//! audience and writes the batch.

use async_trait::async_trait;

use crate::domain::{Error, FanoutResult, SendNotificationRequest};

/// Driving port for sending notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    /// Fan `request` out to its audience.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` when the title or message is blank.
    /// - `NotFound` when a role filter matches nobody.
    /// - `StoreUnavailable` when the identity store cannot list users.
    /// - `PersistenceError` when the batch write fails.
    async fn send(&self, request: SendNotificationRequest) -> Result<FanoutResult, Error>;
}
