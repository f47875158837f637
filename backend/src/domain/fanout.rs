//! Notification fan-out service.
//!
//! A fan-out validates its content, resolves the audience, then writes one
//! unread record per recipient in a single batch. The batch is
//! all-or-nothing: a failed write means no recipient was notified.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use super::ports::{
    IdentityStore, NotificationCommand, NotificationRepository, NotificationRepositoryError,
};
use super::{
    AudienceResolver, Error, FanoutResult, NotificationContent, NotificationDraft,
    NotificationTarget, NotificationValidationError, SendNotificationRequest,
};

/// Metadata keys stamped onto every record. They win over caller keys.
pub const AUDIENCE_KEY: &str = "audience";
pub const TARGET_ROLE_KEY: &str = "target_role";
pub const SENT_AT_KEY: &str = "sent_at";

/// Fan-out service implementing [`NotificationCommand`].
#[derive(Clone)]
pub struct NotificationFanoutService {
    audience: AudienceResolver,
    repository: Arc<dyn NotificationRepository>,
    clock: Arc<dyn Clock>,
}

impl NotificationFanoutService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        repository: Arc<dyn NotificationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            audience: AudienceResolver::new(store),
            repository,
            clock,
        }
    }

    fn stamp_metadata(
        &self,
        target: &NotificationTarget,
        mut metadata: Map<String, Value>,
    ) -> Map<String, Value> {
        metadata.insert(AUDIENCE_KEY.to_owned(), json!(target.audience_label()));
        if let NotificationTarget::RoleFilter(role) = target {
            metadata.insert(TARGET_ROLE_KEY.to_owned(), json!(role.as_str()));
        }
        metadata.insert(SENT_AT_KEY.to_owned(), json!(self.clock.utc().to_rfc3339()));
        metadata
    }
}

fn map_validation_error(err: NotificationValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": err.field() }))
}

fn map_repository_error(err: NotificationRepositoryError) -> Error {
    error!(error = %err, "notification batch write failed");
    Error::persistence("failed to record notifications")
}

#[async_trait]
impl NotificationCommand for NotificationFanoutService {
    async fn send(&self, request: SendNotificationRequest) -> Result<FanoutResult, Error> {
        let SendNotificationRequest {
            target,
            title,
            message,
            kind,
            metadata,
        } = request;
        let content = NotificationContent::new(title, message).map_err(map_validation_error)?;

        let recipients = self.audience.resolve(&target).await?;
        if recipients.is_empty() {
            info!(audience = target.audience_label(), "audience is empty; nothing to send");
            return Ok(FanoutResult::empty());
        }

        let metadata = self.stamp_metadata(&target, metadata);
        let drafts: Vec<NotificationDraft> = recipients
            .into_iter()
            .map(|user_id| NotificationDraft {
                user_id,
                title: content.title().to_owned(),
                message: content.message().to_owned(),
                kind: kind.clone(),
                metadata: metadata.clone(),
                read: false,
            })
            .collect();

        let created = self
            .repository
            .insert_many(&drafts)
            .await
            .map_err(map_repository_error)?;
        let result = FanoutResult::from_created(drafts.len(), created);

        if result.failed {
            warn!(
                requested = result.requested,
                created = result.count(),
                "store acknowledged a different number of notifications"
            );
        } else {
            info!(
                audience = target.audience_label(),
                requested = result.requested,
                "notifications sent"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
