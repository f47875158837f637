//! Notification fan-out data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Role, UserId};

/// Validation errors for notification content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("notification type must not be empty")]
    EmptyKind,
}

impl NotificationValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "title",
            Self::EmptyMessage => "message",
            Self::EmptyKind => "type",
        }
    }
}

/// Free-form notification category. Defaults to `system`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NotificationKind(String);

impl NotificationKind {
    pub const SYSTEM: &'static str = "system";

    pub fn new(kind: impl Into<String>) -> Result<Self, NotificationValidationError> {
        let kind = kind.into();
        if kind.trim().is_empty() {
            return Err(NotificationValidationError::EmptyKind);
        }
        Ok(Self(kind))
    }

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_owned())
    }
}

impl Default for NotificationKind {
    fn default() -> Self {
        Self::system()
    }
}

impl AsRef<str> for NotificationKind {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NotificationKind> for String {
    fn from(value: NotificationKind) -> Self {
        value.0
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = NotificationValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validated title and body shared by every record in a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    title: String,
    message: String,
}

impl NotificationContent {
    /// Both fields must be non-blank once trimmed. Title is checked first.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, NotificationValidationError> {
        let title = title.into();
        let message = message.into();
        if title.trim().is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        if message.trim().is_empty() {
            return Err(NotificationValidationError::EmptyMessage);
        }
        Ok(Self { title, message })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    /// Exactly one user. The id is not checked against the identity store.
    SingleUser(UserId),
    /// Every user whose resolved role equals the given role.
    RoleFilter(Role),
    /// Every user known to the identity store.
    Broadcast,
}

impl NotificationTarget {
    /// Audience label written into record metadata.
    pub fn audience_label(&self) -> &'static str {
        match self {
            Self::SingleUser(_) => "user",
            Self::RoleFilter(_) => "role",
            Self::Broadcast => "broadcast",
        }
    }
}

/// Input to a single fan-out.
///
/// Title and message are carried raw so the fan-out service can report
/// validation failures as domain errors.
#[derive(Debug, Clone, PartialEq)]
pub struct SendNotificationRequest {
    pub target: NotificationTarget,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub metadata: Map<String, Value>,
}

impl SendNotificationRequest {
    /// Request with the default `system` kind and empty metadata.
    pub fn new(
        target: NotificationTarget,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target,
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::default(),
            metadata: Map::new(),
        }
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A notification ready to be written. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub metadata: Map<String, Value>,
    pub read: bool,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub metadata: Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a fan-out that reached the store.
///
/// `failed` is set, together with `error`, only when the store acknowledged
/// a different number of records than were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutResult {
    pub requested: usize,
    pub created: Vec<NotificationRecord>,
    pub failed: bool,
    pub error: Option<String>,
}

impl FanoutResult {
    /// Result for an audience that resolved to nobody.
    pub fn empty() -> Self {
        Self {
            requested: 0,
            created: Vec::new(),
            failed: false,
            error: None,
        }
    }

    /// Build a result, flagging a short or long acknowledgement.
    pub fn from_created(requested: usize, created: Vec<NotificationRecord>) -> Self {
        if created.len() == requested {
            return Self {
                requested,
                created,
                failed: false,
                error: None,
            };
        }
        let error = format!(
            "store acknowledged {} of {requested} notifications",
            created.len()
        );
        Self {
            requested,
            created,
            failed: true,
            error: Some(error),
        }
    }

    pub fn count(&self) -> usize {
        self.created.len()
    }
}
