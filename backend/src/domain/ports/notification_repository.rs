//! Driven port for notification persistence.
//!
//! A batch is written in one call and is all-or-nothing: an adapter either
//! returns every stored record or an error, never a partial write.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{NotificationDraft, NotificationRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// The insert failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Port for writing notification batches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert every draft in a single atomic write and return the stored
    /// records in insertion order.
    async fn insert_many(
        &self,
        drafts: &[NotificationDraft],
    ) -> Result<Vec<NotificationRecord>, NotificationRepositoryError>;
}

/// In-memory repository used when no database is configured.
#[derive(Debug, Default)]
pub struct FixtureNotificationRepository {
    records: Mutex<Vec<NotificationRecord>>,
}

impl FixtureNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NotificationRepository for FixtureNotificationRepository {
    async fn insert_many(
        &self,
        drafts: &[NotificationDraft],
    ) -> Result<Vec<NotificationRecord>, NotificationRepositoryError> {
        let created_at = Utc::now();
        let stored: Vec<NotificationRecord> = drafts
            .iter()
            .map(|draft| NotificationRecord {
                id: Uuid::new_v4(),
                user_id: draft.user_id.clone(),
                title: draft.title.clone(),
                message: draft.message.clone(),
                kind: draft.kind.clone(),
                metadata: Value::Object(draft.metadata.clone()),
                read: draft.read,
                created_at,
            })
            .collect();
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(stored.iter().cloned());
        Ok(stored)
    }
}
