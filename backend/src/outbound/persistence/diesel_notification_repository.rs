//! PostgreSQL-backed `NotificationRepository` using Diesel.
//!
//! A batch is one multi-row `INSERT ... RETURNING` statement, so PostgreSQL
//! either stores every recipient's row or none of them. Recipients are
//! identity store users keyed by UUID; an id that is not a UUID, or names no
//! user, fails the whole batch.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{NotificationDraft, NotificationKind, NotificationRecord, UserId};

use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel-backed implementation of the notification repository port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> NotificationRepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    NotificationRepositoryError::connection(message)
}

fn map_diesel_error(error: diesel::result::Error) -> NotificationRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "notification insert failed");
        }
        other => debug!(error = %other, "notification insert failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            NotificationRepositoryError::connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            unknown_recipient()
        }
        DieselError::QueryBuilderError(_) => {
            NotificationRepositoryError::query("database query error")
        }
        _ => NotificationRepositoryError::query("database error"),
    }
}

fn unknown_recipient() -> NotificationRepositoryError {
    NotificationRepositoryError::query("recipient does not exist")
}

fn to_new_row(
    draft: &NotificationDraft,
) -> Result<NewNotificationRow<'_>, NotificationRepositoryError> {
    let user_id = Uuid::parse_str(draft.user_id.as_ref()).map_err(|_| {
        debug!(user_id = %draft.user_id, "recipient id is not an identity store user id");
        unknown_recipient()
    })?;
    Ok(NewNotificationRow {
        user_id,
        title: draft.title.as_str(),
        message: draft.message.as_str(),
        kind: draft.kind.as_ref(),
        metadata: Value::Object(draft.metadata.clone()),
        read: draft.read,
    })
}

fn row_to_record(row: NotificationRow) -> Result<NotificationRecord, NotificationRepositoryError> {
    let NotificationRow {
        id,
        user_id,
        title,
        message,
        kind,
        metadata,
        read,
        created_at,
    } = row;

    let user_id = UserId::new(user_id.to_string())
        .map_err(|err| NotificationRepositoryError::query(format!("stored user id: {err}")))?;
    let kind = NotificationKind::new(kind)
        .map_err(|err| NotificationRepositoryError::query(format!("stored type: {err}")))?;

    Ok(NotificationRecord {
        id,
        user_id,
        title,
        message,
        kind,
        metadata,
        read,
        created_at,
    })
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert_many(
        &self,
        drafts: &[NotificationDraft],
    ) -> Result<Vec<NotificationRecord>, NotificationRepositoryError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let rows = drafts
            .iter()
            .map(to_new_row)
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored: Vec<NotificationRow> = diesel::insert_into(notifications::table)
            .values(&rows)
            .returning(NotificationRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        stored.into_iter().map(row_to_record).collect()
    }
}
