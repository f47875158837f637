//! Notification fan-out handlers.
//!
//! ```text
//! POST /notifications/send {"targetUserId":"u1","title":"Hi","message":"Hello"}
//! GET  /notifications/send?title=Hi&message=Hello&role=vendor
//! GET  /notifications/send?title=Hi&message=Hello
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Error, NotificationKind, NotificationRecord, NotificationTarget, NotificationValidationError,
    Role, SendNotificationRequest, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /notifications/send`.
///
/// Fields are optional at the serde level so missing values surface as
/// `invalid_request` errors naming the field.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendToUserBody {
    #[schema(example = "6f1c2a34-1d2e-4c7f-9a0b-5e6d7c8b9a01")]
    pub target_user_id: Option<String>,
    #[schema(example = "Order shipped")]
    pub title: Option<String>,
    #[schema(example = "Your order is on its way")]
    pub message: Option<String>,
    /// Defaults to `system`.
    #[serde(rename = "type")]
    #[schema(example = "order")]
    pub kind: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

/// Query string for `GET /notifications/send`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FanoutQuery {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub role: Option<String>,
}

/// A stored notification as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBody {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRecord> for NotificationBody {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id.into(),
            title: record.title,
            message: record.message,
            kind: record.kind.into(),
            metadata: record.metadata,
            read: record.read,
            created_at: record.created_at,
        }
    }
}

/// Response body for role-filtered and broadcast fan-outs.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FanoutResponseBody {
    pub notifications: Vec<NotificationBody>,
    pub count: usize,
}

fn missing_field(field: &str) -> Error {
    Error::invalid_request(format!("{field} is required")).with_details(json!({ "field": field }))
}

fn map_kind_error(err: NotificationValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": err.field() }))
}

fn parse_kind(raw: Option<String>) -> Result<NotificationKind, Error> {
    raw.map_or_else(|| Ok(NotificationKind::default()), |kind| {
        NotificationKind::new(kind).map_err(map_kind_error)
    })
}

fn parse_target_user(raw: Option<String>) -> Result<UserId, Error> {
    let raw = raw.ok_or_else(|| missing_field("targetUserId"))?;
    UserId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "targetUserId" }))
    })
}

/// Blank role names are rejected; unknown names match no users.
fn parse_role_target(raw: Option<String>) -> Result<NotificationTarget, Error> {
    let Some(raw) = raw else {
        return Ok(NotificationTarget::Broadcast);
    };
    if raw.trim().is_empty() {
        return Err(Error::invalid_request("role must not be empty")
            .with_details(json!({ "field": "role" })));
    }
    raw.parse::<Role>()
        .map(NotificationTarget::RoleFilter)
        .map_err(|_| Error::not_found(format!("no users found with role {raw}")))
}

/// Send a notification to one user.
#[utoipa::path(
    post,
    path = "/notifications/send",
    request_body = SendToUserBody,
    responses(
        (status = 200, description = "Notification recorded", body = NotificationBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 500, description = "Identity store or persistence failure", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "sendToUser"
)]
#[post("/notifications/send")]
pub async fn send_to_user(
    state: web::Data<HttpState>,
    payload: web::Json<SendToUserBody>,
) -> ApiResult<HttpResponse> {
    let SendToUserBody {
        target_user_id,
        title,
        message,
        kind,
        metadata,
    } = payload.into_inner();
    let title = title.ok_or_else(|| missing_field("title"))?;
    let message = message.ok_or_else(|| missing_field("message"))?;
    let target = NotificationTarget::SingleUser(parse_target_user(target_user_id)?);
    let request = SendNotificationRequest::new(target, title, message)
        .with_kind(parse_kind(kind)?)
        .with_metadata(metadata.unwrap_or_default());

    let result = state.notifications.send(request).await?;
    let record = result
        .created
        .into_iter()
        .next()
        .ok_or_else(|| Error::persistence("notification was not recorded"))?;
    Ok(HttpResponse::Ok().json(NotificationBody::from(record)))
}

/// Send a notification to every user with a role, or to everyone.
#[utoipa::path(
    get,
    path = "/notifications/send",
    params(
        ("title" = String, Query, description = "Notification title"),
        ("message" = String, Query, description = "Notification body"),
        ("type" = Option<String>, Query, description = "Notification type, default system"),
        ("role" = Option<String>, Query, description = "admin, vendor or customer; omit to broadcast")
    ),
    responses(
        (status = 200, description = "Notifications recorded", body = FanoutResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "No users match the role", body = ErrorSchema),
        (status = 500, description = "Identity store or persistence failure", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "fanOut"
)]
#[get("/notifications/send")]
pub async fn fan_out(
    state: web::Data<HttpState>,
    query: web::Query<FanoutQuery>,
) -> ApiResult<HttpResponse> {
    let FanoutQuery {
        title,
        message,
        kind,
        role,
    } = query.into_inner();
    let title = title.ok_or_else(|| missing_field("title"))?;
    let message = message.ok_or_else(|| missing_field("message"))?;
    let target = parse_role_target(role)?;
    let request = SendNotificationRequest::new(target, title, message).with_kind(parse_kind(kind)?);

    let result = state.notifications.send(request).await?;
    let body = FanoutResponseBody {
        count: result.count(),
        notifications: result.created.into_iter().map(NotificationBody::from).collect(),
    };
    Ok(HttpResponse::Ok().json(body))
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
