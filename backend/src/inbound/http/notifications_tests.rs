//! Tests for the notification fan-out handlers.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{MockNotificationCommand, MockSessionCommand};
use crate::domain::{ErrorCode, FanoutResult};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use rstest::rstest;

fn record(user: &str, kind: &str) -> NotificationRecord {
    NotificationRecord {
        id: Uuid::new_v4(),
        user_id: UserId::new(user).expect("valid id"),
        title: "Hi".to_owned(),
        message: "Hello".to_owned(),
        kind: NotificationKind::new(kind).expect("valid kind"),
        metadata: json!({ "audience": "user" }),
        read: false,
        created_at: DateTime::<Utc>::UNIX_EPOCH,
    }
}

fn state_with(command: MockNotificationCommand) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(
        Arc::new(command),
        Arc::new(MockSessionCommand::new()),
    ))
}

fn untouched() -> MockNotificationCommand {
    let mut command = MockNotificationCommand::new();
    command.expect_send().times(0);
    command
}

async fn call(
    command: MockNotificationCommand,
    request: actix_test::TestRequest,
) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(state_with(command))
            .service(send_to_user)
            .service(fan_out),
    )
    .await;
    let response = actix_test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[rstest]
#[actix_web::test]
async fn post_sends_to_the_target_user() {
    let mut command = MockNotificationCommand::new();
    command
        .expect_send()
        .withf(|request| {
            request.target
                == NotificationTarget::SingleUser(UserId::new("u1").expect("valid id"))
                && request.title == "Hi"
                && request.message == "Hello"
                && request.kind.as_ref() == "order"
                && request.metadata.get("orderId") == Some(&json!("o-9"))
        })
        .times(1)
        .return_once(|_| Ok(FanoutResult::from_created(1, vec![record("u1", "order")])));

    let (status, body) = call(
        command,
        actix_test::TestRequest::post()
            .uri("/notifications/send")
            .set_json(json!({
                "targetUserId": "u1",
                "title": "Hi",
                "message": "Hello",
                "type": "order",
                "metadata": { "orderId": "o-9" },
            })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["type"], "order");
    assert_eq!(body["read"], false);
}

#[rstest]
#[case(json!({ "title": "Hi", "message": "Hello" }), "targetUserId")]
#[case(json!({ "targetUserId": "u1", "message": "Hello" }), "title")]
#[case(json!({ "targetUserId": "u1", "title": "Hi" }), "message")]
#[case(json!({ "targetUserId": "u 1", "title": "Hi", "message": "Hello" }), "targetUserId")]
#[case(json!({ "targetUserId": "u1", "title": "Hi", "message": "Hello", "type": " " }), "type")]
#[actix_web::test]
async fn post_rejects_missing_fields(#[case] payload: Value, #[case] field: &str) {
    let (status, body) = call(
        untouched(),
        actix_test::TestRequest::post()
            .uri("/notifications/send")
            .set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[case(Error::invalid_request("message must not be empty"), StatusCode::BAD_REQUEST)]
#[case(Error::store_unavailable("identity store is unavailable"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::persistence("failed to record notifications"), StatusCode::INTERNAL_SERVER_ERROR)]
#[actix_web::test]
async fn post_maps_domain_failures(#[case] error: Error, #[case] expected: StatusCode) {
    let code = error.code();
    let mut command = MockNotificationCommand::new();
    command.expect_send().times(1).return_once(move |_| Err(error));

    let (status, body) = call(
        command,
        actix_test::TestRequest::post()
            .uri("/notifications/send")
            .set_json(json!({ "targetUserId": "u1", "title": "Hi", "message": "" })),
    )
    .await;

    assert_eq!(status, expected);
    assert_eq!(
        serde_json::from_value::<ErrorCode>(body["code"].clone()).expect("known code"),
        code
    );
}

#[rstest]
#[actix_web::test]
async fn post_without_acknowledged_record_is_persistence_error() {
    let mut command = MockNotificationCommand::new();
    command
        .expect_send()
        .times(1)
        .return_once(|_| Ok(FanoutResult::from_created(1, Vec::new())));

    let (status, body) = call(
        command,
        actix_test::TestRequest::post()
            .uri("/notifications/send")
            .set_json(json!({ "targetUserId": "u1", "title": "Hi", "message": "Hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "persistence_error");
}

#[rstest]
#[case("/notifications/send?title=Hi&message=Hello&role=vendor", NotificationTarget::RoleFilter(Role::Vendor))]
#[case("/notifications/send?title=Hi&message=Hello", NotificationTarget::Broadcast)]
#[actix_web::test]
async fn get_fans_out_by_role_or_broadcast(
    #[case] uri: &str,
    #[case] expected_target: NotificationTarget,
) {
    let mut command = MockNotificationCommand::new();
    command
        .expect_send()
        .withf(move |request| request.target == expected_target && request.kind.as_ref() == "system")
        .times(1)
        .return_once(|_| {
            Ok(FanoutResult::from_created(
                2,
                vec![record("v-1", "system"), record("v-2", "system")],
            ))
        });

    let (status, body) = call(command, actix_test::TestRequest::get().uri(uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["notifications"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[case("/notifications/send?message=Hello", "title")]
#[case("/notifications/send?title=Hi", "message")]
#[case("/notifications/send?title=Hi&message=Hello&role=", "role")]
#[actix_web::test]
async fn get_rejects_missing_fields(#[case] uri: &str, #[case] field: &str) {
    let (status, body) = call(untouched(), actix_test::TestRequest::get().uri(uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn get_with_unknown_role_is_not_found() {
    let (status, body) = call(
        untouched(),
        actix_test::TestRequest::get().uri("/notifications/send?title=Hi&message=Hello&role=staff"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "no users found with role staff");
}

#[rstest]
#[actix_web::test]
async fn get_with_empty_role_filter_is_not_found() {
    let mut command = MockNotificationCommand::new();
    command
        .expect_send()
        .times(1)
        .return_once(|_| Err(Error::not_found("no users found with role vendor")));

    let (status, body) = call(
        command,
        actix_test::TestRequest::get().uri("/notifications/send?title=Hi&message=Hello&role=vendor"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[actix_web::test]
async fn get_empty_broadcast_returns_zero_count() {
    let mut command = MockNotificationCommand::new();
    command
        .expect_send()
        .times(1)
        .return_once(|_| Ok(FanoutResult::empty()));

    let (status, body) = call(
        command,
        actix_test::TestRequest::get().uri("/notifications/send?title=Hi&message=Hello"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "notifications": [], "count": 0 }));
}
