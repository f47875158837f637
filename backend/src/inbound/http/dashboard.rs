//! Handlers mounted under the protected dashboard prefix.
//!
//! Every route here sits behind the access gate middleware, so handlers only
//! ever see admitted staff.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Principal;
use crate::inbound::http::schemas::{ErrorSchema, RoleSchema};
use crate::inbound::http::session::AuthenticatedStaff;

/// The admitted staff member.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalBody {
    #[schema(example = "6f1c2a34-1d2e-4c7f-9a0b-5e6d7c8b9a01")]
    pub user_id: String,
    #[schema(example = "ops@example.com")]
    pub email: Option<String>,
    #[schema(value_type = RoleSchema)]
    pub role: String,
}

impl From<Principal> for PrincipalBody {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.user_id().to_string(),
            email: principal.email().map(str::to_owned),
            role: principal.role().as_str().to_owned(),
        }
    }
}

/// Return the staff member admitted for this request.
#[utoipa::path(
    get,
    path = "/dashboard/session",
    description = "Served under the protected prefix, `/dashboard` unless \
        `GATEWAY_PROTECTED_PREFIX` names another; the path shown assumes the default.",
    responses(
        (status = 200, description = "Admitted staff member", body = PrincipalBody),
        (status = 307, description = "Redirected by the access gate"),
        (status = 401, description = "Route not covered by the access gate", body = ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(staff: AuthenticatedStaff) -> web::Json<PrincipalBody> {
    web::Json(PrincipalBody::from(staff.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, UserId};
    use actix_web::dev::Service;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpMessage, test};
    use serde_json::{Value, json};

    fn principal() -> Principal {
        Principal::new(
            UserId::new("admin-1").expect("valid id"),
            Some("ops@example.com".to_owned()),
            Role::Admin,
        )
    }

    #[actix_web::test]
    async fn returns_the_admitted_principal() {
        let app = test::init_service(
            App::new()
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(principal());
                    srv.call(req)
                })
                .service(web::scope("/dashboard").service(current_session)),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/dashboard/session").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(
            body,
            json!({ "userId": "admin-1", "email": "ops@example.com", "role": "admin" })
        );
    }

    #[actix_web::test]
    async fn ungated_route_is_unauthorised() {
        let app =
            test::init_service(App::new().service(web::scope("/dashboard").service(current_session)))
                .await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/dashboard/session").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "unauthorized");
    }
}
