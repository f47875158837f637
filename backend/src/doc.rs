//! OpenAPI documentation for the gateway's REST surface.
//!
//! Registers every HTTP handler plus the schema wrappers for domain types.
//! Served by Swagger UI in debug builds and printed by the `openapi-dump`
//! binary.

use crate::inbound::http::dashboard::PrincipalBody;
use crate::inbound::http::notifications::{FanoutResponseBody, NotificationBody, SendToUserBody};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema, RoleSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the identity store credential carriers as security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "AccessTokenCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "sb-access-token",
                "Access token cookie set by the identity store's browser client.",
            ))),
        );
        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Marketplace gateway API",
        description = "Staff dashboard access gate, sign-out and notification fan-out."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("AccessTokenCookie" = []), ("BearerToken" = [])),
    paths(
        crate::inbound::http::notifications::send_to_user,
        crate::inbound::http::notifications::fan_out,
        crate::inbound::http::dashboard::current_session,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RoleSchema,
        SendToUserBody,
        NotificationBody,
        FanoutResponseBody,
        PrincipalBody,
    )),
    tags(
        (name = "notifications", description = "Notification fan-out"),
        (name = "dashboard", description = "Routes behind the staff access gate"),
        (name = "auth", description = "Session management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
