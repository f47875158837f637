//! Staff sign-out.
//!
//! The browser client holds the access token in cookies; signing out revokes
//! the session with the identity store where possible and always clears the
//! cookies locally.

use actix_web::http::header::{CACHE_CONTROL, LOCATION};
use actix_web::{HttpResponse, post, web};

use crate::domain::RedirectTarget;
use crate::inbound::http::session::{RequestCredentials, clear_credential_cookies};
use crate::inbound::http::state::HttpState;

/// End the current session and redirect to the login page.
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 303, description = "Session ended; credential cookies cleared")
    ),
    tags = ["auth"],
    operation_id = "signOut",
    security([])
)]
#[post("/auth/sign-out")]
pub async fn sign_out(
    state: web::Data<HttpState>,
    credentials: RequestCredentials,
) -> HttpResponse {
    state.sessions.sign_out(&credentials.0).await;

    let mut response = HttpResponse::SeeOther();
    response
        .insert_header((LOCATION, RedirectTarget::Login.path()))
        .insert_header((CACHE_CONTROL, "no-store"));
    clear_credential_cookies(&mut response);
    response.finish()
}
