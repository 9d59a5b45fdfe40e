// Logout endpoint
use actix_web::{web, HttpResponse};
use log::info;

use crate::models::LogoutResponse;
use crate::session::SessionManager;
use crate::utils::responses::ResponseBuilder;

/// `POST /logout`
///
/// Clears the session cookie by setting an already-expired replacement.
/// Idempotent: logging out without a session is still a success and leaves
/// the caller unauthenticated.
pub async fn logout(session_manager: web::Data<SessionManager>) -> HttpResponse {
    let clear_cookie = session_manager.create_expired_cookie();
    info!("Session cookie cleared");
    ResponseBuilder::json_ok_with_cookie(&LogoutResponse { success: true }, clear_cookie)
}
