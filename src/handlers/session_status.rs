// Session probe endpoint
use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;

use crate::models::SessionStatus;
use crate::session::SessionManager;
use crate::utils::responses::ResponseBuilder;

/// `GET /session-status`
///
/// Inspects the session cookie server-side and returns its decoded profile
/// if valid. Every failure mode (missing cookie, undecryptable value,
/// expired record) reads as `{"authenticated": false}` with a 200 status;
/// the probe must never distinguish "expired" from "never logged in".
pub async fn session_status(
    req: HttpRequest,
    session_manager: web::Data<SessionManager>,
) -> HttpResponse {
    match session_manager.get_session_from_request(&req) {
        Some(record) => {
            debug!("Session probe: valid session for {}", record.profile.email);
            ResponseBuilder::json_ok(&SessionStatus::authenticated(record.profile))
        }
        None => ResponseBuilder::json_ok(&SessionStatus::unauthenticated()),
    }
}
