// Token exchange endpoint: proxies the code to the SSO server and
// materializes the session on success.
use actix_web::{web, HttpResponse};
use log::error;

use crate::models::{ExchangeRequest, ExchangeResponse};
use crate::session::SessionManager;
use crate::sso::{SsoClient, SsoError};
use crate::utils::responses::ResponseBuilder;

/// `POST /auth/exchange`
///
/// Exchanges the authorization code at the SSO server's token endpoint
/// (server-side, so client credentials never reach the browser) and sets
/// the session cookie as a side effect of a successful exchange.
///
/// A rejected code is a 400 with no partial state; any transport or parse
/// failure is a 500. Neither leaves a cookie behind.
pub async fn auth_exchange(
    body: web::Json<ExchangeRequest>,
    sso_client: web::Data<SsoClient>,
    session_manager: web::Data<SessionManager>,
) -> HttpResponse {
    let profile = match sso_client.exchange_code(&body.code).await {
        Ok(profile) => profile,
        Err(SsoError::Rejected(e)) => {
            error!("SSO server rejected the authorization code: {e}");
            return ResponseBuilder::bad_request("Token exchange failed");
        }
        Err(e) => {
            error!("Token exchange failed upstream: {e}");
            return ResponseBuilder::server_error("Server error");
        }
    };

    // Session Materializer: the cookie is the sole persisted artifact of
    // this login.
    match session_manager.create_session_cookie(profile.clone()) {
        Ok(cookie) => ResponseBuilder::json_ok_with_cookie(&ExchangeResponse { profile }, cookie),
        Err(e) => {
            error!("Failed to materialize session cookie: {e}");
            ResponseBuilder::server_error("Server error")
        }
    }
}
