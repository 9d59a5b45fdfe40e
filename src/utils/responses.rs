//! HTTP response helpers
//!
//! Small, consistent JSON response constructors shared by the proxy
//! handlers. Error bodies always carry a single `error` field, matching
//! what the in-page orchestrator expects from the exchange endpoint.

use actix_web::{cookie::Cookie, HttpResponse};
use serde::Serialize;
use serde_json::json;

/// Unified response builder for the proxy handlers
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// 200 response with a JSON body
    pub fn json_ok<T: Serialize>(body: &T) -> HttpResponse {
        HttpResponse::Ok().json(body)
    }

    /// 200 response with a JSON body and a cookie attached
    pub fn json_ok_with_cookie<T: Serialize>(body: &T, cookie: Cookie<'_>) -> HttpResponse {
        HttpResponse::Ok().cookie(cookie).json(body)
    }

    /// 400 response with `{"error": message}`
    #[must_use]
    pub fn bad_request(message: &str) -> HttpResponse {
        HttpResponse::BadRequest().json(json!({ "error": message }))
    }

    /// 500 response with `{"error": message}`
    #[must_use]
    pub fn server_error(message: &str) -> HttpResponse {
        HttpResponse::InternalServerError().json(json!({ "error": message }))
    }

    /// 200 HTML response (responder page, app shell)
    #[must_use]
    pub fn html(body: String) -> HttpResponse {
        HttpResponse::Ok().content_type("text/html").body(body)
    }
}
