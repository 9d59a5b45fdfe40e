// Silent-auth responder page
//
// Loaded *inside* the hidden frame, on this application's own origin. It
// forwards the SSO server's query parameters to the parent context as a
// single postMessage and does nothing else.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::settings::PlumbrsSettings;
use crate::utils::responses::ResponseBuilder;

#[derive(Deserialize)]
pub struct SilentCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// `GET /silent-callback?code=...|error=...`
///
/// Success messages are targeted strictly at the application origin so the
/// code cannot leak to a parent on another origin. Failure messages carry
/// no secret and are broadcast with `*`, which lets misconfigured setups
/// still see their failure reason.
pub async fn silent_callback(
    query: web::Query<SilentCallbackQuery>,
    settings: web::Data<PlumbrsSettings>,
) -> HttpResponse {
    if let Some(error) = &query.error {
        return ResponseBuilder::html(failure_page(error));
    }

    if let Some(code) = &query.code {
        return ResponseBuilder::html(success_page(code, &settings.application.app_base_url));
    }

    ResponseBuilder::bad_request("Invalid callback")
}

fn success_page(code: &str, target_origin: &str) -> String {
    format!(
        r"<!DOCTYPE html>
<html>
<head><title>Silent Auth Callback</title></head>
<body>
<script>
  window.parent.postMessage({{
    type: 'SSO_AUTH_SUCCESS',
    code: {code}
  }}, {origin});
</script>
</body>
</html>
",
        code = js_string(code),
        origin = js_string(target_origin),
    )
}

fn failure_page(error: &str) -> String {
    format!(
        r"<!DOCTYPE html>
<html>
<head><title>Silent Auth Callback</title></head>
<body>
<script>
  window.parent.postMessage({{
    type: 'SSO_AUTH_FAILED',
    error: {error}
  }}, '*');
</script>
</body>
</html>
",
        error = js_string(error),
    )
}

/// Embed a query value as a JavaScript string literal. JSON encoding
/// handles quotes and backslashes; `<` is escaped on top of that so a
/// crafted value cannot close the surrounding script element.
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
}
