// Static app shell and health endpoint
use actix_web::{web, HttpResponse};

use crate::models::HealthResponse;
use crate::settings::PlumbrsSettings;
use crate::utils::responses::ResponseBuilder;

/// The app shell template, embedded at compile time.
const SHELL_TEMPLATE: &str = include_str!("../static/shell.html");

/// `GET /`
///
/// Serves the application shell. The redirect return leg lands here with
/// `code` and `state` in the query; the shell itself is inert and the
/// orchestrator picks those up from the page address.
pub async fn app_shell(settings: web::Data<PlumbrsSettings>) -> HttpResponse {
    ResponseBuilder::html(render_shell(&settings))
}

/// `GET /ping`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: "plumbrs session proxy is running".to_string(),
    })
}

fn render_shell(settings: &PlumbrsSettings) -> String {
    SHELL_TEMPLATE.replace("{{CLIENT_ID}}", &settings.sso.client_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_substitutes_client_id() {
        let settings = PlumbrsSettings::default();
        let page = render_shell(&settings);
        assert!(page.contains(r#"data-client-id="clientA""#));
        assert!(!page.contains("{{CLIENT_ID}}"));
    }
}
