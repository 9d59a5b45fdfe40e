#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use plumbrs::{
    handlers::{app_shell, auth_exchange, health, logout, session_status, silent_callback},
    session::SessionManager,
    settings::PlumbrsSettings,
    sso::SsoClient,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = PlumbrsSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    start_server(settings).await
}

/// Start the session proxy
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: PlumbrsSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let session_manager = SessionManager::from_settings(&settings);
    let sso_client = SsoClient::from_settings(&settings);

    // Configure CORS for the application shell
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::new(session_manager.clone()))
            .app_data(web::Data::new(sso_client.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Application shell (also the redirect return target)
        .route("/", web::get().to(app_shell))
        // Session endpoints
        .route("/session-status", web::get().to(session_status))
        .route("/auth/exchange", web::post().to(auth_exchange))
        .route("/logout", web::post().to(logout))
        // Silent-auth responder page, loaded inside the hidden frame
        .route("/silent-callback", web::get().to(silent_callback))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &PlumbrsSettings) {
    println!("Starting plumbrs session proxy on http://{bind_address}");
    println!();
    println!("Session endpoints:");
    println!("  GET  /session-status  - Session probe");
    println!("  POST /auth/exchange   - Authorization code exchange");
    println!("  POST /logout          - Clear session");
    println!("  GET  /silent-callback - Silent-auth responder page");
    println!();
    println!("SSO server: {}", settings.sso.server_url);
    println!(
        "Silent-auth callback URL: {}/silent-callback",
        settings.application.app_base_url
    );
    println!(
        "Interactive login callback URL: {}/",
        settings.application.app_base_url
    );
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
