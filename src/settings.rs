use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlumbrsSettings {
    pub application: ApplicationSettings,
    pub sso: SsoSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public base URL of this application, used as the redirect target and
    /// as the trusted target origin for silent-auth result messages.
    pub app_base_url: String,
    pub cors_origins: String,
}

/// Configuration for the external SSO server this application delegates to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoSettings {
    /// Base URL of the SSO server (its origin is the only trusted sender
    /// of cross-context auth messages).
    pub server_url: String,
    pub client_id: String,
    pub silent_auth_path: String,
    pub login_path: String,
    pub token_path: String,
    /// How long the silent attempt waits for a result message before
    /// falling back to the redirect flow.
    pub silent_timeout_ms: u64,
    /// The hidden frame is detached this long after it was created,
    /// whatever the outcome of the attempt.
    pub frame_grace_ms: u64,
    /// User-visible pause before the fallback navigation, so the
    /// "falling back" notice gets a chance to render.
    pub redirect_notice_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub session_duration_hours: u64,
    pub session_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            app_base_url: "http://localhost:8080".to_string(),
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for SsoSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9000".to_string(),
            client_id: "clientA".to_string(),
            silent_auth_path: "/api/sso/silent-auth".to_string(),
            login_path: "/sso/login".to_string(),
            token_path: "/api/sso/token".to_string(),
            silent_timeout_ms: 3000,
            frame_grace_ms: 5000,
            redirect_notice_ms: 1500,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_duration_hours: 24,
            session_secret: String::new(), // Will be generated if empty
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true, // Default to secure cookies
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PlumbrsSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment initialization fails
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        // Initialize environment and logging
        Self::initialize_environment()?;

        // Load base settings from TOML or defaults
        let mut settings = Self::load_base_settings()?;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Initialize environment variables and logging
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `PLUMBRS_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        // If PLUMBRS_SECRETS_DIR is set and contains Settings.toml, override with those settings
        if let Ok(secrets_dir) = std::env::var("PLUMBRS_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                let secrets_settings: Self = basic_toml::from_str(&secrets_toml_content)?;

                println!("✓ Overriding settings from {}", secrets_path.display());

                settings = secrets_settings;
            } else {
                println!(
                    "ℹ PLUMBRS_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_sso_env_overrides(&mut settings.sso);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    /// Apply environment overrides for application settings
    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(app_base_url) = std::env::var("APP_BASE_URL") {
            app_settings.app_base_url = app_base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for SSO settings
    pub fn apply_sso_env_overrides(sso_settings: &mut SsoSettings) {
        if let Ok(server_url) = std::env::var("SSO_SERVER_URL") {
            sso_settings.server_url = server_url;
        }
        if let Ok(client_id) = std::env::var("SSO_CLIENT_ID") {
            sso_settings.client_id = client_id;
        }
        Self::apply_numeric_env_override(
            "SSO_SILENT_TIMEOUT_MS",
            &mut sso_settings.silent_timeout_ms,
        );
        Self::apply_numeric_env_override("SSO_FRAME_GRACE_MS", &mut sso_settings.frame_grace_ms);
        Self::apply_numeric_env_override(
            "SSO_REDIRECT_NOTICE_MS",
            &mut sso_settings.redirect_notice_ms,
        );
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        Self::apply_numeric_env_override(
            "SESSION_DURATION_HOURS",
            &mut session_settings.session_duration_hours,
        );

        // Handle session secret with special logic
        Self::handle_session_secret_override(session_settings);
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Helper function to handle session secret environment override and generation
    fn handle_session_secret_override(session_settings: &mut SessionSettings) {
        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        // Generate random session secret if no environment variable was set and current value is empty
        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            Self::warn_about_generated_secret(&session_settings.session_secret);
        }
    }

    /// Generate a cryptographically secure random session secret
    ///
    /// Uses the same secure random source as our crypto utilities
    /// Generates 32 bytes (256 bits) of entropy for AES-256 compatibility
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32]; // 256 bits for AES-256
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    /// Display warnings about using a generated session secret
    fn warn_about_generated_secret(secret: &str) {
        eprintln!("⚠️  WARNING: Using auto-generated session secret");
        eprintln!("📝 Generated secret: {secret}");
        eprintln!("🔒 For production use, set the SESSION_SECRET environment variable");
        eprintln!("   or configure session_secret in Settings.toml");
        eprintln!("💡 This secret will change on each restart unless explicitly configured");
    }

    /// Apply environment overrides for cookie settings
    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    /// Apply environment overrides for logging settings
    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }
}

impl SsoSettings {
    /// Absolute URL of the SSO server's token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}{}", self.server_url, self.token_path)
    }

    /// Absolute URL of the SSO server's silent-auth endpoint.
    #[must_use]
    pub fn silent_auth_url(&self) -> String {
        format!("{}{}", self.server_url, self.silent_auth_path)
    }

    /// Absolute URL of the SSO server's interactive login endpoint.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}{}", self.server_url, self.login_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        std::env::remove_var("SESSION_SECRET");
        std::env::remove_var("SESSION_DURATION_HOURS");
        std::env::remove_var("SSO_SERVER_URL");
        std::env::remove_var("SSO_CLIENT_ID");
        std::env::remove_var("SSO_SILENT_TIMEOUT_MS");
        std::env::remove_var("PLUMBRS_SECRETS_DIR");
    }

    #[test]
    fn test_session_secret_configuration() {
        // Default value should be empty and will be generated when processed
        let default_session_settings = SessionSettings::default();
        assert_eq!(default_session_settings.session_secret, "");
        assert_eq!(default_session_settings.session_duration_hours, 24);
    }

    #[test]
    fn test_sso_defaults() {
        let sso = SsoSettings::default();
        assert_eq!(sso.silent_timeout_ms, 3000);
        assert_eq!(sso.frame_grace_ms, 5000);
        assert_eq!(sso.redirect_notice_ms, 1500);
        assert_eq!(sso.token_url(), "http://localhost:9000/api/sso/token");
        assert_eq!(
            sso.silent_auth_url(),
            "http://localhost:9000/api/sso/silent-auth"
        );
        assert_eq!(sso.login_url(), "http://localhost:9000/sso/login");
    }

    #[test]
    #[serial]
    fn test_session_secret_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            session_duration_hours: 24,
            session_secret: "default-secret".to_string(),
        };

        std::env::set_var("SESSION_SECRET", "env-override-secret");

        PlumbrsSettings::apply_session_env_overrides(&mut session_settings);

        assert_eq!(session_settings.session_secret, "env-override-secret");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_duration_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            session_duration_hours: 24,
            session_secret: "test-secret".to_string(),
        };

        std::env::set_var("SESSION_DURATION_HOURS", "48");

        PlumbrsSettings::apply_session_env_overrides(&mut session_settings);

        assert_eq!(session_settings.session_duration_hours, 48);
        assert_eq!(session_settings.session_secret, "test-secret"); // Should remain unchanged

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_sso_env_overrides() {
        clean_env_vars();

        let mut sso_settings = SsoSettings::default();

        std::env::set_var("SSO_SERVER_URL", "https://sso.example.com");
        std::env::set_var("SSO_CLIENT_ID", "clientB");
        std::env::set_var("SSO_SILENT_TIMEOUT_MS", "1500");

        PlumbrsSettings::apply_sso_env_overrides(&mut sso_settings);

        assert_eq!(sso_settings.server_url, "https://sso.example.com");
        assert_eq!(sso_settings.client_id, "clientB");
        assert_eq!(sso_settings.silent_timeout_ms, 1500);
        assert_eq!(
            sso_settings.token_url(),
            "https://sso.example.com/api/sso/token"
        );

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_secret_auto_generation() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            session_duration_hours: 24,
            session_secret: String::new(), // Empty, should trigger auto-generation
        };

        PlumbrsSettings::apply_session_env_overrides(&mut session_settings);

        // Should have generated a non-empty secret
        assert!(!session_settings.session_secret.is_empty());
        assert!(session_settings.session_secret.len() > 40); // Base64 encoded 32 bytes should be ~44 chars

        // Generate another one to ensure they're different
        let mut session_settings2 = SessionSettings {
            session_duration_hours: 24,
            session_secret: String::new(),
        };
        PlumbrsSettings::apply_session_env_overrides(&mut session_settings2);

        assert_ne!(
            session_settings.session_secret,
            session_settings2.session_secret
        );

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_cookie_secure_env_override() {
        clean_env_vars();

        let mut cookie_settings = CookieSettings { secure: true };
        std::env::set_var("COOKIE_SECURE", "false");

        PlumbrsSettings::apply_cookie_env_overrides(&mut cookie_settings);
        assert!(!cookie_settings.secure);

        std::env::remove_var("COOKIE_SECURE");
    }
}
