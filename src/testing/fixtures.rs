//! Test fixtures providing pre-built test objects

use crate::models::UserProfile;
use crate::orchestrator::OrchestratorConfig;
use crate::session::SessionManager;
use crate::settings::PlumbrsSettings;

use super::constants::{TEST_EMAIL, TEST_SESSION_SECRET, TEST_USER_ID, TEST_USER_NAME};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// The profile the fake SSO server vends in tests
    #[must_use]
    pub fn profile() -> UserProfile {
        UserProfile {
            id: TEST_USER_ID.to_string(),
            name: TEST_USER_NAME.to_string(),
            email: TEST_EMAIL.to_string(),
        }
    }

    /// Standard test settings: local addresses, insecure cookies, default
    /// SSO timings
    #[must_use]
    pub fn settings() -> PlumbrsSettings {
        let mut settings = PlumbrsSettings::default();
        settings.application.app_base_url = "http://localhost:8080".to_string();
        settings.session.session_secret =
            String::from_utf8_lossy(TEST_SESSION_SECRET).into_owned();
        settings.cookies.secure = false;
        settings
    }

    /// Orchestrator config derived from the standard test settings
    ///
    /// # Panics
    ///
    /// Panics if the fixture settings stop being parseable, which is a test
    /// bug rather than a runtime condition.
    #[must_use]
    pub fn orchestrator_config() -> OrchestratorConfig {
        OrchestratorConfig::from_settings(&Self::settings())
            .expect("fixture settings must produce a valid config")
    }

    /// Session manager with default test configuration
    #[must_use]
    pub fn session_manager() -> SessionManager {
        SessionManager::from_settings(&Self::settings())
    }
}
