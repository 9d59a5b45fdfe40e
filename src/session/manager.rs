//! Session Manager - Stateless Encrypted Session Handling
//!
//! The `SessionManager` is the single source of truth for session creation
//! and inspection on the proxy side. It owns the derived encryption key and
//! delegates cookie construction to the [`CookieFactory`].
//!
//! A session is exactly one encrypted cookie. Reading it back can fail in
//! several ways (missing cookie, undecryptable value, expired record); all
//! of them collapse to "no session" for the caller, because the probe
//! endpoint must be indistinguishable between "never logged in" and
//! "expired".

use actix_web::{cookie::Cookie, HttpRequest};
use anyhow::Result;
use log::debug;

use crate::models::{SessionRecord, UserProfile};
use crate::session::cookie::{CookieFactory, SESSION_COOKIE_NAME};
use crate::settings::PlumbrsSettings;
use crate::utils::crypto::{decrypt_data, derive_encryption_key};

/// Session Manager for stateless encrypted session handling
#[derive(Clone)]
pub struct SessionManager {
    encryption_key: [u8; 32],
    cookie_secure: bool,
    session_duration_hours: u64,
    cookie_factory: CookieFactory,
}

impl SessionManager {
    /// Create a new session manager
    #[must_use]
    pub fn new(key: &[u8], cookie_secure: bool, session_duration_hours: u64) -> Self {
        let encryption_key = derive_encryption_key(key);
        let cookie_factory =
            CookieFactory::new(encryption_key, cookie_secure, session_duration_hours);

        Self {
            encryption_key,
            cookie_secure,
            session_duration_hours,
            cookie_factory,
        }
    }

    /// Create a session manager from loaded settings
    #[must_use]
    pub fn from_settings(settings: &PlumbrsSettings) -> Self {
        Self::new(
            settings.session.session_secret.as_bytes(),
            settings.cookies.secure,
            settings.session.session_duration_hours,
        )
    }

    /// Extract the session record from the request's `session` cookie
    ///
    /// Returns `None` for a missing cookie, an undecryptable value, or an
    /// expired record. Decryption failures are logged at debug level only;
    /// they are routine after a secret rotation or cookie tampering and
    /// must read the same as "no session".
    #[must_use]
    pub fn get_session_from_request(&self, req: &HttpRequest) -> Option<SessionRecord> {
        let cookie = req.cookie(SESSION_COOKIE_NAME)?;

        let record = match decrypt_data::<SessionRecord>(cookie.value(), &self.encryption_key) {
            Ok(record) => record,
            Err(e) => {
                debug!("Failed to decrypt session cookie: {e}");
                return None;
            }
        };

        if record.is_expired() {
            debug!("Session expired at {}", record.expires_at);
            return None;
        }

        Some(record)
    }

    /// Materialize a session for a freshly exchanged profile
    ///
    /// # Errors
    ///
    /// Returns an error if cookie encryption fails
    pub fn create_session_cookie(&self, profile: UserProfile) -> Result<Cookie<'static>> {
        let record = SessionRecord::new(profile, self.session_duration_hours);
        self.cookie_factory.create_session_cookie(&record)
    }

    /// Create an encrypted cookie for an existing record (tests use this to
    /// build sessions with non-default timestamps)
    ///
    /// # Errors
    ///
    /// Returns an error if cookie encryption fails
    pub fn create_cookie_for_record(&self, record: &SessionRecord) -> Result<Cookie<'static>> {
        self.cookie_factory.create_session_cookie(record)
    }

    /// Create an expired cookie to clear the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        self.cookie_factory.create_expired_cookie()
    }

    /// Whether cookies are created with the secure flag
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Utc;

    fn manager() -> SessionManager {
        SessionManager::new(b"test_key_32_bytes_long_for_test_", false, 24)
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: "1".to_string(),
            name: "A".to_string(),
            email: "a@x".to_string(),
        }
    }

    #[test]
    fn test_session_round_trip() {
        let manager = manager();
        let cookie = manager.create_session_cookie(profile()).unwrap();

        let req = TestRequest::default()
            .cookie(cookie)
            .to_http_request();

        let record = manager.get_session_from_request(&req).unwrap();
        assert_eq!(record.profile, profile());
        assert!(!record.is_expired());
    }

    #[test]
    fn test_missing_cookie_reads_as_no_session() {
        let manager = manager();
        let req = TestRequest::default().to_http_request();
        assert!(manager.get_session_from_request(&req).is_none());
    }

    #[test]
    fn test_tampered_cookie_reads_as_no_session() {
        let manager = manager();
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE_NAME, "garbage-value"))
            .to_http_request();
        assert!(manager.get_session_from_request(&req).is_none());
    }

    #[test]
    fn test_expired_record_reads_as_no_session() {
        let manager = manager();
        let record = SessionRecord {
            profile: profile(),
            authenticated_at: Utc::now() - chrono::Duration::hours(25),
            expires_at: Utc::now() - chrono::Duration::hours(1),
        };
        let cookie = manager.create_cookie_for_record(&record).unwrap();

        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert!(manager.get_session_from_request(&req).is_none());
    }

    #[test]
    fn test_cookie_from_other_secret_reads_as_no_session() {
        let manager_a = manager();
        let manager_b = SessionManager::new(b"another-secret-entirely", false, 24);

        let cookie = manager_a.create_session_cookie(profile()).unwrap();
        let req = TestRequest::default().cookie(cookie).to_http_request();

        assert!(manager_b.get_session_from_request(&req).is_none());
    }
}
