use actix_web::cookie::Cookie;
use anyhow::Result;

use crate::models::SessionRecord;
use crate::utils::crypto::encrypt_data;

/// Name of the single session cookie this application sets.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: actix_web::cookie::SameSite,
    pub path: String,
    pub max_age: actix_web::cookie::time::Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: actix_web::cookie::SameSite::Lax,
            path: "/".to_string(),
            max_age: actix_web::cookie::time::Duration::hours(24),
        }
    }
}

/// Cookie factory for creating encrypted session cookies
///
/// Centralizes cookie creation so every session cookie carries the same
/// attributes: HTTP-only, `SameSite=Lax`, secure per configuration, and a
/// max-age matching the configured session duration.
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; 32],
    cookie_secure: bool,
    session_duration_hours: u64,
}

impl CookieFactory {
    /// Create a new cookie factory with the specified configuration
    #[must_use]
    pub fn new(encryption_key: [u8; 32], cookie_secure: bool, session_duration_hours: u64) -> Self {
        Self {
            encryption_key,
            cookie_secure,
            session_duration_hours,
        }
    }

    /// Create an encrypted session cookie from a `SessionRecord`
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_session_cookie(&self, record: &SessionRecord) -> Result<Cookie<'static>> {
        let options = CookieOptions {
            max_age: actix_web::cookie::time::Duration::hours(
                i64::try_from(self.session_duration_hours).unwrap_or(24),
            ),
            ..Default::default()
        };
        let value = encrypt_data(record, &self.encryption_key)?;

        Ok(Cookie::build(SESSION_COOKIE_NAME, value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish())
    }

    /// Create an expired cookie to clear the session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        create_expired_cookie(SESSION_COOKIE_NAME, self.cookie_secure)
    }
}

/// Create an expired cookie to clear a specific cookie
#[must_use]
pub fn create_expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "")
        .http_only(true)
        .secure(secure)
        .same_site(actix_web::cookie::SameSite::Lax)
        .path("/")
        .max_age(actix_web::cookie::time::Duration::seconds(-1))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionRecord, UserProfile};
    use crate::utils::crypto::derive_encryption_key;

    fn test_record() -> SessionRecord {
        SessionRecord::new(
            UserProfile {
                id: "1".to_string(),
                name: "Test User".to_string(),
                email: "test@example.com".to_string(),
            },
            24,
        )
    }

    #[test]
    fn test_create_expired_cookie() {
        let cookie = create_expired_cookie("test_cookie", true);
        assert_eq!(cookie.name(), "test_cookie");
        assert_eq!(cookie.value(), "");
        assert!(cookie.http_only().unwrap());
        assert!(cookie.secure().unwrap());
        assert_eq!(cookie.path().unwrap(), "/");
        assert!(cookie.max_age().unwrap().whole_seconds() < 0);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let factory = CookieFactory::new(
            derive_encryption_key(b"test_key_32_bytes_long_for_test_"),
            false,
            24,
        );

        let cookie = factory.create_session_cookie(&test_record()).unwrap();
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert!(!cookie.value().is_empty());
        assert!(cookie.http_only().unwrap());
        assert_eq!(
            cookie.same_site().unwrap(),
            actix_web::cookie::SameSite::Lax
        );
        assert_eq!(
            cookie.max_age().unwrap(),
            actix_web::cookie::time::Duration::hours(24)
        );
        // secure flag follows configuration
        assert!(!cookie.secure().unwrap_or(false));
    }

    #[test]
    fn test_session_cookie_value_is_opaque() {
        let factory = CookieFactory::new(
            derive_encryption_key(b"test_key_32_bytes_long_for_test_"),
            true,
            24,
        );
        let cookie = factory.create_session_cookie(&test_record()).unwrap();
        assert!(!cookie.value().contains("test@example.com"));
        assert!(!cookie.value().contains("Test User"));
    }
}
