use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// The authenticated identity returned by token exchange.
///
/// Immutable once received; held by the application for the life of the
/// page. SSO servers are inconsistent about whether `id` is a JSON number
/// or string, so deserialization accepts both and normalizes to a string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(deserialize_with = "deserialize_user_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UserId {
        Num(i64),
        Str(String),
    }

    Ok(match UserId::deserialize(deserializer)? {
        UserId::Num(n) => n.to_string(),
        UserId::Str(s) => s,
    })
}

/// Decrypted content of the `session` cookie.
///
/// The cookie value itself is opaque to the browser; only the server proxy
/// can read it back. Expiry is checked server-side as well as through the
/// cookie max-age, so a replayed stale value still reads as unauthenticated.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SessionRecord {
    pub profile: UserProfile,
    pub authenticated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a record for a freshly authenticated profile, valid for
    /// `duration_hours` from now.
    #[must_use]
    pub fn new(profile: UserProfile, duration_hours: u64) -> Self {
        let now = Utc::now();
        let hours = i64::try_from(duration_hours).unwrap_or(24);
        Self {
            profile,
            authenticated_at: now,
            expires_at: now + chrono::Duration::hours(hours),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Response body of `GET /session-status`, also the client-side probe result.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl SessionStatus {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(profile: UserProfile) -> Self {
        Self {
            authenticated: true,
            profile: Some(profile),
        }
    }
}

/// Request body of `POST /auth/exchange`.
#[derive(Serialize, Deserialize, Debug)]
pub struct ExchangeRequest {
    pub code: String,
}

/// Success body of `POST /auth/exchange`.
#[derive(Serialize, Deserialize, Debug)]
pub struct ExchangeResponse {
    pub profile: UserProfile,
}

/// Body of `POST /logout`. Logout is idempotent; this is always `true`.
#[derive(Serialize, Deserialize, Debug)]
pub struct LogoutResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_numeric_id() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id":1,"name":"A","email":"a@x"}"#).unwrap();
        assert_eq!(profile.id, "1");
        assert_eq!(profile.name, "A");
        assert_eq!(profile.email, "a@x");
    }

    #[test]
    fn test_profile_accepts_string_id() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id":"user-42","name":"B","email":"b@x"}"#).unwrap();
        assert_eq!(profile.id, "user-42");
    }

    #[test]
    fn test_session_record_expiry_bound() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id":1,"name":"A","email":"a@x"}"#).unwrap();

        let record = SessionRecord::new(profile.clone(), 24);
        assert!(!record.is_expired());
        let lifetime = record.expires_at - record.authenticated_at;
        assert_eq!(lifetime, chrono::Duration::hours(24));

        // A record past its bound reads as expired
        let stale = SessionRecord {
            profile,
            authenticated_at: Utc::now() - chrono::Duration::hours(25),
            expires_at: Utc::now() - chrono::Duration::hours(1),
        };
        assert!(stale.is_expired());
    }

    #[test]
    fn test_session_status_serialization_omits_missing_profile() {
        let status = SessionStatus::unauthenticated();
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"authenticated":false}"#);
    }
}
