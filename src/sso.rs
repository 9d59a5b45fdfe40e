// Server-side client for the external SSO server's token endpoint.
// The exchange runs here, behind the proxy, so client credentials and the
// raw token response never reach the browser.

use log::{debug, error, info};
use serde::Deserialize;
use thiserror::Error;

use crate::models::UserProfile;
use crate::settings::PlumbrsSettings;

#[derive(Debug, Error)]
pub enum SsoError {
    /// The token endpoint answered with a non-success status: the code was
    /// invalid, expired, or already used.
    #[error("token exchange rejected: {0}")]
    Rejected(String),
    /// The token endpoint could not be reached.
    #[error("token endpoint unreachable: {0}")]
    Network(String),
    /// The token endpoint answered 2xx but the body did not contain a
    /// usable profile.
    #[error("malformed token response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    user: UserProfile,
}

/// Client for the SSO server's token endpoint
#[derive(Clone)]
pub struct SsoClient {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    redirect_uri: String,
}

impl SsoClient {
    #[must_use]
    pub fn new(token_url: String, client_id: String, redirect_uri: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            token_url,
            client_id,
            redirect_uri,
        }
    }

    /// Build a client from loaded settings. The redirect URI sent along
    /// with the exchange is the application root, the same address the
    /// interactive login flow returns to.
    #[must_use]
    pub fn from_settings(settings: &PlumbrsSettings) -> Self {
        Self::new(
            settings.sso.token_url(),
            settings.sso.client_id.clone(),
            format!("{}/", settings.application.app_base_url),
        )
    }

    /// Exchange an authorization code for the authenticated user's profile
    ///
    /// # Errors
    ///
    /// Returns [`SsoError::Network`] if the token endpoint is unreachable,
    /// [`SsoError::Rejected`] on a non-success status, and
    /// [`SsoError::Malformed`] when a success response has no usable body.
    pub async fn exchange_code(&self, code: &str) -> Result<UserProfile, SsoError> {
        debug!("Exchanging authorization code with {}", self.token_url);

        let response = self
            .http_client
            .post(&self.token_url)
            .json(&serde_json::json!({
                "code": code,
                "client_id": self.client_id,
                "redirect_uri": self.redirect_uri,
            }))
            .send()
            .await
            .map_err(|e| SsoError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Token exchange failed with status {status}: {error_text}");
            return Err(SsoError::Rejected(format!("status {status}")));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| SsoError::Malformed(e.to_string()))?;

        info!(
            "Token exchange succeeded for user {}",
            token_response.user.email
        );
        Ok(token_response.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PlumbrsSettings;

    #[test]
    fn test_client_from_settings_uses_app_root_redirect() {
        let mut settings = PlumbrsSettings::default();
        settings.application.app_base_url = "https://app.example.com".to_string();
        settings.sso.server_url = "https://sso.example.com".to_string();

        let client = SsoClient::from_settings(&settings);
        assert_eq!(client.token_url, "https://sso.example.com/api/sso/token");
        assert_eq!(client.redirect_uri, "https://app.example.com/");
        assert_eq!(client.client_id, "clientA");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_network_error() {
        // Nothing listens on this port; the connection is refused fast.
        let client = SsoClient::new(
            "http://127.0.0.1:1/token".to_string(),
            "clientA".to_string(),
            "http://localhost/".to_string(),
        );

        match client.exchange_code("abc").await {
            Err(SsoError::Network(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
