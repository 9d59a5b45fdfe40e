//! Token exchange client
//!
//! Hands an authorization code to the same-origin proxy, which performs
//! the real exchange against the SSO server. Taking the code by value is
//! deliberate: a code can enter at most one exchange call.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ExchangeResponse, UserProfile};

/// A single-use, short-lived authorization code issued by the SSO server.
///
/// The inner string is only surrendered to an exchange implementation;
/// everything else sees the code move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Consume the code, yielding the raw value for the wire.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The exchange endpoint rejected the code (non-2xx response). The code
    /// is spent either way; there is nothing to retry.
    #[error("token exchange failed")]
    TokenExchangeFailed,
    /// Transport failure or a success response without a usable profile.
    #[error("server error during token exchange: {0}")]
    ServerError(String),
}

/// Exchange an authorization code for the authenticated profile.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// # Errors
    ///
    /// [`ExchangeError::TokenExchangeFailed`] on a non-success response,
    /// [`ExchangeError::ServerError`] on transport failure or a malformed
    /// success body. Both are fatal for the current attempt.
    async fn exchange(&self, code: AuthorizationCode) -> Result<UserProfile, ExchangeError>;
}

/// HTTP implementation against the proxy's `/auth/exchange`.
pub struct HttpTokenExchange {
    http_client: reqwest::Client,
    exchange_url: String,
}

impl HttpTokenExchange {
    #[must_use]
    pub fn new(app_base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            exchange_url: format!("{app_base_url}/auth/exchange"),
        }
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(&self, code: AuthorizationCode) -> Result<UserProfile, ExchangeError> {
        let response = self
            .http_client
            .post(&self.exchange_url)
            .json(&serde_json::json!({ "code": code.into_inner() }))
            .send()
            .await
            .map_err(|e| ExchangeError::ServerError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExchangeError::TokenExchangeFailed);
        }

        let body: ExchangeResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::ServerError(e.to_string()))?;

        Ok(body.profile)
    }
}
