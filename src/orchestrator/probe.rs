//! Session probe
//!
//! Asks the same-origin proxy whether a valid session cookie already
//! exists. The probe is never retried; a single failure routes the
//! orchestrator into the auth-attempt path, because every failure mode
//! must fail closed to "not authenticated".

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use crate::models::SessionStatus;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("status request failed: {0}")]
    Network(String),
    #[error("malformed status response: {0}")]
    Malformed(String),
}

/// Client view of the same-origin session endpoints.
///
/// `check_session` is the probe proper; `end_session` backs the logout
/// side transition. Both talk to the local proxy, never to the SSO server.
#[async_trait]
pub trait SessionProbe: Send + Sync {
    /// Ask the proxy whether a valid session cookie exists.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] on transport or parse failure. Callers must
    /// treat any error as "not authenticated" rather than surface it.
    async fn check_session(&self) -> Result<SessionStatus, ProbeError>;

    /// Clear the session cookie. Idempotent on the server side.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] on transport failure.
    async fn end_session(&self) -> Result<(), ProbeError>;
}

/// HTTP implementation against the proxy's `/session-status` and `/logout`.
pub struct HttpSessionProbe {
    http_client: reqwest::Client,
    status_url: String,
    logout_url: String,
}

impl HttpSessionProbe {
    #[must_use]
    pub fn new(app_base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            status_url: format!("{app_base_url}/session-status"),
            logout_url: format!("{app_base_url}/logout"),
        }
    }
}

#[async_trait]
impl SessionProbe for HttpSessionProbe {
    async fn check_session(&self) -> Result<SessionStatus, ProbeError> {
        debug!("Probing {} for an existing session", self.status_url);

        let response = self
            .http_client
            .get(&self.status_url)
            .send()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProbeError::Network(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .json::<SessionStatus>()
            .await
            .map_err(|e| ProbeError::Malformed(e.to_string()))
    }

    async fn end_session(&self) -> Result<(), ProbeError> {
        self.http_client
            .post(&self.logout_url)
            .send()
            .await
            .map_err(|e| ProbeError::Network(e.to_string()))?;
        Ok(())
    }
}
