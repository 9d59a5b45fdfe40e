//! Redirect-auth flow
//!
//! The visible fallback: navigate the whole page to the SSO server's
//! interactive login endpoint. The in-page lifecycle ends at the
//! navigation; the return leg is a fresh page load carrying `code` and
//! `state` in the query, handled by the orchestrator's `Init` state.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use url::Url;

use super::host::PageHost;
use crate::utils::crypto::generate_state_token;

/// One redirect-based login navigation
pub struct RedirectAuthFlow {
    host: Arc<dyn PageHost>,
    login_url: String,
    client_id: String,
    /// Callback address: the application's own root.
    redirect_uri: String,
    notice_delay: Duration,
}

impl RedirectAuthFlow {
    #[must_use]
    pub fn new(
        host: Arc<dyn PageHost>,
        login_url: String,
        client_id: String,
        redirect_uri: String,
        notice_delay: Duration,
    ) -> Self {
        Self {
            host,
            login_url,
            client_id,
            redirect_uri,
            notice_delay,
        }
    }

    /// Navigate to the interactive login endpoint after the notice delay.
    ///
    /// Generates a fresh anti-replay state token and persists it through
    /// the host so the return leg can validate it. Returns the token.
    pub async fn begin(&self) -> String {
        tokio::time::sleep(self.notice_delay).await;
        self.navigate_now()
    }

    /// Navigate immediately (manual login skips the fallback notice).
    pub fn navigate_now(&self) -> String {
        let state = generate_state_token();
        self.host.persist_login_state(&state);

        let target = build_login_url(&self.login_url, &self.client_id, &self.redirect_uri, &state);
        info!("Redirecting to interactive login at {}", self.login_url);
        self.host.navigate(&target);
        state
    }
}

/// Build the interactive login address.
///
/// Falls back to naive concatenation if the configured login URL does not
/// parse; the navigation will then fail visibly at the SSO server rather
/// than silently dropping the attempt.
fn build_login_url(login_url: &str, client_id: &str, redirect_uri: &str, state: &str) -> String {
    match Url::parse(login_url) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("state", state);
            url.to_string()
        }
        Err(_) => format!(
            "{login_url}?client_id={client_id}&redirect_uri={redirect_uri}&state={state}"
        ),
    }
}
