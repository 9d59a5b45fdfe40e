//! Hybrid authentication orchestrator
//!
//! The in-page state machine that sequences session probe, silent
//! re-authentication, redirect fallback, and token exchange:
//!
//! ```text
//! Init → Probing → (Authenticated | SilentAttempt)
//!                         → [RedirectAttempt] → Exchanging → (Authenticated | Failed)
//! ```
//!
//! One attempt at a time, one exchange per code. All environment effects
//! go through the [`host::PageHost`] and [`channel::MessageBus`] traits so
//! the machine runs identically under a native shell and the test harness.

pub mod channel;
pub mod exchange;
pub mod host;
pub mod probe;
pub mod redirect;

pub use channel::{AuthMessage, MessageBus, MessageEnvelope, SilentAuthChannel, SilentOutcome};
pub use exchange::{AuthorizationCode, ExchangeError, HttpTokenExchange, TokenExchange};
pub use host::{FrameId, PageHost};
pub use probe::{HttpSessionProbe, ProbeError, SessionProbe};
pub use redirect::RedirectAuthFlow;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use thiserror::Error;
use url::Url;

use crate::models::UserProfile;
use crate::settings::PlumbrsSettings;
use channel::build_silent_auth_url;
use host::query_param;

/// States of the authentication lifecycle for one page instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Init,
    Probing,
    SilentAttempt,
    RedirectAttempt,
    Exchanging,
    Authenticated,
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Probing => "probing",
            Self::SilentAttempt => "silent-attempt",
            Self::RedirectAttempt => "redirect-attempt",
            Self::Exchanging => "exchanging",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl AuthState {
    /// Legal edges of the state machine. Everything else is a programming
    /// error surfaced as [`AuthError::IllegalTransition`].
    #[must_use]
    pub fn can_transition(self, next: Self) -> bool {
        use AuthState::{
            Authenticated, Exchanging, Failed, Init, Probing, RedirectAttempt, SilentAttempt,
        };
        matches!(
            (self, next),
            (Init, Probing)
                | (Init, Exchanging)       // redirect return leg
                | (Init, RedirectAttempt)  // manual login
                | (Init, Failed)           // state-token mismatch on return
                | (Probing, Authenticated)
                | (Probing, SilentAttempt)
                | (SilentAttempt, Exchanging)
                | (SilentAttempt, RedirectAttempt)
                | (Exchanging, Authenticated)
                | (Exchanging, Failed)
                | (Failed, RedirectAttempt) // manual retry
        )
    }
}

/// Which strategy produced (or is producing) the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Silent,
    Redirect,
}

impl AuthMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Redirect => "redirect",
        }
    }
}

/// The one live authentication attempt.
///
/// Owned by the orchestrator; its presence is what blocks a second
/// concurrent attempt, and its flag is what blocks a second exchange.
#[derive(Debug)]
struct AuthAttempt {
    method: AuthMethod,
    exchange_started: bool,
}

impl AuthAttempt {
    fn new(method: AuthMethod) -> Self {
        Self {
            method,
            exchange_started: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// An attempt is already pending; rapid re-invocation is rejected, not
    /// queued.
    #[error("an authentication attempt is already in progress")]
    AttemptInProgress,
    /// A second exchange was requested for the current attempt.
    #[error("token exchange already started for this attempt")]
    ExchangeInFlight,
    /// An exchange was requested with no live attempt to account for it.
    #[error("no active authentication attempt")]
    NoActiveAttempt,
    #[error("illegal state transition: {from} → {to}")]
    IllegalTransition { from: AuthState, to: AuthState },
}

/// Static wiring of the orchestrator, derived from settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub client_id: String,
    /// The only origin whose cross-context messages are trusted.
    pub trusted_origin: String,
    /// Fully parameterized silent-auth endpoint address.
    pub silent_auth_url: String,
    /// Interactive login endpoint, parameterized per attempt.
    pub login_url: String,
    /// The application root: redirect callback target and scrub address.
    pub app_root_url: String,
    pub silent_timeout: Duration,
    pub frame_grace: Duration,
    pub notice_delay: Duration,
}

impl OrchestratorConfig {
    /// Build the config from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured SSO server URL is not a valid
    /// absolute URL (the trusted origin cannot be derived from it).
    pub fn from_settings(settings: &PlumbrsSettings) -> Result<Self, url::ParseError> {
        let sso_url = Url::parse(&settings.sso.server_url)?;
        let trusted_origin = sso_url.origin().ascii_serialization();

        let app = &settings.application.app_base_url;
        let silent_auth_url = build_silent_auth_url(
            &settings.sso.silent_auth_url(),
            &settings.sso.client_id,
            &format!("{app}/silent-callback"),
        )?;

        Ok(Self {
            client_id: settings.sso.client_id.clone(),
            trusted_origin,
            silent_auth_url,
            login_url: settings.sso.login_url(),
            app_root_url: format!("{app}/"),
            silent_timeout: Duration::from_millis(settings.sso.silent_timeout_ms),
            frame_grace: Duration::from_millis(settings.sso.frame_grace_ms),
            notice_delay: Duration::from_millis(settings.sso.redirect_notice_ms),
        })
    }
}

/// The hybrid authentication orchestrator.
///
/// Single-threaded and cooperative: all methods take `&mut self`, and the
/// only suspension points are network futures and the silent-attempt race.
pub struct Orchestrator {
    config: OrchestratorConfig,
    probe: Arc<dyn SessionProbe>,
    exchange: Arc<dyn TokenExchange>,
    host: Arc<dyn PageHost>,
    bus: Arc<dyn MessageBus>,

    state: AuthState,
    attempt: Option<AuthAttempt>,
    profile: Option<UserProfile>,
    method: Option<AuthMethod>,
    error: Option<String>,
    loading: bool,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        probe: Arc<dyn SessionProbe>,
        exchange: Arc<dyn TokenExchange>,
        host: Arc<dyn PageHost>,
        bus: Arc<dyn MessageBus>,
    ) -> Self {
        Self {
            config,
            probe,
            exchange,
            host,
            bus,
            state: AuthState::Init,
            attempt: None,
            profile: None,
            method: None,
            error: None,
            loading: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn method(&self) -> Option<AuthMethod> {
        self.method
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Drive authentication to a resting state.
    ///
    /// Runs on page load and on manual re-login after a reset. Resting
    /// states are `Authenticated`, `Failed`, and `RedirectAttempt` (the
    /// page is navigating away; this instance is done).
    ///
    /// # Errors
    ///
    /// [`AuthError::AttemptInProgress`] when called while an attempt is
    /// pending (rapid re-render guard); transition errors indicate a bug.
    pub async fn authenticate(&mut self) -> Result<AuthState, AuthError> {
        match self.state {
            AuthState::Init => {}
            AuthState::Authenticated => return Ok(AuthState::Authenticated),
            _ => return Err(AuthError::AttemptInProgress),
        }
        self.loading = true;

        // Return leg: the page address carries an authorization code from a
        // redirect attempt in a prior page instance. Skip probe and silent
        // attempt entirely.
        if self.profile.is_none() {
            let address = self.host.location();
            if let Some(code) = query_param(&address, "code") {
                debug!("Authorization code present in page address; entering exchange");
                self.attempt = Some(AuthAttempt::new(AuthMethod::Redirect));

                let returned_state = query_param(&address, "state");
                if self.login_state_matches(returned_state.as_deref()) {
                    return self.run_exchange(AuthorizationCode::new(code)).await;
                }
                error!("Login state mismatch on redirect return; refusing to exchange code");
                return self.fail("Authentication failed");
            }
        }

        self.transition(AuthState::Probing)?;
        match self.probe.check_session().await {
            Ok(status) if status.authenticated => {
                if let Some(profile) = status.profile {
                    info!("Existing session found for {}", profile.email);
                    self.profile = Some(profile);
                    self.loading = false;
                    self.transition(AuthState::Authenticated)?;
                    return Ok(AuthState::Authenticated);
                }
                // Authenticated without a profile reads as no session.
            }
            Ok(_) => {}
            Err(e) => {
                // Fail closed: any probe failure reads as "no session" and
                // is never surfaced or retried.
                debug!("Session probe failed, treating as unauthenticated: {e}");
            }
        }

        self.transition(AuthState::SilentAttempt)?;
        self.attempt = Some(AuthAttempt::new(AuthMethod::Silent));
        self.method = Some(AuthMethod::Silent);

        let silent = SilentAuthChannel::new(
            Arc::clone(&self.host),
            Arc::clone(&self.bus),
            self.config.trusted_origin.clone(),
            self.config.silent_auth_url.clone(),
            self.config.silent_timeout,
            self.config.frame_grace,
        );

        match silent.begin().await {
            SilentOutcome::Authorized(code) => self.run_exchange(code).await,
            SilentOutcome::Declined { error } => {
                debug!("Silent authentication declined by SSO server: {error}");
                self.fall_back_to_redirect().await
            }
            SilentOutcome::TimedOut => {
                debug!(
                    "No silent auth message within {:?}",
                    self.config.silent_timeout
                );
                self.fall_back_to_redirect().await
            }
        }
    }

    /// Manual login action: skip the silent attempt and navigate straight
    /// to the interactive login endpoint.
    ///
    /// # Errors
    ///
    /// Rejected while an attempt is pending or when already authenticated.
    pub fn manual_login(&mut self) -> Result<AuthState, AuthError> {
        self.transition(AuthState::RedirectAttempt)?;
        self.attempt = Some(AuthAttempt::new(AuthMethod::Redirect));
        self.method = Some(AuthMethod::Redirect);
        self.redirect_flow().navigate_now();
        Ok(AuthState::RedirectAttempt)
    }

    /// Logout side transition: clear the session cookie through the proxy
    /// and reset in-memory state. No automatic re-probe afterwards.
    ///
    /// # Errors
    ///
    /// Returns the probe error if the logout endpoint is unreachable; the
    /// in-memory state is left untouched in that case.
    pub async fn logout(&mut self) -> Result<(), ProbeError> {
        self.probe.end_session().await?;
        info!("Signed out; session cookie cleared");
        self.reset();
        Ok(())
    }

    /// Return to an `Init`-equivalent state, as a fresh page load would.
    pub fn reset(&mut self) {
        self.state = AuthState::Init;
        self.attempt = None;
        self.profile = None;
        self.method = None;
        self.error = None;
        self.loading = false;
    }

    /// Validate the returned anti-replay state against the persisted token.
    ///
    /// Consumes the persisted token either way, keeping it single-use.
    fn login_state_matches(&self, returned: Option<&str>) -> bool {
        let issued = self.host.take_login_state();
        match (issued, returned) {
            (Some(issued), Some(returned)) => issued == returned,
            _ => false,
        }
    }

    /// Run the token exchange exactly once for the current attempt, tagged
    /// with the attempt's strategy.
    async fn run_exchange(&mut self, code: AuthorizationCode) -> Result<AuthState, AuthError> {
        let method = {
            let attempt = self.attempt.as_mut().ok_or(AuthError::NoActiveAttempt)?;
            if attempt.exchange_started {
                return Err(AuthError::ExchangeInFlight);
            }
            attempt.exchange_started = true;
            attempt.method
        };
        self.transition(AuthState::Exchanging)?;

        match self.exchange.exchange(code).await {
            Ok(profile) => {
                info!(
                    "Authenticated {} via {} flow",
                    profile.email,
                    method.as_str()
                );
                self.profile = Some(profile);
                self.method = Some(method);
                self.error = None;
                if method == AuthMethod::Redirect {
                    // Scrub the spent code from the page address.
                    self.host.replace_location(&self.config.app_root_url);
                }
                self.loading = false;
                self.attempt = None;
                self.transition(AuthState::Authenticated)?;
                Ok(AuthState::Authenticated)
            }
            Err(ExchangeError::TokenExchangeFailed) => {
                error!("Token exchange rejected by the proxy");
                self.fail("Authentication failed")
            }
            Err(ExchangeError::ServerError(e)) => {
                error!("Token exchange server error: {e}");
                self.fail("Network error occurred")
            }
        }
    }

    /// Terminal failure for this attempt: user-visible message, loading
    /// cleared, no retry scheduled.
    fn fail(&mut self, message: &str) -> Result<AuthState, AuthError> {
        self.error = Some(message.to_string());
        self.loading = false;
        self.attempt = None;
        self.transition(AuthState::Failed)?;
        Ok(AuthState::Failed)
    }

    /// Fall back to the visible redirect flow. Ends the in-page lifecycle.
    async fn fall_back_to_redirect(&mut self) -> Result<AuthState, AuthError> {
        self.transition(AuthState::RedirectAttempt)?;
        // The redirect attempt supersedes the silent one.
        self.attempt = Some(AuthAttempt::new(AuthMethod::Redirect));
        self.method = Some(AuthMethod::Redirect);
        self.error = Some("Silent authentication failed, falling back to redirect...".to_string());

        self.redirect_flow().begin().await;
        Ok(AuthState::RedirectAttempt)
    }

    fn redirect_flow(&self) -> RedirectAuthFlow {
        RedirectAuthFlow::new(
            Arc::clone(&self.host),
            self.config.login_url.clone(),
            self.config.client_id.clone(),
            self.config.app_root_url.clone(),
            self.config.notice_delay,
        )
    }

    fn transition(&mut self, next: AuthState) -> Result<(), AuthError> {
        if !self.state.can_transition(next) {
            return Err(AuthError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Auth state: {} → {next}", self.state);
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use AuthState::{
            Authenticated, Exchanging, Failed, Init, Probing, RedirectAttempt, SilentAttempt,
        };

        assert!(Init.can_transition(Probing));
        assert!(Init.can_transition(Exchanging));
        assert!(Probing.can_transition(Authenticated));
        assert!(Probing.can_transition(SilentAttempt));
        assert!(SilentAttempt.can_transition(Exchanging));
        assert!(SilentAttempt.can_transition(RedirectAttempt));
        assert!(Exchanging.can_transition(Authenticated));
        assert!(Exchanging.can_transition(Failed));
        assert!(Failed.can_transition(RedirectAttempt));
    }

    #[test]
    fn test_illegal_transitions() {
        use AuthState::{
            Authenticated, Exchanging, Failed, Init, Probing, RedirectAttempt, SilentAttempt,
        };

        // Re-entering the exchange is the invariant the attempt flag backs up.
        assert!(!Exchanging.can_transition(Exchanging));
        assert!(!Exchanging.can_transition(SilentAttempt));
        // Terminal states do not restart implicitly.
        assert!(!Authenticated.can_transition(Probing));
        assert!(!Failed.can_transition(Exchanging));
        // The redirect attempt ends the in-page lifecycle.
        assert!(!RedirectAttempt.can_transition(Exchanging));
        assert!(!RedirectAttempt.can_transition(Probing));
        // Silent attempts only start after a probe.
        assert!(!Init.can_transition(SilentAttempt));
        assert!(!Probing.can_transition(Exchanging));
    }

    #[test]
    fn test_method_tags() {
        assert_eq!(AuthMethod::Silent.as_str(), "silent");
        assert_eq!(AuthMethod::Redirect.as_str(), "redirect");
    }

    #[test]
    fn test_config_from_settings() {
        let settings = PlumbrsSettings::default();
        let config = OrchestratorConfig::from_settings(&settings).unwrap();

        assert_eq!(config.trusted_origin, "http://localhost:9000");
        assert_eq!(config.app_root_url, "http://localhost:8080/");
        assert!(config
            .silent_auth_url
            .contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fsilent-callback"));
        assert_eq!(config.silent_timeout, Duration::from_millis(3000));
        assert_eq!(config.frame_grace, Duration::from_millis(5000));
        assert_eq!(config.notice_delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_config_rejects_invalid_sso_url() {
        let mut settings = PlumbrsSettings::default();
        settings.sso.server_url = "not a url".to_string();
        assert!(OrchestratorConfig::from_settings(&settings).is_err());
    }
}
