//! Silent-auth channel
//!
//! Attempts authentication without user-visible navigation: one hidden
//! frame pointed at the SSO server's silent-auth endpoint, one subscription
//! on the cross-context message bus, one timer. Whichever resolves first
//! (trusted success, trusted failure, timeout) decides the outcome; the
//! losing futures are dropped in place, so a late message can never re-enter
//! an abandoned attempt.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use url::Url;

use super::host::PageHost;
use crate::orchestrator::AuthorizationCode;

/// Cross-context message emitted by the silent-callback responder page.
///
/// The wire shape is the postMessage payload: a `type` discriminant plus
/// either a code or an error string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AuthMessage {
    #[serde(rename = "SSO_AUTH_SUCCESS")]
    Success { code: String },
    #[serde(rename = "SSO_AUTH_FAILED")]
    Failed { error: String },
}

/// An [`AuthMessage`] together with the origin of its sender.
///
/// The origin is asserted by the message bus, not by the sender; it is the
/// only basis for trusting the payload.
#[derive(Debug, Clone)]
pub struct MessageEnvelope {
    pub origin: String,
    pub message: AuthMessage,
}

/// Cross-context message bus, as seen from the page.
///
/// `subscribe` registers a listener; dropping the returned receiver
/// deregisters it. The bus is an open broadcast medium shared with
/// arbitrary other senders, which is why every envelope carries its sender
/// origin and why consumers must filter on it.
pub trait MessageBus: Send + Sync {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<MessageEnvelope>;
}

/// Outcome of a silent authentication attempt.
#[derive(Debug)]
pub enum SilentOutcome {
    /// The SSO server resolved an existing session and issued a code.
    Authorized(AuthorizationCode),
    /// The SSO server explicitly declined (no session, consent required, ...).
    Declined { error: String },
    /// No trusted message arrived within the bound.
    TimedOut,
}

/// One silent authentication attempt
///
/// Owns the hidden frame and the single bus subscription for its duration.
pub struct SilentAuthChannel {
    host: Arc<dyn PageHost>,
    bus: Arc<dyn MessageBus>,
    trusted_origin: String,
    silent_auth_url: String,
    timeout: Duration,
    frame_grace: Duration,
}

impl SilentAuthChannel {
    #[must_use]
    pub fn new(
        host: Arc<dyn PageHost>,
        bus: Arc<dyn MessageBus>,
        trusted_origin: String,
        silent_auth_url: String,
        timeout: Duration,
        frame_grace: Duration,
    ) -> Self {
        Self {
            host,
            bus,
            trusted_origin,
            silent_auth_url,
            timeout,
            frame_grace,
        }
    }

    /// Run the attempt to completion
    ///
    /// Subscribes before the frame is opened so a fast responder cannot
    /// race the listener registration. The frame is detached after the
    /// grace period regardless of outcome; if the frame never loads, the
    /// detach task is the only thing that reclaims it.
    pub async fn begin(&self) -> SilentOutcome {
        let mut receiver = self.bus.subscribe();

        let frame = self.host.open_hidden_frame(&self.silent_auth_url);
        debug!(
            "Silent auth frame {frame} opened at {}",
            self.silent_auth_url
        );

        // Reclaim the frame after the grace period, whatever happens below.
        let detach_host = Arc::clone(&self.host);
        let frame_grace = self.frame_grace;
        tokio::spawn(async move {
            tokio::time::sleep(frame_grace).await;
            detach_host.detach_frame(frame);
        });

        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            tokio::select! {
                envelope = receiver.recv() => {
                    let Some(envelope) = envelope else {
                        // Bus closed underneath us; only the timer can end
                        // the attempt now.
                        tokio::time::sleep_until(deadline).await;
                        return SilentOutcome::TimedOut;
                    };

                    if envelope.origin != self.trusted_origin {
                        // Expected background noise on a shared message
                        // bus. Dropped unprocessed, and not an error.
                        debug!("Ignoring message from untrusted origin {}", envelope.origin);
                        continue;
                    }

                    match envelope.message {
                        AuthMessage::Success { code } => {
                            return SilentOutcome::Authorized(AuthorizationCode::new(code));
                        }
                        AuthMessage::Failed { error } => {
                            return SilentOutcome::Declined { error };
                        }
                    }
                }
                () = tokio::time::sleep_until(deadline) => {
                    // Returning drops the receiver, deregistering the
                    // listener: a message arriving after this point cannot
                    // influence any later state.
                    return SilentOutcome::TimedOut;
                }
            }
        }
    }
}

/// Build the silent-auth endpoint address for a client and callback.
///
/// # Errors
///
/// Returns an error if `silent_auth_url` is not a valid absolute URL.
pub fn build_silent_auth_url(
    silent_auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(silent_auth_url)?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_message_wire_format() {
        let success: AuthMessage =
            serde_json::from_str(r#"{"type":"SSO_AUTH_SUCCESS","code":"abc"}"#).unwrap();
        assert_eq!(
            success,
            AuthMessage::Success {
                code: "abc".to_string()
            }
        );

        let failed: AuthMessage =
            serde_json::from_str(r#"{"type":"SSO_AUTH_FAILED","error":"login_required"}"#).unwrap();
        assert_eq!(
            failed,
            AuthMessage::Failed {
                error: "login_required".to_string()
            }
        );

        // Unknown discriminants do not parse into either variant
        assert!(serde_json::from_str::<AuthMessage>(r#"{"type":"SOMETHING_ELSE"}"#).is_err());
    }

    #[test]
    fn test_build_silent_auth_url() {
        let url = build_silent_auth_url(
            "http://localhost:9000/api/sso/silent-auth",
            "clientA",
            "http://localhost:8080/silent-callback",
        )
        .unwrap();

        assert!(url.starts_with("http://localhost:9000/api/sso/silent-auth?"));
        assert!(url.contains("client_id=clientA"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fsilent-callback"));
    }

    #[test]
    fn test_build_silent_auth_url_rejects_relative() {
        assert!(build_silent_auth_url("/silent-auth", "clientA", "x").is_err());
    }
}
