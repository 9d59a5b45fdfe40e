//! Mock objects and fake implementations
//!
//! Scripted stand-ins for the orchestrator's environment. All of them
//! record what was asked of them so tests assert on effects, not wiring.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::{SessionStatus, UserProfile};
use crate::orchestrator::channel::{AuthMessage, MessageBus, MessageEnvelope};
use crate::orchestrator::exchange::{AuthorizationCode, ExchangeError, TokenExchange};
use crate::orchestrator::host::{FrameId, PageHost};
use crate::orchestrator::probe::{ProbeError, SessionProbe};

// =============================================================================
// Page host
// =============================================================================

#[derive(Default)]
struct HostLog {
    location: String,
    opened_frames: Vec<(FrameId, String)>,
    detached_frames: Vec<FrameId>,
    navigations: Vec<String>,
    replaced_locations: Vec<String>,
    login_state: Option<String>,
}

/// Fake page host that records every effect instead of performing it
pub struct TestPageHost {
    next_frame: AtomicU64,
    log: Mutex<HostLog>,
}

impl TestPageHost {
    /// Host for a page currently at the application root
    #[must_use]
    pub fn new() -> Self {
        Self::at("http://localhost:8080/")
    }

    /// Host for a page currently at `location`
    #[must_use]
    pub fn at(location: &str) -> Self {
        Self {
            next_frame: AtomicU64::new(1),
            log: Mutex::new(HostLog {
                location: location.to_string(),
                ..HostLog::default()
            }),
        }
    }

    #[must_use]
    pub fn opened_frames(&self) -> Vec<(FrameId, String)> {
        self.log.lock().unwrap().opened_frames.clone()
    }

    #[must_use]
    pub fn detached_frames(&self) -> Vec<FrameId> {
        self.log.lock().unwrap().detached_frames.clone()
    }

    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    #[must_use]
    pub fn replaced_locations(&self) -> Vec<String> {
        self.log.lock().unwrap().replaced_locations.clone()
    }

    /// Pre-load a persisted login state token, as if a prior page instance
    /// had stored one before navigating away
    pub fn seed_login_state(&self, token: &str) {
        self.log.lock().unwrap().login_state = Some(token.to_string());
    }

    #[must_use]
    pub fn stored_login_state(&self) -> Option<String> {
        self.log.lock().unwrap().login_state.clone()
    }
}

impl Default for TestPageHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PageHost for TestPageHost {
    fn open_hidden_frame(&self, url: &str) -> FrameId {
        let id = self.next_frame.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap()
            .opened_frames
            .push((id, url.to_string()));
        id
    }

    fn detach_frame(&self, frame: FrameId) {
        self.log.lock().unwrap().detached_frames.push(frame);
    }

    fn navigate(&self, url: &str) {
        let mut log = self.log.lock().unwrap();
        log.navigations.push(url.to_string());
        log.location = url.to_string();
    }

    fn location(&self) -> String {
        self.log.lock().unwrap().location.clone()
    }

    fn replace_location(&self, url: &str) {
        let mut log = self.log.lock().unwrap();
        log.replaced_locations.push(url.to_string());
        log.location = url.to_string();
    }

    fn persist_login_state(&self, token: &str) {
        self.log.lock().unwrap().login_state = Some(token.to_string());
    }

    fn take_login_state(&self) -> Option<String> {
        self.log.lock().unwrap().login_state.take()
    }
}

// =============================================================================
// Message bus
// =============================================================================

/// In-process message bus that tests post envelopes to directly
#[derive(Default)]
pub struct TestMessageBus {
    senders: Mutex<Vec<mpsc::UnboundedSender<MessageEnvelope>>>,
}

impl TestMessageBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a message to every live subscriber
    pub fn post(&self, origin: &str, message: AuthMessage) {
        let senders = self.senders.lock().unwrap();
        for sender in senders.iter() {
            // A closed receiver means the listener was deregistered; that
            // is exactly what some tests are asserting, so it is not an
            // error here.
            let _ = sender.send(MessageEnvelope {
                origin: origin.to_string(),
                message: message.clone(),
            });
        }
    }

    /// Number of subscribers whose receiver is still attached
    #[must_use]
    pub fn live_subscribers(&self) -> usize {
        self.senders
            .lock()
            .unwrap()
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }
}

impl MessageBus for TestMessageBus {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<MessageEnvelope> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(sender);
        receiver
    }
}

// =============================================================================
// Session probe
// =============================================================================

enum ProbeScript {
    Status(SessionStatus),
    NetworkError,
}

/// Stub session probe with a scripted result
pub struct StubProbe {
    script: ProbeScript,
    check_calls: AtomicUsize,
    end_calls: AtomicUsize,
}

impl StubProbe {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::with_script(ProbeScript::Status(SessionStatus::unauthenticated()))
    }

    #[must_use]
    pub fn authenticated(profile: UserProfile) -> Self {
        Self::with_script(ProbeScript::Status(SessionStatus::authenticated(profile)))
    }

    /// A probe whose status endpoint is unreachable
    #[must_use]
    pub fn failing() -> Self {
        Self::with_script(ProbeScript::NetworkError)
    }

    fn with_script(script: ProbeScript) -> Self {
        Self {
            script,
            check_calls: AtomicUsize::new(0),
            end_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn end_calls(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProbe for StubProbe {
    async fn check_session(&self) -> Result<SessionStatus, ProbeError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            ProbeScript::Status(status) => Ok(status.clone()),
            ProbeScript::NetworkError => {
                Err(ProbeError::Network("connection refused".to_string()))
            }
        }
    }

    async fn end_session(&self) -> Result<(), ProbeError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Token exchange
// =============================================================================

enum ExchangeScript {
    Profile(UserProfile),
    Rejected,
    ServerError,
}

/// Stub token exchange recording every code it is handed
pub struct StubExchange {
    script: ExchangeScript,
    codes: Mutex<Vec<String>>,
}

impl StubExchange {
    #[must_use]
    pub fn succeeding(profile: UserProfile) -> Self {
        Self::with_script(ExchangeScript::Profile(profile))
    }

    /// An exchange endpoint answering non-2xx
    #[must_use]
    pub fn rejecting() -> Self {
        Self::with_script(ExchangeScript::Rejected)
    }

    /// An exchange endpoint answering 2xx with an unusable body
    #[must_use]
    pub fn erroring() -> Self {
        Self::with_script(ExchangeScript::ServerError)
    }

    fn with_script(script: ExchangeScript) -> Self {
        Self {
            script,
            codes: Mutex::new(Vec::new()),
        }
    }

    /// Every code that reached the exchange, in order
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        self.codes.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.codes.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenExchange for StubExchange {
    async fn exchange(&self, code: AuthorizationCode) -> Result<UserProfile, ExchangeError> {
        self.codes.lock().unwrap().push(code.into_inner());
        match &self.script {
            ExchangeScript::Profile(profile) => Ok(profile.clone()),
            ExchangeScript::Rejected => Err(ExchangeError::TokenExchangeFailed),
            ExchangeScript::ServerError => Err(ExchangeError::ServerError(
                "malformed response".to_string(),
            )),
        }
    }
}
