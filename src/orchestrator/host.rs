//! Page-host seam for the in-page orchestrator
//!
//! The orchestrator never touches a browsing environment directly; every
//! visible effect goes through this trait so a native shell (webview
//! embedder) and the test harness plug in the same way.

/// Identifier of a hidden frame opened by [`PageHost::open_hidden_frame`].
pub type FrameId = u64;

/// What the orchestrator needs from the page it lives in.
///
/// Implementations must be cheap to clone behind an `Arc`; the silent-auth
/// channel holds one across its detach task.
pub trait PageHost: Send + Sync {
    /// Create a non-visible embedded browsing context at `url`.
    fn open_hidden_frame(&self, url: &str) -> FrameId;

    /// Detach a previously opened frame. Must tolerate an already-detached
    /// frame; the grace-period task races page teardown.
    fn detach_frame(&self, frame: FrameId);

    /// Navigate the whole page away. Control only returns through a fresh
    /// page load.
    fn navigate(&self, url: &str);

    /// The page's own current address, including any query string.
    fn location(&self) -> String;

    /// Replace the page's address without navigating (used to scrub the
    /// authorization code after a redirect return).
    fn replace_location(&self, url: &str);

    /// Persist the anti-replay login state token across a full navigation.
    fn persist_login_state(&self, token: &str);

    /// Take (and clear) the persisted login state token, if any. Clearing
    /// on read keeps the token single-use.
    fn take_login_state(&self) -> Option<String>;
}

/// Extract a query parameter from a page address.
///
/// Addresses come from [`PageHost::location`] and are not guaranteed to be
/// well-formed; a bad URL reads as "parameter absent".
#[must_use]
pub fn query_param(address: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(address).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
