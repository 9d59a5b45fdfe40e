//! Unified testing utilities for plumbrs
//!
//! Fixtures and scripted fakes shared by unit tests and the integration
//! suite. The fakes stand in for the page environment the orchestrator
//! normally runs against: a page host whose effects are recorded instead
//! of performed, a message bus that tests post to directly, and stub
//! probe/exchange services with scripted results.
//!
//! Available to integration tests through the `testing` cargo feature.

pub mod fixtures;
pub mod mock;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use mock::{StubExchange, StubProbe, TestMessageBus, TestPageHost};

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "a@x";

    /// Default test user name
    pub const TEST_USER_NAME: &str = "A";

    /// Default test user id
    pub const TEST_USER_ID: &str = "1";

    /// The trusted SSO origin used by test configurations
    pub const TEST_SSO_ORIGIN: &str = "http://localhost:9000";

    /// An origin that must never influence orchestrator state
    pub const UNTRUSTED_ORIGIN: &str = "https://evil.example.com";

    /// Session secret used by test session managers
    pub const TEST_SESSION_SECRET: &[u8] = b"test_key_32_bytes_long_for_test_";
}
