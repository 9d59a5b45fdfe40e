#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the plumbrs application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod settings;
pub mod sso;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use models::{SessionStatus, UserProfile};
pub use orchestrator::{
    AuthError, AuthMethod, AuthState, Orchestrator, OrchestratorConfig,
};
pub use session::SessionManager;
pub use settings::PlumbrsSettings;
pub use sso::SsoClient;
