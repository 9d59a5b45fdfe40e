//! Session Management Module
//!
//! Stateless encrypted session handling for the proxy: the session lives
//! entirely inside one HTTP-only cookie, created on successful token
//! exchange and destroyed by logout or expiry.
//!
//! - [`manager`] - Core session manager for encrypted session handling
//! - [`cookie`] - Cookie factory and clearing utilities

pub mod cookie;
pub mod manager;

// Re-export commonly used items for convenience
pub use cookie::{create_expired_cookie, CookieFactory, CookieOptions, SESSION_COOKIE_NAME};
pub use manager::SessionManager;
