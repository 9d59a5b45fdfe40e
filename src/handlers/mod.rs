// HTTP request handlers for the session proxy
pub mod exchange;
pub mod logout;
pub mod session_status;
pub mod shell;
pub mod silent_callback;

// Re-export the main handler functions
pub use exchange::auth_exchange;
pub use logout::logout;
pub use session_status::session_status;
pub use shell::{app_shell, health};
pub use silent_callback::silent_callback;
