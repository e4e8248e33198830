//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, start transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session lock (one request at a time per session)
//! 5. Session layer (tower-sessions with `SQLite` store)

pub mod auth;
pub mod request_id;
pub mod session;
pub mod session_lock;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAdmin, admin_id_token, clear_current_user,
    set_current_user,
};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, migrate_session_store};
pub use session_lock::{SessionLocks, session_lock_middleware};
