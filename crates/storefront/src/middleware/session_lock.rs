//! Per-session request serialization.
//!
//! The session layer loads a visitor's session record when a handler first
//! touches it and writes the whole record back once the response is built.
//! Two overlapping requests on the same session would each write their own
//! copy, and the later write would drop the earlier one's cart change. This
//! middleware runs outside the session layer and holds a per-session lock for
//! the entire request, so the load, the handler and the final write of one
//! request finish before the next request on that session starts.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_sessions::cookie::Cookie;

use super::session::SESSION_COOKIE_NAME;
use crate::state::AppState;

/// Per-session request locks keyed by session id.
///
/// Entries expire after 30 minutes without use.
#[derive(Clone)]
pub struct SessionLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(Duration::from_secs(30 * 60))
                .build(),
        }
    }

    /// The lock for `session_id`, created on first use.
    pub async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with_by_ref(session_id, async { Arc::new(Mutex::new(())) })
            .await
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Session id carried by the request's session cookie, if any.
fn session_id_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|id| !id.is_empty())
}

/// Serialize requests that share a session.
///
/// Requests without a session cookie start a fresh session that no other
/// request can see yet, so they pass straight through.
pub async fn session_lock_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_id_from_cookies(request.headers()) else {
        return next.run(request).await;
    };

    let lock = state.session_locks().lock_for(&session_id).await;
    let _guard = lock.lock().await;
    next.run(request).await
}
