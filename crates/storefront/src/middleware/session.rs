//! Session middleware configuration.
//!
//! Sets up `SQLite`-backed sessions using tower-sessions. The session carries
//! the visitor's cart snapshot and, once signed in, the current user.

use sqlx::SqlitePool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shesha_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the sessions table if it does not exist.
///
/// # Errors
///
/// Returns an error if the migration query fails.
pub async fn migrate_session_store(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    SqliteStore::new(pool.clone()).migrate().await
}

/// Create the session layer with `SQLite` store.
///
/// # Arguments
///
/// * `pool` - `SQLite` connection pool (already migrated)
/// * `config` - Storefront configuration (for the secure cookie flag)
#[must_use]
pub fn create_session_layer(
    pool: &SqlitePool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<SqliteStore> {
    let store = SqliteStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
