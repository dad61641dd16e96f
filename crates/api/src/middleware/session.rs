//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ApiConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "wishbox_session";

/// Create the session layer with `PostgreSQL` store.
///
/// The cookie lives as long as guest wishlists do, so an idle guest session
/// and the records it owns expire together.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - API configuration (for the guest session lifetime)
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ApiConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The session table itself is created via PostgresStore::migrate at
    // startup.
    let store = PostgresStore::new(pool.clone());

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    let expiry_seconds = config.guest_session_days * 24 * 60 * 60;

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(expiry_seconds),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
