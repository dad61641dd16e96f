//! Database operations for the Wishbox `PostgreSQL` instance.
//!
//! # Schema: `wishbox`
//!
//! ## Tables
//!
//! - `users` - Owner profiles mirrored from the identity platform
//! - `wishlists` - Wishlist records (user- or guest-session-owned)
//! - `wishlist_items` - Product entries, one row per (wishlist, product)
//!
//! tower-sessions manages its own session table separately (created via
//! `PostgresStore::migrate` at startup).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p wishbox-cli -- migrate
//! ```
//!
//! # Query style
//!
//! The wishlist search is assembled at runtime from the core query's
//! predicates, so this crate uses runtime-bound sqlx queries throughout
//! (`sqlx::QueryBuilder` for the search, `query`/`query_as` elsewhere)
//! rather than the compile-time macros.

pub mod items;
pub mod users;
pub mod wishlists;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use items::ItemRepository;
pub use users::UserRepository;
pub use wishlists::{NewWishlist, WishlistRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug for the same owner).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
