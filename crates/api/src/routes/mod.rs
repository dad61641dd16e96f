//! Route table for the REST surface.

pub mod auth;
pub mod items;
pub mod wishlists;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Wishlists
        .route(
            "/api/v2/wishlists",
            get(wishlists::list).post(wishlists::create),
        )
        .route("/api/v2/wishlists/export", get(wishlists::export))
        .route(
            "/api/v2/wishlists/{id}",
            get(wishlists::get)
                .put(wishlists::update)
                .delete(wishlists::remove),
        )
        // Items
        .route("/api/v2/wishlists/{id}/products", get(items::list))
        .route(
            "/api/v2/wishlists/{id}/products/{product_id}",
            post(items::add).delete(items::remove),
        )
        // Identity
        .route("/auth/handoff", post(auth::handoff))
        .route("/auth/guest", post(auth::start_guest))
        .route("/auth/session", delete(auth::logout))
}
