//! Integration tests for Wishbox.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! cargo run -p wishbox-cli -- migrate
//!
//! # Start the API
//! cargo run -p wishbox-api
//!
//! # Run integration tests
//! cargo test -p wishbox-integration-tests -- --ignored
//! ```
//!
//! Tests talk to a running API instance over HTTP; they are `#[ignore]`d so
//! a plain `cargo test` stays green without infrastructure.

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("WISHBOX_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// The handoff secret the test platform presents (must match the server's
/// `WISHBOX_HANDOFF_SECRET`).
#[must_use]
pub fn handoff_secret() -> String {
    std::env::var("WISHBOX_HANDOFF_SECRET").unwrap_or_default()
}

/// Create a cookie-holding client, like a browser session.
///
/// # Panics
///
/// Panics if the HTTP client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Establish an authenticated session for a test user via the handoff
/// endpoint.
///
/// # Panics
///
/// Panics if the handoff request fails.
pub async fn handoff(client: &Client, user_id: i64, login: &str, capabilities: &[&str]) {
    let resp = client
        .post(format!("{}/auth/handoff", base_url()))
        .header("x-handoff-secret", handoff_secret())
        .json(&json!({
            "user": {
                "id": user_id,
                "email": format!("{login}@example.com"),
                "login": login,
                "first_name": login,
                "last_name": "Tester",
            },
            "capabilities": capabilities,
        }))
        .send()
        .await
        .expect("Failed to call handoff");

    assert!(
        resp.status().is_success(),
        "handoff failed with {}",
        resp.status()
    );
}

/// Create a wishlist and return its JSON body.
///
/// # Panics
///
/// Panics if the request fails or returns a non-success status.
pub async fn create_wishlist(client: &Client, name: &str, visibility: &str) -> Value {
    let resp = client
        .post(format!("{}/api/v2/wishlists", base_url()))
        .json(&json!({ "name": name, "visibility": visibility }))
        .send()
        .await
        .expect("Failed to create wishlist");

    assert_eq!(resp.status().as_u16(), 201, "create wishlist failed");
    resp.json().await.expect("Failed to parse wishlist body")
}
