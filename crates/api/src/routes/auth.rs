//! Identity routes: platform handoff, guest sessions, logout.
//!
//! Wishbox never authenticates anyone itself. The platform that owns
//! authentication exchanges its own auth for a Wishbox session by calling
//! the handoff endpoint with a shared secret; anonymous storefront clients
//! opt into a guest session explicitly. Capability management stays
//! upstream: grants arrive with the handoff and live inside the session.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use wishbox_core::caller::{Capability, OwnerProfile};
use wishbox_core::types::{SessionToken, UserId};

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, GuestSession, session_keys};
use crate::state::AppState;

/// Header the identity platform presents on handoff calls.
pub const HANDOFF_SECRET_HEADER: &str = "x-handoff-secret";

/// Identity snapshot pushed by the platform at handoff.
#[derive(Debug, Deserialize)]
pub struct HandoffUser {
    pub id: UserId,
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Handoff request body.
#[derive(Debug, Deserialize)]
pub struct HandoffRequest {
    pub user: HandoffUser,
    /// Capabilities the platform grants for this session.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// Establish an authenticated session from a platform handoff.
///
/// POST /auth/handoff
///
/// The upstream platform has already authenticated the user; this endpoint
/// trusts it via the shared secret, mirrors the owner profile for search,
/// and swaps the session id to kill any fixation attempt.
///
/// # Errors
///
/// Returns 401 for a missing or wrong secret (flushing the session), 500 on
/// storage failures.
pub async fn handoff(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(body): Json<HandoffRequest>,
) -> Result<StatusCode, AppError> {
    let presented = headers
        .get(HANDOFF_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !secrets_match(presented, state.config().handoff_secret.expose_secret()) {
        tracing::warn!(user_id = %body.user.id, "handoff with invalid secret rejected");
        // An authentication failure tears the session down like any other.
        if let Err(error) = session.flush().await {
            tracing::warn!(%error, "failed to flush session after rejected handoff");
        }
        return Err(wishbox_core::Error::Unauthenticated.into());
    }

    let profile = OwnerProfile {
        email: body.user.email,
        login: body.user.login,
        first_name: body.user.first_name,
        last_name: body.user.last_name,
    };
    UserRepository::new(state.pool())
        .upsert(body.user.id, &profile)
        .await?;

    // Fresh session id for the fresh identity.
    session.cycle_id().await?;
    let _: Option<GuestSession> = session.remove(session_keys::GUEST_SESSION).await?;
    session
        .insert(
            session_keys::CURRENT_USER,
            CurrentUser {
                id: body.user.id,
                capabilities: body.capabilities,
            },
        )
        .await?;

    tracing::info!(user_id = %body.user.id, "identity handoff completed");

    Ok(StatusCode::NO_CONTENT)
}

/// Guest session response.
#[derive(Debug, Serialize)]
pub struct GuestSessionDto {
    pub session_id: SessionToken,
    pub expires_at: DateTime<Utc>,
}

/// Start (or return the existing) guest session.
///
/// POST /auth/guest
///
/// Guest wishlists are owned by the minted token until it expires.
///
/// # Errors
///
/// Returns 500 if the session cannot be written.
pub async fn start_guest(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<GuestSessionDto>, AppError> {
    if let Some(existing) = session
        .get::<GuestSession>(session_keys::GUEST_SESSION)
        .await
        .ok()
        .flatten()
        && existing.expires_at > Utc::now()
    {
        return Ok(Json(GuestSessionDto {
            session_id: existing.token,
            expires_at: existing.expires_at,
        }));
    }

    let guest = GuestSession {
        token: SessionToken::mint(),
        expires_at: Utc::now() + TimeDelta::days(state.config().guest_session_days),
    };
    session
        .insert(session_keys::GUEST_SESSION, &guest)
        .await?;

    Ok(Json(GuestSessionDto {
        session_id: guest.token,
        expires_at: guest.expires_at,
    }))
}

/// End the session.
///
/// DELETE /auth/session
///
/// # Errors
///
/// Returns 500 if the session store cannot be reached.
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    session.flush().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Constant-time secret comparison.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("abc123", "abc123"));
        assert!(!secrets_match("abc123", "abc124"));
        assert!(!secrets_match("abc", "abc123"));
        assert!(!secrets_match("", "abc123"));
    }
}
