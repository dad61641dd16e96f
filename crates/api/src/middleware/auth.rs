//! Caller extraction and policy enforcement.
//!
//! [`Caller`] builds the request-scoped [`CallerContext`] from the session
//! once, at the edge; handlers never read identity from anywhere else. The
//! `require_*` helpers run the core policy gate and honor its context-reset
//! contract by flushing the session on authorization failures.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tower_sessions::Session;

use wishbox_core::caller::CallerContext;
use wishbox_core::policy::{Action, ContextReset, PolicyGate};
use wishbox_core::types::ShareToken;
use wishbox_core::wishlist::Wishlist;

use crate::error::AppError;
use crate::models::{CurrentUser, GuestSession, session_keys};

/// Header a caller may use to present a wishlist share token.
pub const SHARE_TOKEN_HEADER: &str = "x-share-token";

/// Extractor building the caller context for this request.
///
/// Prefers the authenticated identity; falls back to the guest identity;
/// otherwise the caller is unidentified. Never rejects on its own — the
/// policy decides what an unidentified caller may do.
pub struct Caller(pub CallerContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_owned()))?;

        let now = Utc::now();

        let mut caller = if let Some(user) = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
        {
            CallerContext::user(user.id, user.capabilities, now)
        } else if let Some(guest) = session
            .get::<GuestSession>(session_keys::GUEST_SESSION)
            .await
            .ok()
            .flatten()
        {
            CallerContext::session(guest.token, guest.expires_at, now)
        } else {
            CallerContext::unidentified(now)
        };

        if let Some(token) = parts
            .headers
            .get(SHARE_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            caller = caller.with_share_token(ShareToken::new(token));
        }

        Ok(Self(caller))
    }
}

/// Reset hook handed to the core policy gate.
///
/// The gate runs synchronously, so the hook only records that a reset is
/// due; [`settle`] then flushes the session asynchronously.
#[derive(Default)]
struct SessionPoison {
    tripped: AtomicBool,
}

impl ContextReset for SessionPoison {
    fn reset(&self) {
        self.tripped.store(true, Ordering::Relaxed);
    }
}

async fn settle(
    session: &Session,
    poison: &SessionPoison,
    decision: Result<(), wishbox_core::Error>,
) -> Result<(), AppError> {
    if poison.tripped.load(Ordering::Relaxed) {
        // A failed authorization must not leave a usable identity behind for
        // a later call on the same connection.
        if let Err(error) = session.flush().await {
            tracing::warn!(%error, "failed to flush session after authorization failure");
        }
    }
    decision.map_err(AppError::from)
}

/// Require any usable identity.
///
/// # Errors
///
/// Returns 401 (and flushes the session) for unidentified callers.
pub async fn require_identified(
    session: &Session,
    caller: &CallerContext,
) -> Result<(), AppError> {
    let poison = SessionPoison::default();
    let decision = PolicyGate::new(&poison).identified(caller);
    settle(session, &poison, decision).await
}

/// Require the export capability.
///
/// # Errors
///
/// Returns 401/403 (and flushes the session) when denied.
pub async fn require_export(session: &Session, caller: &CallerContext) -> Result<(), AppError> {
    let poison = SessionPoison::default();
    let decision = PolicyGate::new(&poison).export(caller);
    settle(session, &poison, decision).await
}

/// Require record-level access for the given action.
///
/// # Errors
///
/// Returns 401/403 (and flushes the session) when denied.
pub async fn require_record(
    session: &Session,
    caller: &CallerContext,
    action: Action,
    record: &Wishlist,
) -> Result<(), AppError> {
    let poison = SessionPoison::default();
    let decision = PolicyGate::new(&poison).record(caller, action, record);
    settle(session, &poison, decision).await
}
