//! Session-stored identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wishbox_core::caller::Capability;
use wishbox_core::types::{SessionToken, UserId};

/// Session-stored authenticated identity.
///
/// Written by the handoff endpoint; the capability grants arrive with it and
/// live exactly as long as the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The platform's stable user id.
    pub id: UserId,
    /// Capabilities the platform granted for this session.
    pub capabilities: Vec<Capability>,
}

/// Session-stored guest identity.
///
/// Minted by the guest endpoint; the token owns any wishlists the guest
/// creates until `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestSession {
    pub token: SessionToken,
    pub expires_at: DateTime<Utc>,
}

/// Session keys for identity data.
pub mod keys {
    /// Key for storing the authenticated identity.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the guest identity.
    pub const GUEST_SESSION: &str = "guest_session";
}
