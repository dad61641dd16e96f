//! Caller identity: who is asking, and what they are allowed to ask for.
//!
//! Every operation receives an explicit [`CallerContext`] built at the edge of
//! the request. Nothing in the domain layer reads ambient "current user"
//! state; the context is constructed once and passed down, so a stale
//! identity can never outlive its request.

use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SessionToken, ShareToken, UserId};

/// A capability granted to an authenticated principal.
///
/// Grants are managed by the platform that owns authentication and arrive
/// with the identity handoff; this layer only checks them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Read and export wishlists across all owners.
    ExportWishlists,
}

impl Capability {
    /// Stable wire name of the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExportWishlists => "export_wishlists",
        }
    }
}

/// Error returned when parsing a [`Capability`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized capability: {0}")]
pub struct ParseCapabilityError(String);

impl FromStr for Capability {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "export_wishlists" => Ok(Self::ExportWishlists),
            other => Err(ParseCapabilityError(other.to_owned())),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Authenticated principal with a stable id and capability grants.
    User {
        id: UserId,
        capabilities: BTreeSet<Capability>,
    },
    /// Anonymous principal identified by a guest session token.
    Session {
        token: SessionToken,
        expires_at: DateTime<Utc>,
    },
    /// No identity at all.
    None,
}

/// Request-scoped caller context.
///
/// Carries the identity, an optional share token the caller presented (used
/// only by the per-record `shared` visibility check), and the instant the
/// request started. Expiry checks are made against that instant so a single
/// request sees one consistent answer.
#[derive(Debug, Clone)]
pub struct CallerContext {
    identity: Identity,
    presented_token: Option<ShareToken>,
    now: DateTime<Utc>,
}

impl CallerContext {
    /// Context for an authenticated user.
    pub fn user(
        id: UserId,
        capabilities: impl IntoIterator<Item = Capability>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            identity: Identity::User {
                id,
                capabilities: capabilities.into_iter().collect(),
            },
            presented_token: None,
            now,
        }
    }

    /// Context for an anonymous guest session.
    #[must_use]
    pub const fn session(token: SessionToken, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            identity: Identity::Session { token, expires_at },
            presented_token: None,
            now,
        }
    }

    /// Context for a caller with no identity.
    #[must_use]
    pub const fn unidentified(now: DateTime<Utc>) -> Self {
        Self {
            identity: Identity::None,
            presented_token: None,
            now,
        }
    }

    /// Attach a share token the caller presented alongside the request.
    #[must_use]
    pub fn with_share_token(mut self, token: ShareToken) -> Self {
        self.presented_token = Some(token);
        self
    }

    /// The authenticated user id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        match &self.identity {
            Identity::User { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// The guest session token, if the session is still active.
    #[must_use]
    pub fn session_token(&self) -> Option<&SessionToken> {
        self.active_session().map(|(token, _)| token)
    }

    /// The guest session token and its expiration, if still active.
    #[must_use]
    pub fn active_session(&self) -> Option<(&SessionToken, DateTime<Utc>)> {
        match &self.identity {
            Identity::Session { token, expires_at } if *expires_at > self.now => {
                Some((token, *expires_at))
            }
            _ => None,
        }
    }

    /// The share token presented with the request, if any.
    #[must_use]
    pub fn presented_token(&self) -> Option<&ShareToken> {
        self.presented_token.as_ref()
    }

    /// Whether the caller holds the given capability.
    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        match &self.identity {
            Identity::User { capabilities, .. } => capabilities.contains(&capability),
            _ => false,
        }
    }

    /// Whether the caller may read wishlists across all owners.
    #[must_use]
    pub fn can_export(&self) -> bool {
        self.has_capability(Capability::ExportWishlists)
    }

    /// Whether any usable identity is present: an authenticated user, or a
    /// guest session that has not expired.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.user_id().is_some() || self.session_token().is_some()
    }

    /// The instant this request started.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Owner-identity fields that text search runs against.
///
/// The identity provider owns these; they are mirrored locally so searches
/// can match against them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProfile {
    pub email: String,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
}

/// Lookup of owner profiles by user id.
pub trait ProfileLookup {
    /// The profile for a user, if one is known.
    fn profile(&self, user: UserId) -> Option<OwnerProfile>;
}

impl ProfileLookup for HashMap<UserId, OwnerProfile> {
    fn profile(&self, user: UserId) -> Option<OwnerProfile> {
        self.get(&user).cloned()
    }
}

/// An empty profile directory. Searches against owner fields match nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProfiles;

impl ProfileLookup for NoProfiles {
    fn profile(&self, _user: UserId) -> Option<OwnerProfile> {
        None
    }
}
