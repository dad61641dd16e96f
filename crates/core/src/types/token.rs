//! Opaque token types: share tokens and anonymous session tokens.

use core::fmt;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a generated share token.
const SHARE_TOKEN_LENGTH: usize = 12;

/// A wishlist sharing token.
///
/// Grants read access to a `shared` wishlist to any caller presenting it.
/// Tokens are uppercase alphanumeric so they survive being read out loud or
/// typed from a screenshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareToken(String);

impl ShareToken {
    /// Wrap an existing token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        let token: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(SHARE_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(token.to_uppercase())
    }

    /// The token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token identifying an anonymous (guest) session.
///
/// Guest-owned wishlists are keyed by this token; once the owning session
/// expires they become invisible to every query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap an existing token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Mint a fresh guest session token.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// The token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
