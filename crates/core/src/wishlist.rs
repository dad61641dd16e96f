//! The wishlist domain model and its per-record access rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::caller::CallerContext;
use crate::types::{
    ItemId, ProductId, SessionToken, ShareToken, Slug, UserId, Visibility, WishlistId,
};

/// Who owns a wishlist: exactly one of an authenticated user or an anonymous
/// guest session. The two-variant enum makes the "exactly one" invariant
/// unrepresentable to violate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Owned by an authenticated user.
    User(UserId),
    /// Owned by a guest session; logically gone once the session expires.
    Session {
        token: SessionToken,
        expires_at: DateTime<Utc>,
    },
}

impl Owner {
    /// The owning user id, for user-owned records.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Session { .. } => None,
        }
    }

    /// The owning session token, for guest-owned records.
    #[must_use]
    pub const fn session_token(&self) -> Option<&SessionToken> {
        match self {
            Self::User(_) => None,
            Self::Session { token, .. } => Some(token),
        }
    }

    /// Whether a guest owner's session has expired as of `now`.
    #[must_use]
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::User(_) => false,
            Self::Session { expires_at, .. } => *expires_at <= now,
        }
    }

    /// Whether the caller is this owner.
    #[must_use]
    pub fn matches(&self, caller: &CallerContext) -> bool {
        match self {
            Self::User(id) => caller.user_id() == Some(*id),
            Self::Session { token, .. } => caller.session_token() == Some(token),
        }
    }
}

/// A named collection of products with one owner.
#[derive(Debug, Clone)]
pub struct Wishlist {
    pub id: WishlistId,
    pub owner: Owner,
    pub slug: Slug,
    pub name: String,
    pub share_token: ShareToken,
    pub visibility: Visibility,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Wishlist {
    /// The record's access rules, as one variant per visibility state.
    #[must_use]
    pub const fn access(&self) -> RecordAccess<'_> {
        match self.visibility {
            Visibility::Private => RecordAccess::PrivateOwner { owner: &self.owner },
            Visibility::Shared => RecordAccess::SharedToken {
                owner: &self.owner,
                token: &self.share_token,
            },
            Visibility::Public => RecordAccess::Public { owner: &self.owner },
        }
    }

    /// Whether the caller owns this record.
    #[must_use]
    pub fn owned_by(&self, caller: &CallerContext) -> bool {
        self.owner.matches(caller)
    }
}

/// Per-record access check, tagged by visibility state.
///
/// Each variant spells out its own view/write behavior instead of one method
/// branching on visibility, so the three behaviors stay explicit and can be
/// tested exhaustively.
#[derive(Debug)]
pub enum RecordAccess<'a> {
    /// `private`: the owner, and nobody else.
    PrivateOwner { owner: &'a Owner },
    /// `shared`: the owner, or a caller presenting the matching share token.
    SharedToken {
        owner: &'a Owner,
        token: &'a ShareToken,
    },
    /// `public`: any identified caller may view.
    Public { owner: &'a Owner },
}

impl RecordAccess<'_> {
    /// Whether the caller may view the record.
    #[must_use]
    pub fn can_view(&self, caller: &CallerContext) -> bool {
        match self {
            Self::PrivateOwner { owner } => owner.matches(caller),
            Self::SharedToken { owner, token } => {
                owner.matches(caller) || caller.presented_token() == Some(token)
            }
            Self::Public { owner: _ } => caller.is_identified(),
        }
    }

    /// Whether the caller may change the record. Writes are owner-only in
    /// every visibility state.
    #[must_use]
    pub fn can_write(&self, caller: &CallerContext) -> bool {
        match self {
            Self::PrivateOwner { owner } | Self::SharedToken { owner, .. } | Self::Public { owner } => {
                owner.matches(caller)
            }
        }
    }
}

/// One product entry inside a wishlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ItemId,
    pub wishlist_id: WishlistId,
    pub product_id: ProductId,
    /// Desired quantity; never negative.
    pub quantity: u32,
    /// Unit price captured when the product was added, if known.
    pub price_at_add: Option<Decimal>,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn list(visibility: Visibility, owner: Owner) -> Wishlist {
        Wishlist {
            id: WishlistId::new(1),
            owner,
            slug: Slug::new("gifts"),
            name: "Gifts".to_owned(),
            share_token: ShareToken::new("SHARETOK1234"),
            visibility,
            is_default: false,
            created_at: Utc::now(),
        }
    }

    fn owner_caller() -> CallerContext {
        CallerContext::user(UserId::new(5), [], Utc::now())
    }

    fn other_caller() -> CallerContext {
        CallerContext::user(UserId::new(6), [], Utc::now())
    }

    #[test]
    fn test_private_is_owner_only() {
        let w = list(Visibility::Private, Owner::User(UserId::new(5)));
        assert!(w.access().can_view(&owner_caller()));
        assert!(w.access().can_write(&owner_caller()));
        assert!(!w.access().can_view(&other_caller()));
        assert!(!w.access().can_write(&other_caller()));
    }

    #[test]
    fn test_shared_accepts_matching_token_for_view_only() {
        let w = list(Visibility::Shared, Owner::User(UserId::new(5)));
        let with_token = other_caller().with_share_token(ShareToken::new("SHARETOK1234"));
        let wrong_token = other_caller().with_share_token(ShareToken::new("NOPE"));

        assert!(w.access().can_view(&with_token));
        assert!(!w.access().can_write(&with_token));
        assert!(!w.access().can_view(&wrong_token));
        assert!(!w.access().can_view(&other_caller()));
    }

    #[test]
    fn test_public_viewable_by_any_identified_caller() {
        let w = list(Visibility::Public, Owner::User(UserId::new(5)));
        assert!(w.access().can_view(&other_caller()));
        assert!(!w.access().can_write(&other_caller()));
        assert!(!w.access().can_view(&CallerContext::unidentified(Utc::now())));
    }

    #[test]
    fn test_guest_owner_matches_by_session_token() {
        let token = SessionToken::mint();
        let now = Utc::now();
        let w = list(
            Visibility::Private,
            Owner::Session {
                token: token.clone(),
                expires_at: now + TimeDelta::days(7),
            },
        );

        let guest = CallerContext::session(token.clone(), now + TimeDelta::days(7), now);
        assert!(w.access().can_view(&guest));
        assert!(w.access().can_write(&guest));

        // Same token, but the caller's session already lapsed.
        let lapsed = CallerContext::session(token, now - TimeDelta::minutes(1), now);
        assert!(!w.access().can_view(&lapsed));
    }

    #[test]
    fn test_owner_expiry() {
        let now = Utc::now();
        let owner = Owner::Session {
            token: SessionToken::mint(),
            expires_at: now - TimeDelta::minutes(1),
        };
        assert!(owner.expired(now));
        assert!(!Owner::User(UserId::new(1)).expired(now));
    }
}
