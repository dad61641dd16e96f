//! Caller-supplied filter criteria for wishlist searches.
//!
//! Criteria are ephemeral: deserialized straight from the query string,
//! resolved into a scoped query, and dropped. Nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::types::{SessionToken, ShareToken, UserId, VisibilityFilter, WishlistId};

/// Columns the caller may sort by.
///
/// A closed enum rather than a raw column string: anything outside this list
/// fails deserialization before it gets anywhere near the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    UserId,
    WishlistSlug,
    WishlistName,
    WishlistToken,
    WishlistVisibility,
    IsDefault,
    DateAdded,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[default]
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

/// One search request, every field optional.
///
/// Field names match the wire format of the list/export endpoints. Note that
/// `user_id` and `session_id` are honored only for callers holding the
/// export capability; for everyone else the query is forcibly scoped to the
/// caller's own identity (see `WishlistQuery::resolve`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Exact match on record identifier.
    pub id: Option<WishlistId>,
    /// Exact match on owner user id (elevated callers only).
    pub user_id: Option<UserId>,
    /// Exact match on owner session id (elevated callers only).
    pub session_id: Option<SessionToken>,
    /// Exact match on slug (input is normalized first).
    pub wishlist_slug: Option<String>,
    /// Substring match on display name.
    pub wishlist_name: Option<String>,
    /// Exact match on share token.
    pub wishlist_token: Option<ShareToken>,
    /// Symbolic visibility filter, default `all`.
    pub wishlist_visibility: VisibilityFilter,
    /// Substring match against owner identity fields only.
    pub user_search: Option<String>,
    /// Substring match against record fields or owner identity fields.
    /// Supersedes `user_search` when both are present.
    #[serde(rename = "s")]
    pub search: Option<String>,
    /// Exact match on the default flag.
    pub is_default: Option<bool>,
    /// Sort column.
    pub orderby: Option<SortKey>,
    /// Sort direction, default descending.
    pub order: SortOrder,
    /// Page size; absent means unbounded.
    pub limit: Option<u32>,
    /// Rows to skip; only applied together with a limit.
    pub offset: u32,
    /// Include wishlists that own no items, default true.
    pub show_empty: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            id: None,
            user_id: None,
            session_id: None,
            wishlist_slug: None,
            wishlist_name: None,
            wishlist_token: None,
            wishlist_visibility: VisibilityFilter::All,
            user_search: None,
            search: None,
            is_default: None,
            orderby: None,
            order: SortOrder::Desc,
            limit: None,
            offset: 0,
            show_empty: true,
        }
    }
}
