//! Wishbox Core - the wishlist domain layer.
//!
//! This crate holds everything about wishlists that is independent of
//! transport and storage:
//!
//! - [`types`] - Newtype wrappers for ids, slugs, tokens, and visibility
//! - [`wishlist`] - The wishlist/item model and per-record access rules
//! - [`caller`] - Request-scoped caller identity and capability grants
//! - [`criteria`] - Caller-supplied filter criteria
//! - [`query`] - Scoping criteria into a composable, fail-closed query
//! - [`policy`] - The access policy and its context-reset side effect
//! - [`error`] - The error taxonomy shared by every operation
//!
//! # Architecture
//!
//! No I/O lives here: queries resolve to predicate values which the `api`
//! crate renders into parameterized SQL, and the same predicates evaluate
//! in memory so scoping and authorization are testable with plain fixtures.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod caller;
pub mod criteria;
pub mod error;
pub mod policy;
pub mod query;
pub mod types;
pub mod wishlist;

pub use caller::{CallerContext, Capability, Identity, NoProfiles, OwnerProfile, ProfileLookup};
pub use criteria::{FilterCriteria, SortKey, SortOrder};
pub use error::Error;
pub use policy::{Action, ContextReset, PolicyGate};
pub use query::{ItemIndex, Predicate, QueryEnv, ScopedQuery, WishlistQuery};
pub use types::*;
pub use wishlist::{Owner, RecordAccess, Wishlist, WishlistItem};
