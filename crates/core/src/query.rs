//! Query scoping and the composable filtered search.
//!
//! [`WishlistQuery::resolve`] turns caller-supplied [`FilterCriteria`] plus a
//! [`CallerContext`] into either [`ScopedQuery::Empty`] (the fail-closed
//! gate: no error, no data) or a [`WishlistQuery`] — a flat list of
//! [`Predicate`]s with ordering and pagination. Each predicate is a value,
//! independently testable, and renders to one parameterized SQL fragment in
//! the store; adding a filter means adding a variant, not growing a
//! conditional chain.
//!
//! The same query evaluates in memory against plain records, which is what
//! the scoping and ordering properties are tested against.

use core::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::caller::{CallerContext, ProfileLookup};
use crate::criteria::{FilterCriteria, SortKey, SortOrder};
use crate::types::{SessionToken, ShareToken, Slug, UserId, Visibility, WishlistId};
use crate::wishlist::Wishlist;

/// One filter condition over wishlist records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact match on the record id.
    IdEquals(WishlistId),
    /// Record owned by this user.
    OwnerUser(UserId),
    /// Record owned by this (unexpired) guest session.
    OwnerSession(SessionToken),
    /// Exact match on the normalized slug.
    SlugEquals(Slug),
    /// Case-insensitive substring match on the display name.
    NameContains(String),
    /// Exact match on the share token.
    ShareTokenEquals(ShareToken),
    /// Visibility is one of the given states.
    VisibilityIn(Vec<Visibility>),
    /// Case-insensitive substring match on the owner's identity fields
    /// (email, first name, last name).
    OwnerContains(String),
    /// Case-insensitive substring match on any record field (name, slug,
    /// share token) or owner identity field (email, login, first, last).
    AnyFieldContains(String),
    /// Exact match on the default flag.
    IsDefault(bool),
    /// Record owns at least one item.
    HasItems,
}

/// Knows which wishlists currently own items.
pub trait ItemIndex {
    /// Whether the wishlist owns at least one item.
    fn has_items(&self, wishlist: WishlistId) -> bool;
}

impl ItemIndex for HashSet<WishlistId> {
    fn has_items(&self, wishlist: WishlistId) -> bool {
        self.contains(&wishlist)
    }
}

/// Collaborators the in-memory evaluator reads from.
pub struct QueryEnv<'a> {
    /// Owner profiles, for the identity-field searches.
    pub profiles: &'a dyn ProfileLookup,
    /// Item ownership, for the `show_empty` filter.
    pub items: &'a dyn ItemIndex,
    /// The evaluation instant; guest records expired by then are invisible.
    pub now: DateTime<Utc>,
}

/// Result of scoping criteria against a caller.
#[derive(Debug, Clone)]
pub enum ScopedQuery {
    /// The caller is not entitled to any result. Not an error.
    Empty,
    /// A runnable, correctly scoped query.
    Query(WishlistQuery),
}

/// A resolved search: predicates, ordering, pagination.
#[derive(Debug, Clone)]
pub struct WishlistQuery {
    predicates: Vec<Predicate>,
    order: Option<(SortKey, SortOrder)>,
    limit: Option<u32>,
    offset: u32,
}

impl WishlistQuery {
    /// Scope criteria to a caller.
    ///
    /// Non-elevated callers have their own identity forced into the query;
    /// whatever `user_id`/`session_id` they supplied is discarded. Callers
    /// holding the export capability may filter freely. A caller with no
    /// usable identity, or a non-elevated query that somehow ends up without
    /// an owner binding, resolves to [`ScopedQuery::Empty`].
    #[must_use]
    pub fn resolve(criteria: &FilterCriteria, caller: &CallerContext) -> ScopedQuery {
        let mut predicates = Vec::new();
        let elevated = caller.can_export();

        if elevated {
            if let Some(user_id) = criteria.user_id {
                predicates.push(Predicate::OwnerUser(user_id));
            }
            if let Some(session) = &criteria.session_id {
                predicates.push(Predicate::OwnerSession(session.clone()));
            }
        } else if let Some(user_id) = caller.user_id() {
            predicates.push(Predicate::OwnerUser(user_id));
        } else if let Some(session) = caller.session_token() {
            predicates.push(Predicate::OwnerSession(session.clone()));
        } else {
            // Anonymous with no active session: nothing to scope to.
            return ScopedQuery::Empty;
        }

        if let Some(id) = criteria.id {
            predicates.push(Predicate::IdEquals(id));
        }
        if let Some(slug) = criteria.wishlist_slug.as_deref() {
            predicates.push(Predicate::SlugEquals(Slug::new(slug)));
        }
        if let Some(token) = &criteria.wishlist_token {
            predicates.push(Predicate::ShareTokenEquals(token.clone()));
        }
        if let Some(name) = non_empty(criteria.wishlist_name.as_deref()) {
            predicates.push(Predicate::NameContains(name.to_owned()));
        }

        // `s` supersedes `user_search`; an empty term matches everything.
        if let Some(term) = non_empty(criteria.search.as_deref()) {
            predicates.push(Predicate::AnyFieldContains(term.to_owned()));
        } else if let Some(term) = non_empty(criteria.user_search.as_deref()) {
            predicates.push(Predicate::OwnerContains(term.to_owned()));
        }

        if let Some(is_default) = criteria.is_default {
            predicates.push(Predicate::IsDefault(is_default));
        }
        if let Some(states) = criteria.wishlist_visibility.expand() {
            predicates.push(Predicate::VisibilityIn(states));
        }
        if !criteria.show_empty {
            predicates.push(Predicate::HasItems);
        }

        // Fail closed: a non-elevated query must be owner-bound by now.
        let owner_bound = predicates
            .iter()
            .any(|p| matches!(p, Predicate::OwnerUser(_) | Predicate::OwnerSession(_)));
        if !elevated && !owner_bound {
            return ScopedQuery::Empty;
        }

        ScopedQuery::Query(Self {
            predicates,
            order: criteria.orderby.map(|key| (key, criteria.order)),
            limit: criteria.limit,
            offset: criteria.offset,
        })
    }

    /// The filter conditions, in resolution order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// The requested ordering, if any. The default-flag tiebreak is implied
    /// and always applied after it.
    #[must_use]
    pub const fn order(&self) -> Option<(SortKey, SortOrder)> {
        self.order
    }

    /// Page size, if bounded.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Rows to skip (only meaningful together with a limit).
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Whether any predicate needs the owner-identity fields.
    #[must_use]
    pub fn needs_owner_profile(&self) -> bool {
        self.predicates
            .iter()
            .any(|p| matches!(p, Predicate::OwnerContains(_) | Predicate::AnyFieldContains(_)))
    }

    /// Whether a single record satisfies every predicate.
    #[must_use]
    pub fn matches(&self, record: &Wishlist, env: &QueryEnv<'_>) -> bool {
        // Expired guest records are invisible regardless of the criteria.
        if record.owner.expired(env.now) {
            return false;
        }
        self.predicates.iter().all(|p| p.matches(record, env))
    }

    /// Run the query over an in-memory record set: filter, order, paginate.
    ///
    /// Returns matching ids, requested ordering first, default-flagged
    /// records always sorted to the front as the final tiebreak.
    #[must_use]
    pub fn evaluate(&self, records: &[Wishlist], env: &QueryEnv<'_>) -> Vec<WishlistId> {
        let mut matched: Vec<&Wishlist> = records.iter().filter(|w| self.matches(w, env)).collect();
        matched.sort_by(|a, b| compare(a, b, self.order));

        let ids = matched.into_iter().map(|w| w.id);
        // As in the store: an offset without a limit is ignored.
        if let Some(limit) = self.limit {
            ids.skip(self.offset as usize).take(limit as usize).collect()
        } else {
            ids.collect()
        }
    }
}

impl ScopedQuery {
    /// Run the scoped query in memory; [`ScopedQuery::Empty`] yields `[]`.
    #[must_use]
    pub fn evaluate(&self, records: &[Wishlist], env: &QueryEnv<'_>) -> Vec<WishlistId> {
        match self {
            Self::Empty => Vec::new(),
            Self::Query(query) => query.evaluate(records, env),
        }
    }
}

impl Predicate {
    /// Whether a single record satisfies this predicate.
    #[must_use]
    pub fn matches(&self, record: &Wishlist, env: &QueryEnv<'_>) -> bool {
        match self {
            Self::IdEquals(id) => record.id == *id,
            Self::OwnerUser(user_id) => record.owner.user_id() == Some(*user_id),
            Self::OwnerSession(token) => {
                record.owner.session_token() == Some(token) && !record.owner.expired(env.now)
            }
            Self::SlugEquals(slug) => record.slug == *slug,
            Self::NameContains(term) => contains_ci(&record.name, term),
            Self::ShareTokenEquals(token) => record.share_token == *token,
            Self::VisibilityIn(states) => states.contains(&record.visibility),
            Self::OwnerContains(term) => owner_profile_matches(record, env, |profile| {
                contains_ci(&profile.email, term)
                    || contains_ci(&profile.first_name, term)
                    || contains_ci(&profile.last_name, term)
            }),
            Self::AnyFieldContains(term) => {
                contains_ci(&record.name, term)
                    || contains_ci(record.slug.as_str(), term)
                    || contains_ci(record.share_token.as_str(), term)
                    || owner_profile_matches(record, env, |profile| {
                        contains_ci(&profile.email, term)
                            || contains_ci(&profile.login, term)
                            || contains_ci(&profile.first_name, term)
                            || contains_ci(&profile.last_name, term)
                    })
            }
            Self::IsDefault(is_default) => record.is_default == *is_default,
            Self::HasItems => env.items.has_items(record.id),
        }
    }
}

fn owner_profile_matches(
    record: &Wishlist,
    env: &QueryEnv<'_>,
    check: impl Fn(&crate::caller::OwnerProfile) -> bool,
) -> bool {
    record
        .owner
        .user_id()
        .and_then(|id| env.profiles.profile(id))
        .is_some_and(|profile| check(&profile))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn compare(a: &Wishlist, b: &Wishlist, order: Option<(SortKey, SortOrder)>) -> CmpOrdering {
    let requested = order.map_or(CmpOrdering::Equal, |(key, direction)| {
        let base = match key {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::UserId => a.owner.user_id().cmp(&b.owner.user_id()),
            SortKey::WishlistSlug => a.slug.as_str().cmp(b.slug.as_str()),
            SortKey::WishlistName => a.name.cmp(&b.name),
            SortKey::WishlistToken => a.share_token.as_str().cmp(b.share_token.as_str()),
            SortKey::WishlistVisibility => visibility_rank(a.visibility).cmp(&visibility_rank(b.visibility)),
            SortKey::IsDefault => a.is_default.cmp(&b.is_default),
            SortKey::DateAdded => a.created_at.cmp(&b.created_at),
        };
        match direction {
            SortOrder::Asc => base,
            SortOrder::Desc => base.reverse(),
        }
    });

    // Final tiebreak: default-flagged records first.
    requested.then_with(|| b.is_default.cmp(&a.is_default))
}

const fn visibility_rank(visibility: Visibility) -> u8 {
    match visibility {
        Visibility::Public => 0,
        Visibility::Shared => 1,
        Visibility::Private => 2,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeDelta;

    use super::*;
    use crate::caller::{Capability, OwnerProfile};
    use crate::types::VisibilityFilter;
    use crate::wishlist::Owner;

    struct Fixture {
        records: Vec<Wishlist>,
        profiles: HashMap<UserId, OwnerProfile>,
        stocked: HashSet<WishlistId>,
        now: DateTime<Utc>,
    }

    impl Fixture {
        fn env(&self) -> QueryEnv<'_> {
            QueryEnv {
                profiles: &self.profiles,
                items: &self.stocked,
                now: self.now,
            }
        }

        fn run(&self, criteria: &FilterCriteria, caller: &CallerContext) -> Vec<i64> {
            WishlistQuery::resolve(criteria, caller)
                .evaluate(&self.records, &self.env())
                .into_iter()
                .map(|id| id.as_i64())
                .collect()
        }
    }

    fn record(
        id: i64,
        owner: Owner,
        name: &str,
        visibility: Visibility,
        is_default: bool,
        created_at: DateTime<Utc>,
    ) -> Wishlist {
        Wishlist {
            id: WishlistId::new(id),
            owner,
            slug: Slug::new(name),
            name: name.to_owned(),
            share_token: ShareToken::new(format!("TOKEN{id:07}")),
            visibility,
            is_default,
            created_at,
        }
    }

    /// Two users and two guests; user 5 owns 10 (default, private) and
    /// 11 (public), one guest session is live, one has lapsed.
    fn fixture() -> Fixture {
        let now = Utc::now();
        let guest_token = SessionToken::new("guest-session-token");
        let records = vec![
            record(
                10,
                Owner::User(UserId::new(5)),
                "Birthday",
                Visibility::Private,
                true,
                now - TimeDelta::days(3),
            ),
            record(
                11,
                Owner::User(UserId::new(5)),
                "Holiday Gear",
                Visibility::Public,
                false,
                now - TimeDelta::days(2),
            ),
            record(
                12,
                Owner::User(UserId::new(7)),
                "Workshop",
                Visibility::Shared,
                true,
                now - TimeDelta::days(1),
            ),
            record(
                13,
                Owner::Session {
                    token: guest_token.clone(),
                    expires_at: now + TimeDelta::days(7),
                },
                "Guest Picks",
                Visibility::Private,
                false,
                now - TimeDelta::hours(5),
            ),
            record(
                14,
                Owner::Session {
                    token: SessionToken::new("expired-session"),
                    expires_at: now - TimeDelta::days(1),
                },
                "Stale Guest",
                Visibility::Public,
                false,
                now - TimeDelta::days(30),
            ),
        ];

        let mut profiles = HashMap::new();
        profiles.insert(
            UserId::new(5),
            OwnerProfile {
                email: "ada@example.com".to_owned(),
                login: "ada".to_owned(),
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
            },
        );
        profiles.insert(
            UserId::new(7),
            OwnerProfile {
                email: "grace@example.com".to_owned(),
                login: "grace".to_owned(),
                first_name: "Grace".to_owned(),
                last_name: "Hopper".to_owned(),
            },
        );

        // 10 and 12 own items; 11, 13, 14 are empty.
        let stocked: HashSet<WishlistId> =
            [WishlistId::new(10), WishlistId::new(12)].into_iter().collect();

        Fixture {
            records,
            profiles,
            stocked,
            now,
        }
    }

    fn user(id: i64, now: DateTime<Utc>) -> CallerContext {
        CallerContext::user(UserId::new(id), [], now)
    }

    fn exporter(now: DateTime<Utc>) -> CallerContext {
        CallerContext::user(UserId::new(1), [Capability::ExportWishlists], now)
    }

    #[test]
    fn test_scoping_cannot_be_bypassed_by_omission_or_override() {
        let f = fixture();
        let caller = user(5, f.now);

        // No user_id filter: own records only, default first.
        assert_eq!(f.run(&FilterCriteria::default(), &caller), vec![10, 11]);

        // A foreign user_id is ignored for non-elevated callers.
        let criteria = FilterCriteria {
            user_id: Some(UserId::new(7)),
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &caller), vec![10, 11]);
    }

    #[test]
    fn test_caller_with_no_records_sees_their_own_empty_set() {
        let f = fixture();
        assert_eq!(f.run(&FilterCriteria::default(), &user(6, f.now)), Vec::<i64>::new());
    }

    #[test]
    fn test_anonymous_without_active_session_gets_empty() {
        let f = fixture();
        let guest = CallerContext::unidentified(f.now);
        assert!(matches!(
            WishlistQuery::resolve(&FilterCriteria::default(), &guest),
            ScopedQuery::Empty
        ));
        assert_eq!(f.run(&FilterCriteria::default(), &guest), Vec::<i64>::new());

        let lapsed = CallerContext::session(
            SessionToken::new("expired-session"),
            f.now - TimeDelta::days(1),
            f.now,
        );
        assert_eq!(f.run(&FilterCriteria::default(), &lapsed), Vec::<i64>::new());
    }

    #[test]
    fn test_guest_session_is_scoped_to_its_own_token() {
        let f = fixture();
        let guest = CallerContext::session(
            SessionToken::new("guest-session-token"),
            f.now + TimeDelta::days(7),
            f.now,
        );
        assert_eq!(f.run(&FilterCriteria::default(), &guest), vec![13]);
    }

    #[test]
    fn test_visible_is_exactly_public_union_shared() {
        let f = fixture();
        let criteria = FilterCriteria {
            wishlist_visibility: VisibilityFilter::Visible,
            ..Default::default()
        };
        // Across all owners (elevated): 11 public, 12 shared; 14 is public
        // but expired. 10 and 13 are private.
        assert_eq!(f.run(&criteria, &exporter(f.now)), vec![12, 11]);
    }

    #[test]
    fn test_show_empty_false_keeps_only_stocked_records() {
        let f = fixture();
        let criteria = FilterCriteria {
            show_empty: false,
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &exporter(f.now)), vec![10, 12]);
        assert_eq!(f.run(&criteria, &user(5, f.now)), vec![10]);
    }

    #[test]
    fn test_default_records_sort_first() {
        let f = fixture();
        // No explicit orderby: default flag is the only criterion.
        assert_eq!(f.run(&FilterCriteria::default(), &user(5, f.now)), vec![10, 11]);

        // Explicit orderby applies first, default flag breaks ties.
        let criteria = FilterCriteria {
            orderby: Some(SortKey::DateAdded),
            order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &user(5, f.now)), vec![10, 11]);

        let criteria = FilterCriteria {
            orderby: Some(SortKey::DateAdded),
            order: SortOrder::Desc,
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &user(5, f.now)), vec![11, 10]);
    }

    #[test]
    fn test_read_path_is_idempotent() {
        let f = fixture();
        let criteria = FilterCriteria {
            wishlist_visibility: VisibilityFilter::All,
            orderby: Some(SortKey::WishlistName),
            order: SortOrder::Asc,
            ..Default::default()
        };
        let caller = exporter(f.now);
        let first = f.run(&criteria, &caller);
        let second = f.run(&criteria, &caller);
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_supersedes_user_search() {
        let f = fixture();

        // `s` hits record fields and owner fields alike.
        let criteria = FilterCriteria {
            search: Some("lovelace".to_owned()),
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &exporter(f.now)), vec![10, 11]);

        // `user_search` alone is narrower: owner identity fields only.
        let criteria = FilterCriteria {
            user_search: Some("holiday".to_owned()),
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &exporter(f.now)), Vec::<i64>::new());

        // When both are present, `s` wins: "hopper" matches user 7's
        // profile even though user_search would match nothing.
        let criteria = FilterCriteria {
            search: Some("hopper".to_owned()),
            user_search: Some("zzz-no-match".to_owned()),
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &exporter(f.now)), vec![12]);
    }

    #[test]
    fn test_empty_search_term_matches_everything() {
        let f = fixture();
        let criteria = FilterCriteria {
            search: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &user(5, f.now)), vec![10, 11]);
    }

    #[test]
    fn test_expired_guest_records_are_always_excluded() {
        let f = fixture();
        // Even an elevated caller filtering by the expired session sees nothing.
        let criteria = FilterCriteria {
            session_id: Some(SessionToken::new("expired-session")),
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &exporter(f.now)), Vec::<i64>::new());
    }

    #[test]
    fn test_pagination_applies_after_ordering() {
        let f = fixture();
        let criteria = FilterCriteria {
            orderby: Some(SortKey::Id),
            order: SortOrder::Asc,
            limit: Some(2),
            offset: 1,
            ..Default::default()
        };
        // Live records by id ASC are 10, 11, 12, 13; the page starts after 10.
        assert_eq!(f.run(&criteria, &exporter(f.now)), vec![11, 12]);

        // Offset without a limit is ignored.
        let criteria = FilterCriteria {
            orderby: Some(SortKey::Id),
            order: SortOrder::Asc,
            offset: 2,
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &exporter(f.now)), vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_slug_filter_normalizes_input() {
        let f = fixture();
        let criteria = FilterCriteria {
            wishlist_slug: Some("Holiday Gear!".to_owned()),
            ..Default::default()
        };
        assert_eq!(f.run(&criteria, &user(5, f.now)), vec![11]);
    }

    #[test]
    fn test_end_to_end_two_caller_scenario() {
        // Caller A (user 5) owns 10 (default, private) and 11 (public).
        let f = fixture();
        let caller_a = user(5, f.now);

        assert_eq!(f.run(&FilterCriteria::default(), &caller_a), vec![10, 11]);

        let public_only = FilterCriteria {
            wishlist_visibility: VisibilityFilter::Public,
            ..Default::default()
        };
        assert_eq!(f.run(&public_only, &caller_a), vec![11]);

        // Caller B (user 6, not elevated) sees their own empty set, never
        // records 10/11.
        let caller_b = user(6, f.now);
        assert_eq!(f.run(&FilterCriteria::default(), &caller_b), Vec::<i64>::new());
    }

    #[test]
    fn test_needs_owner_profile() {
        let f = fixture();
        let caller = user(5, f.now);

        let plain = FilterCriteria::default();
        let ScopedQuery::Query(query) = WishlistQuery::resolve(&plain, &caller) else {
            panic!("expected a scoped query");
        };
        assert!(!query.needs_owner_profile());

        let searching = FilterCriteria {
            search: Some("ada".to_owned()),
            ..Default::default()
        };
        let ScopedQuery::Query(query) = WishlistQuery::resolve(&searching, &caller) else {
            panic!("expected a scoped query");
        };
        assert!(query.needs_owner_profile());
    }
}
