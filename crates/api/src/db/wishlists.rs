//! Wishlist repository: the rendered search plus single-record CRUD.
//!
//! The search takes the core query's predicates and renders each one into a
//! parameterized SQL fragment via `sqlx::QueryBuilder`. Every caller-supplied
//! value goes through `push_bind`; the only strings pushed into the SQL text
//! are static fragments and enum-derived column names. The join against the
//! owner profile table is added only when a predicate actually reads it.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use wishbox_core::query::{Predicate, ScopedQuery, WishlistQuery};
use wishbox_core::types::{
    SessionToken, ShareToken, Slug, UserId, Visibility, VisibilityEncoding, WishlistId,
};
use wishbox_core::wishlist::{Owner, Wishlist};
use wishbox_core::{SortKey, SortOrder};

use super::RepositoryError;

/// The stored visibility encoding. The ordinals are owned here, by the
/// store; everything above it speaks symbolic variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredVisibility;

impl VisibilityEncoding for StoredVisibility {
    fn encode(&self, visibility: Visibility) -> i16 {
        match visibility {
            Visibility::Public => 0,
            Visibility::Shared => 1,
            Visibility::Private => 2,
        }
    }

    fn decode(&self, code: i16) -> Option<Visibility> {
        match code {
            0 => Some(Visibility::Public),
            1 => Some(Visibility::Shared),
            2 => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// Fields for a wishlist insert.
#[derive(Debug)]
pub struct NewWishlist {
    pub owner: Owner,
    pub slug: Slug,
    pub name: String,
    pub share_token: ShareToken,
    pub visibility: Visibility,
    pub is_default: bool,
}

#[derive(sqlx::FromRow)]
struct WishlistRow {
    id: i64,
    user_id: Option<i64>,
    session_token: Option<String>,
    session_expires_at: Option<DateTime<Utc>>,
    slug: String,
    name: String,
    share_token: String,
    visibility: i16,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl WishlistRow {
    fn into_domain(self, encoding: &dyn VisibilityEncoding) -> Result<Wishlist, RepositoryError> {
        let owner = match (self.user_id, self.session_token, self.session_expires_at) {
            (Some(user_id), None, None) => Owner::User(UserId::new(user_id)),
            (None, Some(token), Some(expires_at)) => Owner::Session {
                token: SessionToken::new(token),
                expires_at,
            },
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "wishlist {} has inconsistent owner columns",
                    self.id
                )));
            }
        };

        let visibility = encoding.decode(self.visibility).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "wishlist {} has unknown visibility code {}",
                self.id, self.visibility
            ))
        })?;

        Ok(Wishlist {
            id: WishlistId::new(self.id),
            owner,
            slug: Slug::new(&self.slug),
            name: self.name,
            share_token: ShareToken::new(self.share_token),
            visibility,
            is_default: self.is_default,
            created_at: self.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "w.id, w.user_id, w.session_token, w.session_expires_at, \
     w.slug, w.name, w.share_token, w.visibility, w.is_default, w.created_at";

const RETURNING_COLUMNS: &str = "id, user_id, session_token, session_expires_at, \
     slug, name, share_token, visibility, is_default, created_at";

/// Render the resolved query into one parameterized SELECT.
fn render_search(
    query: &WishlistQuery,
    encoding: &dyn VisibilityEncoding,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {SELECT_COLUMNS} FROM wishbox.wishlists AS w"
    ));

    if query.needs_owner_profile() {
        qb.push(" LEFT JOIN wishbox.users AS u ON u.id = w.user_id");
    }

    // Expired guest records are invisible no matter what was asked.
    qb.push(" WHERE (w.session_expires_at IS NULL OR w.session_expires_at > NOW())");

    for predicate in query.predicates() {
        push_predicate(&mut qb, predicate, encoding);
    }

    qb.push(" ORDER BY ");
    if let Some((key, direction)) = query.order() {
        qb.push("w.")
            .push(sort_column(key))
            .push(" ")
            .push(sort_direction(direction))
            .push(", ");
    }
    qb.push("w.is_default DESC");

    if let Some(limit) = query.limit() {
        qb.push(" LIMIT ").push_bind(i64::from(limit));
        qb.push(" OFFSET ").push_bind(i64::from(query.offset()));
    }

    qb
}

fn push_predicate(
    qb: &mut QueryBuilder<'static, Postgres>,
    predicate: &Predicate,
    encoding: &dyn VisibilityEncoding,
) {
    match predicate {
        Predicate::IdEquals(id) => {
            qb.push(" AND w.id = ").push_bind(id.as_i64());
        }
        Predicate::OwnerUser(user_id) => {
            qb.push(" AND w.user_id = ").push_bind(user_id.as_i64());
        }
        Predicate::OwnerSession(token) => {
            qb.push(" AND w.session_token = ")
                .push_bind(token.as_str().to_owned());
        }
        Predicate::SlugEquals(slug) => {
            qb.push(" AND w.slug = ").push_bind(slug.as_str().to_owned());
        }
        Predicate::NameContains(term) => {
            qb.push(" AND w.name ILIKE ").push_bind(like_pattern(term));
        }
        Predicate::ShareTokenEquals(token) => {
            qb.push(" AND w.share_token = ")
                .push_bind(token.as_str().to_owned());
        }
        Predicate::VisibilityIn(states) => {
            let codes: Vec<i16> = states.iter().map(|&v| encoding.encode(v)).collect();
            qb.push(" AND w.visibility = ANY(").push_bind(codes).push(")");
        }
        Predicate::OwnerContains(term) => {
            let pattern = like_pattern(term);
            qb.push(" AND (u.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.last_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        Predicate::AnyFieldContains(term) => {
            let pattern = like_pattern(term);
            qb.push(" AND (w.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR w.slug ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR w.share_token ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.login ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.last_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        Predicate::IsDefault(is_default) => {
            qb.push(" AND w.is_default = ").push_bind(*is_default);
        }
        Predicate::HasItems => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM wishbox.wishlist_items AS i \
                 WHERE i.wishlist_id = w.id)",
            );
        }
    }
}

/// Wrap a search term in `%` wildcards, escaping any wildcard characters the
/// term itself carries. Postgres treats `\` as the LIKE escape character by
/// default.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const fn sort_column(key: SortKey) -> &'static str {
    match key {
        SortKey::Id => "id",
        SortKey::UserId => "user_id",
        SortKey::WishlistSlug => "slug",
        SortKey::WishlistName => "name",
        SortKey::WishlistToken => "share_token",
        SortKey::WishlistVisibility => "visibility",
        SortKey::IsDefault => "is_default",
        SortKey::DateAdded => "created_at",
    }
}

const fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Repository for wishlist records.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Run a scoped query. [`ScopedQuery::Empty`] never touches the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` for rows with inconsistent owner
    /// columns or unknown visibility codes.
    pub async fn find(&self, scoped: &ScopedQuery) -> Result<Vec<Wishlist>, RepositoryError> {
        match scoped {
            ScopedQuery::Empty => Ok(Vec::new()),
            ScopedQuery::Query(query) => self.search(query).await,
        }
    }

    /// Run a resolved query in a single round trip.
    ///
    /// # Errors
    ///
    /// See [`WishlistRepository::find`].
    pub async fn search(&self, query: &WishlistQuery) -> Result<Vec<Wishlist>, RepositoryError> {
        let mut qb = render_search(query, &StoredVisibility);
        let rows: Vec<WishlistRow> = qb.build_query_as().fetch_all(self.pool).await?;

        rows.into_iter()
            .map(|row| row.into_domain(&StoredVisibility))
            .collect()
    }

    /// Load a single live wishlist by id. Expired guest records read as
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: WishlistId) -> Result<Option<Wishlist>, RepositoryError> {
        let row: Option<WishlistRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM wishbox.wishlists AS w \
             WHERE w.id = $1 \
             AND (w.session_expires_at IS NULL OR w.session_expires_at > NOW())"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_domain(&StoredVisibility)).transpose()
    }

    /// Insert a new wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the owner already has a
    /// wishlist with this slug (or a second default), `Database` otherwise.
    pub async fn create(&self, new: NewWishlist) -> Result<Wishlist, RepositoryError> {
        let (user_id, session_token, session_expires_at) = match &new.owner {
            Owner::User(id) => (Some(id.as_i64()), None, None),
            Owner::Session { token, expires_at } => {
                (None, Some(token.as_str().to_owned()), Some(*expires_at))
            }
        };

        let row: WishlistRow = sqlx::query_as(&format!(
            "INSERT INTO wishbox.wishlists \
             (user_id, session_token, session_expires_at, slug, name, share_token, visibility, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(user_id)
        .bind(session_token)
        .bind(session_expires_at)
        .bind(new.slug.as_str().to_owned())
        .bind(new.name)
        .bind(new.share_token.as_str().to_owned())
        .bind(StoredVisibility.encode(new.visibility))
        .bind(new.is_default)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("owner already has this wishlist".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_domain(&StoredVisibility)
    }

    /// Update the mutable wishlist fields. `None` keeps the current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the wishlist doesn't exist.
    pub async fn update_meta(
        &self,
        id: WishlistId,
        name: Option<&str>,
        visibility: Option<Visibility>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE wishbox.wishlists \
             SET name = COALESCE($2, name), visibility = COALESCE($3, visibility) \
             WHERE id = $1",
        )
        .bind(id.as_i64())
        .bind(name.map(str::to_owned))
        .bind(visibility.map(|v| StoredVisibility.encode(v)))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a wishlist; items cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the wishlist was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: WishlistId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishbox.wishlists WHERE id = $1")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count the live wishlists an owner currently has.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_owner(&self, owner: &Owner) -> Result<i64, RepositoryError> {
        let count: i64 = match owner {
            Owner::User(id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM wishbox.wishlists WHERE user_id = $1")
                    .bind(id.as_i64())
                    .fetch_one(self.pool)
                    .await?
            }
            Owner::Session { token, .. } => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM wishbox.wishlists \
                     WHERE session_token = $1 AND session_expires_at > NOW()",
                )
                .bind(token.as_str().to_owned())
                .fetch_one(self.pool)
                .await?
            }
        };

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use wishbox_core::caller::{CallerContext, Capability};
    use wishbox_core::criteria::FilterCriteria;
    use wishbox_core::types::VisibilityFilter;

    use super::*;

    fn resolved(criteria: &FilterCriteria, caller: &CallerContext) -> WishlistQuery {
        match WishlistQuery::resolve(criteria, caller) {
            ScopedQuery::Query(query) => query,
            ScopedQuery::Empty => panic!("expected a scoped query"),
        }
    }

    fn owner_caller() -> CallerContext {
        CallerContext::user(UserId::new(5), [], Utc::now())
    }

    fn exporter() -> CallerContext {
        CallerContext::user(UserId::new(1), [Capability::ExportWishlists], Utc::now())
    }

    #[test]
    fn test_search_terms_never_reach_the_sql_text() {
        let criteria = FilterCriteria {
            search: Some("'; DROP TABLE wishbox.wishlists; --".to_owned()),
            wishlist_name: Some("gift%list".to_owned()),
            ..Default::default()
        };
        let qb = render_search(&resolved(&criteria, &owner_caller()), &StoredVisibility);
        let sql = qb.sql();

        assert!(!sql.contains("DROP TABLE"));
        assert!(!sql.contains("gift%list"));
        assert!(sql.contains("ILIKE $"));
    }

    #[test]
    fn test_plain_scope_renders_without_owner_join() {
        let qb = render_search(
            &resolved(&FilterCriteria::default(), &owner_caller()),
            &StoredVisibility,
        );
        let sql = qb.sql();

        assert!(!sql.contains("LEFT JOIN"));
        assert!(sql.contains("w.user_id = $1"));
        // The expiry guard is unconditional.
        assert!(sql.contains("w.session_expires_at IS NULL OR w.session_expires_at > NOW()"));
        assert!(sql.ends_with("ORDER BY w.is_default DESC"));
    }

    #[test]
    fn test_search_joins_owner_profiles_once() {
        let criteria = FilterCriteria {
            search: Some("ada".to_owned()),
            ..Default::default()
        };
        let qb = render_search(&resolved(&criteria, &owner_caller()), &StoredVisibility);
        let sql = qb.sql();

        assert_eq!(sql.matches("LEFT JOIN wishbox.users").count(), 1);
        assert!(sql.contains("u.login ILIKE $"));
    }

    #[test]
    fn test_show_empty_renders_membership_subquery_not_a_join() {
        let criteria = FilterCriteria {
            show_empty: false,
            ..Default::default()
        };
        let qb = render_search(&resolved(&criteria, &owner_caller()), &StoredVisibility);
        let sql = qb.sql();

        assert!(sql.contains("EXISTS (SELECT 1 FROM wishbox.wishlist_items"));
        assert!(!sql.contains("JOIN wishbox.wishlist_items"));
    }

    #[test]
    fn test_ordering_and_pagination_render_from_enums() {
        let criteria = FilterCriteria {
            orderby: Some(SortKey::WishlistName),
            order: SortOrder::Asc,
            limit: Some(25),
            offset: 50,
            ..Default::default()
        };
        let qb = render_search(&resolved(&criteria, &owner_caller()), &StoredVisibility);
        let sql = qb.sql();

        assert!(sql.contains("ORDER BY w.name ASC, w.is_default DESC"));
        assert!(sql.contains("LIMIT $"));
        assert!(sql.contains("OFFSET $"));
    }

    #[test]
    fn test_visibility_filter_renders_encoded_set() {
        let criteria = FilterCriteria {
            wishlist_visibility: VisibilityFilter::Visible,
            ..Default::default()
        };
        let qb = render_search(&resolved(&criteria, &exporter()), &StoredVisibility);
        // Elevated caller with no owner filter: the visibility check is the
        // only predicate.
        assert!(qb.sql().contains("w.visibility = ANY($1)"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("plain"), "%plain%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn test_stored_visibility_round_trips() {
        for v in [Visibility::Public, Visibility::Shared, Visibility::Private] {
            assert_eq!(StoredVisibility.decode(StoredVisibility.encode(v)), Some(v));
        }
        assert_eq!(StoredVisibility.decode(9), None);
    }

    #[test]
    fn test_row_with_inconsistent_owner_is_corruption() {
        let row = WishlistRow {
            id: 1,
            user_id: Some(5),
            session_token: Some("also-a-session".to_owned()),
            session_expires_at: None,
            slug: "gifts".to_owned(),
            name: "Gifts".to_owned(),
            share_token: "TOKEN".to_owned(),
            visibility: 0,
            is_default: false,
            created_at: Utc::now(),
        };
        assert!(matches!(
            row.into_domain(&StoredVisibility),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_row_with_unknown_visibility_is_corruption() {
        let row = WishlistRow {
            id: 1,
            user_id: Some(5),
            session_token: None,
            session_expires_at: None,
            slug: "gifts".to_owned(),
            name: "Gifts".to_owned(),
            share_token: "TOKEN".to_owned(),
            visibility: 42,
            is_default: false,
            created_at: Utc::now(),
        };
        assert!(matches!(
            row.into_domain(&StoredVisibility),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
